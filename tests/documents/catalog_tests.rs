//! Catalog lookups, record creation, and live policy changes.

use uuid::Uuid;

use student_docs_lib::error::AppError;
use student_docs_lib::models::{DocumentCategory, DocumentStatus, NewDocument};
use student_docs_lib::services::catalog;

use crate::helpers::{content, definition, setup, test_definitions};

#[actix_rt::test]
async fn test_document_types_lists_active_types_in_order() {
    let ctx = setup().await;

    let keys: Vec<String> = ctx
        .service
        .list_document_types()
        .unwrap()
        .into_iter()
        .map(|t| t.key)
        .collect();

    assert_eq!(keys, vec!["passport", "transcript", "ielts"]);
}

#[actix_rt::test]
async fn test_create_or_get_is_idempotent_per_student_and_type() {
    let ctx = setup().await;
    let student = Uuid::new_v4();

    let first = ctx.create(student, "passport").await;
    let second = ctx.create(student, "passport").await;
    let other_student = ctx.create(Uuid::new_v4(), "passport").await;

    assert_eq!(first.id, second.id);
    assert_ne!(first.id, other_student.id);
    assert_eq!(first.status, DocumentStatus::Pending);
    assert_eq!(first.document_type_key, "passport");
    assert_eq!(first.category, DocumentCategory::Identity);
    assert!(first.is_required);
    assert!(!first.is_public);
}

#[actix_rt::test]
async fn test_concurrent_creates_return_one_record() {
    let ctx = setup().await;
    let student = Uuid::new_v4();
    let request = || NewDocument {
        student_id: student,
        type_key: "transcript".into(),
        title: "Transcript".into(),
        description: None,
    };

    let (a, b) = tokio::join!(
        ctx.service.create_or_get_document(request()),
        ctx.service.create_or_get_document(request()),
    );

    assert_eq!(a.unwrap().id, b.unwrap().id);
}

#[actix_rt::test]
async fn test_create_rejects_unknown_and_inactive_types_and_blank_titles() {
    let ctx = setup().await;
    let student = Uuid::new_v4();

    let unknown = ctx
        .service
        .create_or_get_document(NewDocument {
            student_id: student,
            type_key: "birth_certificate".into(),
            title: "Birth certificate".into(),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(unknown, AppError::NotFound(_)));

    let inactive = ctx
        .service
        .create_or_get_document(NewDocument {
            student_id: student,
            type_key: "legacy_form".into(),
            title: "Legacy".into(),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(inactive, AppError::Validation(_)));

    let blank = ctx
        .service
        .create_or_get_document(NewDocument {
            student_id: student,
            type_key: "passport".into(),
            title: "   ".into(),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(blank, AppError::Validation(_)));
}

#[actix_rt::test]
async fn test_retired_type_keeps_existing_documents_readable() {
    let ctx = setup().await;
    let student = Uuid::new_v4();
    let doc = ctx.create(student, "ielts").await;

    assert!(ctx.service.catalog().retire(&ctx.pool, "ielts").await.unwrap());

    let keys: Vec<String> = ctx
        .service
        .list_document_types()
        .unwrap()
        .into_iter()
        .map(|t| t.key)
        .collect();
    assert!(!keys.contains(&"ielts".to_string()));

    // Existing record is still served, and create-or-get still finds it
    let record = ctx.service.get_document(doc.id).await.unwrap().document;
    assert_eq!(record.document_type_key, "ielts");
    assert_eq!(ctx.create(student, "ielts").await.id, doc.id);

    // New students cannot start one
    let err = ctx
        .service
        .create_or_get_document(NewDocument {
            student_id: Uuid::new_v4(),
            type_key: "ielts".into(),
            title: "IELTS".into(),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(!ctx.service.catalog().retire(&ctx.pool, "no_such_type").await.unwrap());
}

#[actix_rt::test]
async fn test_policy_edits_apply_to_existing_documents() {
    let ctx = setup().await;
    let doc = ctx.create(Uuid::new_v4(), "passport").await;

    let err = ctx
        .upload(doc.id, "scan.png", content("png"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut definitions = test_definitions();
    for def in definitions.iter_mut().filter(|d| d.key == "passport") {
        def.allowed_extensions.push("png".into());
    }
    catalog::seed(&ctx.pool, &definitions).await.unwrap();
    ctx.service.catalog().reload(&ctx.pool).await.unwrap();

    ctx.upload(doc.id, "scan.png", content("png")).await.unwrap();
}

#[actix_rt::test]
async fn test_reseeding_keeps_type_ids() {
    let ctx = setup().await;
    let before = ctx.service.catalog().by_key("transcript").unwrap().unwrap();

    let mut definitions = test_definitions();
    definitions.push(definition(
        "cv",
        DocumentCategory::Experience,
        &["pdf", "docx"],
        512,
        1,
    ));
    assert_eq!(catalog::seed(&ctx.pool, &definitions).await.unwrap(), 5);
    assert_eq!(ctx.service.catalog().reload(&ctx.pool).await.unwrap(), 5);

    let after = ctx.service.catalog().by_key("transcript").unwrap().unwrap();
    assert_eq!(before.id, after.id);
    assert!(ctx.service.catalog().by_key("cv").unwrap().is_some());
}
