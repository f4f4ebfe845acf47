//! Cascade deletion of a record, its files, and its ledger.

use uuid::Uuid;

use student_docs_lib::error::AppError;
use student_docs_lib::models::{VerificationStatus, VerificationSubmission};
use student_docs_lib::services::StorageGateway;

use crate::helpers::{content, setup};

#[actix_rt::test]
async fn test_delete_removes_rows_and_blobs() {
    let ctx = setup().await;
    let doc = ctx.create(Uuid::new_v4(), "transcript").await;
    let a = ctx.upload(doc.id, "a.pdf", content("a")).await.unwrap();
    let b = ctx.upload(doc.id, "b.pdf", content("b")).await.unwrap();
    ctx.service
        .submit_verification(
            doc.id,
            ctx.actor,
            VerificationSubmission::new(VerificationStatus::Approved),
        )
        .await
        .unwrap();

    let report = ctx.service.delete_document(doc.id).await.unwrap();

    assert_eq!(report.document_id, doc.id);
    assert_eq!(report.files_removed, 2);
    assert!(report.storage_failures.is_empty());
    assert!(ctx.storage.is_empty());
    assert!(!ctx.storage.exists(&a.file_path).await.unwrap());
    assert!(!ctx.storage.exists(&b.file_path).await.unwrap());

    let err = ctx.service.get_document(doc.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = ctx.service.list_verifications(doc.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn test_delete_reports_blob_failures_without_raising() {
    let ctx = setup().await;
    let doc = ctx.create(Uuid::new_v4(), "transcript").await;
    let a = ctx.upload(doc.id, "a.pdf", content("a")).await.unwrap();
    let b = ctx.upload(doc.id, "b.pdf", content("b")).await.unwrap();
    ctx.storage.fail_delete_of(b.file_path.clone());

    let report = ctx.service.delete_document(doc.id).await.unwrap();

    assert_eq!(report.files_removed, 2);
    assert_eq!(report.storage_failures, vec![b.file_path.clone()]);
    assert!(!ctx.storage.exists(&a.file_path).await.unwrap());
    assert!(ctx.storage.exists(&b.file_path).await.unwrap());

    let err = ctx.service.get_document(doc.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = ctx.service.file_content(doc.id, a.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_rt::test]
async fn test_deleted_content_can_be_uploaded_again() {
    let ctx = setup().await;
    let student = Uuid::new_v4();
    let doc = ctx.create(student, "passport").await;
    ctx.upload(doc.id, "a.pdf", content("a")).await.unwrap();

    ctx.service.delete_document(doc.id).await.unwrap();

    // The (student, type) slot and the content hash are both free again
    let again = ctx.create(student, "passport").await;
    assert_ne!(again.id, doc.id);
    ctx.upload(again.id, "a.pdf", content("a")).await.unwrap();
}

#[actix_rt::test]
async fn test_delete_leaves_other_documents_alone() {
    let ctx = setup().await;
    let student = Uuid::new_v4();
    let doomed = ctx.create(student, "transcript").await;
    let kept = ctx.create(student, "passport").await;
    ctx.upload(doomed.id, "a.pdf", content("a")).await.unwrap();
    let survivor = ctx.upload(kept.id, "p.pdf", content("p")).await.unwrap();

    ctx.service.delete_document(doomed.id).await.unwrap();

    let files = ctx.files(kept.id).await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, survivor.id);
    assert_eq!(ctx.storage.paths(), vec![survivor.file_path]);
}

#[actix_rt::test]
async fn test_delete_unknown_document_is_not_found() {
    let ctx = setup().await;

    let err = ctx.service.delete_document(Uuid::new_v4()).await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}
