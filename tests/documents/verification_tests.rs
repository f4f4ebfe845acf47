//! Verification ledger and workflow transitions.

use uuid::Uuid;

use student_docs_lib::error::AppError;
use student_docs_lib::models::{
    DocumentStatus, VerificationChecklist, VerificationStatus, VerificationSubmission,
};

use crate::helpers::{TestContext, content, setup};

async fn document_with_file(ctx: &TestContext, type_key: &str) -> Uuid {
    let doc = ctx.create(Uuid::new_v4(), type_key).await;
    ctx.upload(doc.id, "scan.pdf", content(&doc.id.to_string()))
        .await
        .unwrap();
    doc.id
}

#[actix_rt::test]
async fn test_rejection_updates_record_and_appends_entry() {
    let ctx = setup().await;
    let doc_id = document_with_file(&ctx, "transcript").await;
    let reviewer = Uuid::new_v4();

    let entry = ctx
        .service
        .submit_verification(
            doc_id,
            reviewer,
            VerificationSubmission::new(VerificationStatus::Rejected)
                .with_reason("illegible scan"),
        )
        .await
        .unwrap();

    assert_eq!(entry.status, VerificationStatus::Rejected);
    assert_eq!(entry.verified_by, reviewer);
    assert_eq!(entry.rejection_reason.as_deref(), Some("illegible scan"));

    let record = ctx.service.get_document(doc_id).await.unwrap().document;
    assert_eq!(record.status, DocumentStatus::Rejected);
    assert_eq!(record.rejection_reason.as_deref(), Some("illegible scan"));
    assert!(record.verified_at.is_none());

    let ledger = ctx.service.list_verifications(doc_id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].id, entry.id);
}

#[actix_rt::test]
async fn test_rejection_without_reason_changes_nothing() {
    let ctx = setup().await;
    let doc_id = document_with_file(&ctx, "transcript").await;

    for status in [VerificationStatus::Rejected, VerificationStatus::NeedsRevision] {
        let err = ctx
            .service
            .submit_verification(doc_id, ctx.actor, VerificationSubmission::new(status))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
    }

    let record = ctx.service.get_document(doc_id).await.unwrap().document;
    assert_eq!(record.status, DocumentStatus::Pending);
    assert!(ctx.service.list_verifications(doc_id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_approval_requires_files() {
    let ctx = setup().await;
    let doc = ctx.create(Uuid::new_v4(), "passport").await;

    let err = ctx
        .service
        .submit_verification(
            doc.id,
            ctx.actor,
            VerificationSubmission::new(VerificationStatus::Approved),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::State(_)), "got {:?}", err);
    assert!(ctx.service.list_verifications(doc.id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_approval_records_reviewer_and_checklist() {
    let ctx = setup().await;
    let doc_id = document_with_file(&ctx, "passport").await;
    let reviewer = Uuid::new_v4();

    let mut checklist = VerificationChecklist::new();
    checklist.insert("photo_matches".into(), true);
    checklist.insert("not_expired".into(), true);

    let entry = ctx
        .service
        .submit_verification(
            doc_id,
            reviewer,
            VerificationSubmission::new(VerificationStatus::Approved)
                .with_notes("looks good")
                .with_checklist(checklist.clone()),
        )
        .await
        .unwrap();

    assert_eq!(entry.verification_checklist.as_ref(), Some(&checklist));
    assert_eq!(entry.notes.as_deref(), Some("looks good"));

    let stored = ctx.service.list_verifications(doc_id).await.unwrap();
    let record = ctx.service.get_document(doc_id).await.unwrap().document;
    assert_eq!(record.status, DocumentStatus::Verified);
    assert_eq!(record.verified_by, Some(reviewer));
    assert_eq!(record.verified_at, Some(stored[0].verified_at));
    assert!(record.rejection_reason.is_none());
}

#[actix_rt::test]
async fn test_decision_on_reviewed_record_is_a_state_error() {
    let ctx = setup().await;
    let doc_id = document_with_file(&ctx, "passport").await;

    ctx.service
        .submit_verification(
            doc_id,
            ctx.actor,
            VerificationSubmission::new(VerificationStatus::Approved),
        )
        .await
        .unwrap();

    let err = ctx
        .service
        .submit_verification(
            doc_id,
            ctx.actor,
            VerificationSubmission::new(VerificationStatus::Rejected).with_reason("late"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::State(_)), "got {:?}", err);
    assert_eq!(ctx.service.list_verifications(doc_id).await.unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_resubmit_reopens_review_and_keeps_history() {
    let ctx = setup().await;
    let doc_id = document_with_file(&ctx, "passport").await;
    let reviewer = Uuid::new_v4();

    ctx.service
        .submit_verification(
            doc_id,
            reviewer,
            VerificationSubmission::new(VerificationStatus::Approved),
        )
        .await
        .unwrap();

    let approved_at = ctx.service.list_verifications(doc_id).await.unwrap()[0].verified_at;

    let reopened = ctx
        .service
        .resubmit_document(doc_id, ctx.actor, Some("renewed passport".into()))
        .await
        .unwrap();
    assert_eq!(reopened.status, VerificationStatus::Pending);
    assert_eq!(reopened.verified_by, ctx.actor);

    ctx.service
        .submit_verification(
            doc_id,
            reviewer,
            VerificationSubmission::new(VerificationStatus::Rejected).with_reason("blurry"),
        )
        .await
        .unwrap();

    let record = ctx.service.get_document(doc_id).await.unwrap().document;
    assert_eq!(record.status, DocumentStatus::Rejected);
    // The last approval stays on the record
    assert_eq!(record.verified_at, Some(approved_at));
    assert_eq!(record.verified_by, Some(reviewer));

    let statuses: Vec<VerificationStatus> = ctx
        .service
        .list_verifications(doc_id)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            VerificationStatus::Approved,
            VerificationStatus::Pending,
            VerificationStatus::Rejected,
        ]
    );
}

#[actix_rt::test]
async fn test_resubmit_of_pending_record_is_rejected() {
    let ctx = setup().await;
    let doc_id = document_with_file(&ctx, "passport").await;

    let err = ctx
        .service
        .resubmit_document(doc_id, ctx.actor, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::State(_)), "got {:?}", err);
}

#[actix_rt::test]
async fn test_upload_after_revision_request_returns_to_pending() {
    let ctx = setup().await;
    let doc = ctx.create(Uuid::new_v4(), "transcript").await;
    ctx.upload(doc.id, "page1.pdf", content("page1")).await.unwrap();

    ctx.service
        .submit_verification(
            doc.id,
            Uuid::new_v4(),
            VerificationSubmission::new(VerificationStatus::NeedsRevision)
                .with_reason("page 2 missing"),
        )
        .await
        .unwrap();

    ctx.upload(doc.id, "page2.pdf", content("page2")).await.unwrap();

    let record = ctx.service.get_document(doc.id).await.unwrap().document;
    assert_eq!(record.status, DocumentStatus::Pending);
    assert!(record.rejection_reason.is_none());

    let ledger = ctx.service.list_verifications(doc.id).await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[1].status, VerificationStatus::Pending);
    assert_eq!(ledger[1].verified_by, ctx.actor);
}

#[actix_rt::test]
async fn test_upload_to_rejected_record_keeps_status() {
    let ctx = setup().await;
    let doc = ctx.create(Uuid::new_v4(), "transcript").await;
    ctx.upload(doc.id, "a.pdf", content("a")).await.unwrap();
    ctx.service
        .submit_verification(
            doc.id,
            ctx.actor,
            VerificationSubmission::new(VerificationStatus::Rejected).with_reason("forged"),
        )
        .await
        .unwrap();

    ctx.upload(doc.id, "b.pdf", content("b")).await.unwrap();

    let record = ctx.service.get_document(doc.id).await.unwrap().document;
    assert_eq!(record.status, DocumentStatus::Rejected);
    assert_eq!(ctx.service.list_verifications(doc.id).await.unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_verification_of_unknown_document_is_not_found() {
    let ctx = setup().await;

    let err = ctx
        .service
        .submit_verification(
            Uuid::new_v4(),
            ctx.actor,
            VerificationSubmission::new(VerificationStatus::Approved),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = ctx
        .service
        .list_verifications(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
