//! Expiry projection, listing filters, and the persisted sweep.

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use student_docs_lib::models::{
    DocumentCategory, DocumentFilter, DocumentStatus, UpdateDocumentRequest, VerificationStatus,
    VerificationSubmission,
};
use student_docs_lib::services::expiry;

use crate::helpers::{TestContext, content, setup};

fn today() -> NaiveDate {
    expiry::today()
}

async fn set_expiry(ctx: &TestContext, document_id: Uuid, date: NaiveDate) {
    ctx.service
        .update_document(
            document_id,
            UpdateDocumentRequest {
                expiry_date: Some(date),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

async fn verify(ctx: &TestContext, document_id: Uuid) {
    ctx.upload(document_id, "scan.pdf", content(&document_id.to_string()))
        .await
        .unwrap();
    ctx.service
        .submit_verification(
            document_id,
            ctx.actor,
            VerificationSubmission::new(VerificationStatus::Approved),
        )
        .await
        .unwrap();
}

#[actix_rt::test]
async fn test_verified_document_past_expiry_reads_as_expired() {
    let ctx = setup().await;
    let student = Uuid::new_v4();
    let doc = ctx.create(student, "passport").await;
    verify(&ctx, doc.id).await;
    let yesterday = today().checked_sub_days(Days::new(1)).unwrap();
    set_expiry(&ctx, doc.id, yesterday).await;

    let record = ctx.service.get_document(doc.id).await.unwrap().document;
    assert_eq!(record.status, DocumentStatus::Verified);
    assert_eq!(record.effective_status, DocumentStatus::Expired);
    assert!(record.is_expired);
    assert!(!record.is_expiring_soon);

    // Already past, so not "expiring soon"
    let soon = ctx
        .service
        .list_documents(
            student,
            &DocumentFilter {
                expiring_within_days: Some(30),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(soon.is_empty());

    let expired = ctx
        .service
        .list_documents(
            student,
            &DocumentFilter {
                status: Some(DocumentStatus::Expired),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(expired.len(), 1);

    let verified = ctx
        .service
        .list_documents(
            student,
            &DocumentFilter {
                status: Some(DocumentStatus::Verified),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(verified.is_empty());
}

#[actix_rt::test]
async fn test_expiry_today_is_not_expired() {
    let ctx = setup().await;
    let doc = ctx.create(Uuid::new_v4(), "passport").await;
    set_expiry(&ctx, doc.id, today()).await;

    let record = ctx.service.get_document(doc.id).await.unwrap().document;
    assert!(!record.is_expired);
    assert!(record.is_expiring_soon);
    assert_eq!(record.effective_status, DocumentStatus::Pending);
}

#[actix_rt::test]
async fn test_expiring_within_window_filter() {
    let ctx = setup().await;
    let student = Uuid::new_v4();
    let soon = ctx.create(student, "passport").await;
    let later = ctx.create(student, "ielts").await;
    ctx.create(student, "transcript").await;

    set_expiry(&ctx, soon.id, today().checked_add_days(Days::new(30)).unwrap()).await;
    set_expiry(&ctx, later.id, today().checked_add_days(Days::new(45)).unwrap()).await;

    let within_30 = ctx
        .service
        .list_documents(
            student,
            &DocumentFilter {
                expiring_within_days: Some(30),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let ids: Vec<Uuid> = within_30.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![soon.id]);

    // The record's own flag uses its type's warning window (60 days for ielts)
    let later = ctx.service.get_document(later.id).await.unwrap().document;
    assert!(later.is_expiring_soon);
}

#[actix_rt::test]
async fn test_list_as_of_a_future_date() {
    let ctx = setup().await;
    let student = Uuid::new_v4();
    let doc = ctx.create(student, "passport").await;
    let expires = NaiveDate::from_ymd_opt(2027, 3, 1).unwrap();
    set_expiry(&ctx, doc.id, expires).await;

    let filter = DocumentFilter {
        status: Some(DocumentStatus::Expired),
        ..Default::default()
    };
    let before = ctx
        .service
        .list_documents_as_of(student, &filter, NaiveDate::from_ymd_opt(2027, 3, 1).unwrap())
        .await
        .unwrap();
    let after = ctx
        .service
        .list_documents_as_of(student, &filter, NaiveDate::from_ymd_opt(2027, 3, 2).unwrap())
        .await
        .unwrap();

    assert!(before.is_empty());
    assert_eq!(after.len(), 1);
}

#[actix_rt::test]
async fn test_category_filter() {
    let ctx = setup().await;
    let student = Uuid::new_v4();
    let passport = ctx.create(student, "passport").await;
    ctx.create(student, "transcript").await;
    ctx.create(Uuid::new_v4(), "passport").await;

    let identity = ctx
        .service
        .list_documents(
            student,
            &DocumentFilter {
                category: Some(DocumentCategory::Identity),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(identity.len(), 1);
    assert_eq!(identity[0].id, passport.id);

    let visa = ctx
        .service
        .list_documents(
            student,
            &DocumentFilter {
                category: Some(DocumentCategory::Visa),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(visa.is_empty());

    let all = ctx
        .service
        .list_documents(student, &DocumentFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[actix_rt::test]
async fn test_sweep_persists_expired_status() {
    let ctx = setup().await;
    let student = Uuid::new_v4();
    let past = ctx.create(student, "passport").await;
    let future = ctx.create(student, "ielts").await;
    let undated = ctx.create(student, "transcript").await;
    verify(&ctx, past.id).await;

    let sweep_day = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();
    set_expiry(&ctx, past.id, NaiveDate::from_ymd_opt(2030, 5, 31).unwrap()).await;
    set_expiry(&ctx, future.id, sweep_day).await;

    let marked = expiry::mark_expired_documents(&ctx.pool, sweep_day)
        .await
        .unwrap();
    assert_eq!(marked, 1);

    let past = ctx.service.get_document(past.id).await.unwrap().document;
    assert_eq!(past.status, DocumentStatus::Expired);
    let future = ctx.service.get_document(future.id).await.unwrap().document;
    assert_eq!(future.status, DocumentStatus::Pending);
    let undated = ctx.service.get_document(undated.id).await.unwrap().document;
    assert_eq!(undated.status, DocumentStatus::Pending);

    // Running again changes nothing
    let marked = expiry::mark_expired_documents(&ctx.pool, sweep_day)
        .await
        .unwrap();
    assert_eq!(marked, 0);
}

#[actix_rt::test]
async fn test_expired_record_can_be_resubmitted() {
    let ctx = setup().await;
    let doc = ctx.create(Uuid::new_v4(), "passport").await;
    verify(&ctx, doc.id).await;
    set_expiry(&ctx, doc.id, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()).await;
    expiry::mark_expired_documents(&ctx.pool, today())
        .await
        .unwrap();

    // New expiry date for the renewed document
    set_expiry(&ctx, doc.id, today().checked_add_days(Days::new(365)).unwrap()).await;
    ctx.service
        .resubmit_document(doc.id, ctx.actor, None)
        .await
        .unwrap();

    let record = ctx.service.get_document(doc.id).await.unwrap().document;
    assert_eq!(record.status, DocumentStatus::Pending);
    assert!(!record.is_expired);
}

#[actix_rt::test]
async fn test_clear_expiry_date() {
    let ctx = setup().await;
    let doc = ctx.create(Uuid::new_v4(), "passport").await;
    set_expiry(&ctx, doc.id, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()).await;

    let record = ctx
        .service
        .update_document(
            doc.id,
            UpdateDocumentRequest {
                clear_expiry_date: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(record.expiry_date, None);
    assert!(!record.is_expired);
}
