//! HTTP surface: routing, actor identity, multipart upload, and error mapping.

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};
use uuid::Uuid;

use student_docs_lib::api::{self, UploadLimit};

use crate::helpers::{TestContext, content, setup};

const BOUNDARY: &str = "----student-docs-test-boundary";

macro_rules! app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data($ctx.service.clone())
                .app_data(web::Data::new($ctx.pool.clone()))
                .app_data(web::Data::new(UploadLimit(2 * 1024 * 1024)))
                .service(web::scope("/api/v1").configure(api::configure_routes)),
        )
        .await
    };
}

fn multipart_body(file_name: &str, bytes: &[u8], description: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(description) = description {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\n{}\r\n",
                BOUNDARY, description
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(ctx: &TestContext, document_id: &str, file_name: &str, bytes: &[u8]) -> test::TestRequest {
    test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{}/files", document_id))
        .insert_header(("X-Actor-Id", ctx.actor.to_string()))
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(file_name, bytes, Some("front page")))
}

#[actix_rt::test]
async fn test_health_and_ready() {
    let ctx = setup().await;
    let app = app!(ctx);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["database"], "connected");
}

#[actix_rt::test]
async fn test_document_types_endpoint() {
    let ctx = setup().await;
    let app = app!(ctx);

    let req = test::TestRequest::get().uri("/api/v1/document-types").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let keys: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["passport", "transcript", "ielts"]);
}

#[actix_rt::test]
async fn test_mutations_require_actor_header() {
    let ctx = setup().await;
    let app = app!(ctx);
    let student = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/students/{}/documents", student))
        .set_json(json!({ "document_type": "passport", "title": "Passport" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/students/{}/documents", student))
        .insert_header(("X-Actor-Id", "not-a-uuid"))
        .set_json(json!({ "document_type": "passport", "title": "Passport" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_document_lifecycle_over_http() {
    let ctx = setup().await;
    let app = app!(ctx);
    let student = Uuid::new_v4();
    let actor = ctx.actor.to_string();

    // Create
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/students/{}/documents", student))
        .insert_header(("X-Actor-Id", actor.clone()))
        .set_json(json!({ "document_type": "transcript", "title": "Bachelor transcript" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: Value = test::read_body_json(resp).await;
    let doc_id = doc["id"].as_str().unwrap().to_string();
    assert_eq!(doc["status"], "pending");

    // Upload
    let req = upload_request(&ctx, &doc_id, "page1.pdf", &content("page1")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let file: Value = test::read_body_json(resp).await;
    assert_eq!(file["is_primary"], true);
    assert_eq!(file["description"], "front page");
    let file_id = file["id"].as_str().unwrap().to_string();

    // Same bytes again
    let req = upload_request(&ctx, &doc_id, "copy.pdf", &content("page1")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Disallowed extension
    let req = upload_request(&ctx, &doc_id, "page2.exe", &content("page2")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Download
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{}/files/{}/content", doc_id, file_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = test::read_body(resp).await;
    assert_eq!(bytes.as_ref(), content("page1").as_slice());

    // Detail
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{}", doc_id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["summary"]["file_count"], 1);
    assert_eq!(detail["summary"]["primary_file_id"], file_id.as_str());

    // Review
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{}/verifications", doc_id))
        .insert_header(("X-Actor-Id", actor.clone()))
        .set_json(json!({ "status": "needs_revision", "rejection_reason": "page 2 missing" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{}/verifications", doc_id))
        .to_request();
    let ledger: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ledger.as_array().unwrap().len(), 1);
    assert_eq!(ledger[0]["status"], "needs_revision");

    // List by status
    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/students/{}/documents?status=needs_revision",
            student
        ))
        .to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list["total"], 1);

    // Delete
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/documents/{}", doc_id))
        .insert_header(("X-Actor-Id", actor))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{}", doc_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(ctx.storage.is_empty());
}

#[actix_rt::test]
async fn test_workflow_errors_map_to_status_codes() {
    let ctx = setup().await;
    let app = app!(ctx);
    let doc = ctx.create(Uuid::new_v4(), "passport").await;
    let actor = ctx.actor.to_string();

    // No files yet
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{}/verifications", doc.id))
        .insert_header(("X-Actor-Id", actor.clone()))
        .set_json(json!({ "status": "approved" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    ctx.upload(doc.id, "scan.pdf", content("scan")).await.unwrap();

    // Unknown decision
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{}/verifications", doc.id))
        .insert_header(("X-Actor-Id", actor.clone()))
        .set_json(json!({ "status": "maybe" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Rejection without a reason
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{}/verifications", doc.id))
        .insert_header(("X-Actor-Id", actor.clone()))
        .set_json(json!({ "status": "rejected", "rejection_reason": "  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Resubmitting a pending document, with no body
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/documents/{}/resubmit", doc.id))
        .insert_header(("X-Actor-Id", actor))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Bad list filter
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/students/{}/documents?status=lost", doc.student_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Unknown file
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/documents/{}/files/{}/url", doc.id, Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_storage_failure_maps_to_bad_gateway() {
    let ctx = setup().await;
    let app = app!(ctx);
    let doc = ctx.create(Uuid::new_v4(), "passport").await;
    ctx.storage.fail_puts(true);

    let req = upload_request(&ctx, &doc.id.to_string(), "scan.pdf", &content("scan")).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert!(ctx.files(doc.id).await.is_empty());
}

#[actix_rt::test]
async fn test_primary_and_reorder_endpoints() {
    let ctx = setup().await;
    let app = app!(ctx);
    let doc = ctx.create(Uuid::new_v4(), "transcript").await;
    let a = ctx.upload(doc.id, "a.pdf", content("a")).await.unwrap();
    let b = ctx.upload(doc.id, "b.pdf", content("b")).await.unwrap();
    let actor = ctx.actor.to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/documents/{}/files/{}/primary", doc.id, b.id))
        .insert_header(("X-Actor-Id", actor.clone()))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["summary"]["primary_file_id"], b.id.to_string());

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/documents/{}/files/{}/position", doc.id, b.id))
        .insert_header(("X-Actor-Id", actor.clone()))
        .set_json(json!({ "position": 0 }))
        .to_request();
    let files: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(files[0]["id"], b.id.to_string());
    assert_eq!(files[1]["id"], a.id.to_string());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/documents/{}/files/{}", doc.id, b.id))
        .insert_header(("X-Actor-Id", actor))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let files = ctx.files(doc.id).await;
    assert_eq!(files.len(), 1);
    assert!(files[0].is_primary);
}
