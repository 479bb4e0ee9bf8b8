pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::form;
use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(form::handle_form_page))
        .route("/health", get(health::health_handler))
        .route("/api/v1/generate", post(handlers::handle_generate))
        .route("/api/v1/files/:file_name", get(handlers::handle_download))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::export::{default_pdf_layout, ExportSettings, PdfOptions};
    use crate::llm_client::fake::FakeLlm;

    fn test_state(llm: FakeLlm, dir: &std::path::Path) -> AppState {
        AppState {
            llm: Arc::new(llm),
            export: ExportSettings {
                dir: dir.to_path_buf(),
                layout: default_pdf_layout(),
                pdf: PdfOptions::default(),
            },
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn generate_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(FakeLlm::new("", ""), dir.path()));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_form_page_lists_fields() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(FakeLlm::new("", ""), dir.path()));

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let page = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(page.contains("Full Name"));
        assert!(page.contains("Generate Cover Letter"));
    }

    #[tokio::test]
    async fn test_generate_then_download() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(
            FakeLlm::new("Jane Doe\n\nLed R&D", "Dear hiring manager"),
            dir.path(),
        ));

        let response = app
            .clone()
            .oneshot(generate_request(serde_json::json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "template": "Classic Professional",
                "need_cover_letter": true
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["resume"], "Jane Doe\n\nLed R&D");
        assert_eq!(body["cover_letter"], "Dear hiring manager");
        assert!(body["request_id"].is_string());
        assert_eq!(body["pdf"]["format"], "pdf");
        assert_eq!(body["docx"]["format"], "docx");

        let url = body["pdf"]["download_url"].as_str().unwrap().to_string();
        let download = app
            .oneshot(Request::get(url.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(download.status(), StatusCode::OK);
        assert_eq!(
            download.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let bytes = to_bytes(download.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_generate_rejects_missing_name() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(FakeLlm::new("x", ""), dir.path()));

        let response = app
            .oneshot(generate_request(serde_json::json!({ "email": "jane@example.com" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_surfaces_llm_failure() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(FakeLlm::failing(429), dir.path()));

        let response = app
            .oneshot(generate_request(serde_json::json!({ "name": "Jane Doe" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"]["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_download_unknown_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(FakeLlm::new("", ""), dir.path()));

        let response = app
            .oneshot(
                Request::get("/api/v1/files/resume-missing.docx")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_rejects_foreign_names() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(FakeLlm::new("", ""), dir.path()));

        let response = app
            .oneshot(Request::get("/api/v1/files/secrets.pdf").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
