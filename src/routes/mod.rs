//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers); tighten for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/levels", get(http::http_levels))
        .route(
            "/api/v1/generate",
            post(http::http_post_generate).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use std::sync::atomic::Ordering;

    use super::*;
    use crate::gemini::ResourceModel;
    use crate::logic::tests::FakeModel;

    const BOUNDARY: &str = "XBOUNDARYX";

    fn multipart_body(fields: &[(&str, Option<(&str, &str)>, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file, content) in fields {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file {
                Some((file_name, mime)) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(content.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn generate_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::post(uri)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app_with_fake() -> Router {
        build_router(Arc::new(AppState::with_model(Some(Arc::new(FakeModel::ok())))))
    }

    #[tokio::test]
    async fn health_reports_generation_status() {
        let app = build_router(Arc::new(AppState::with_model(None)));
        let res = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let v = json_body(res).await;
        assert_eq!(v["ok"], true);
        assert_eq!(v["generation_enabled"], false);
    }

    #[tokio::test]
    async fn levels_lists_six_tiers() {
        let res = app_with_fake()
            .oneshot(Request::get("/api/v1/levels").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let v = json_body(res).await;
        assert_eq!(v.as_array().unwrap().len(), 6);
        assert_eq!(v[1]["label"], "Comprendre (Understand)");
    }

    #[tokio::test]
    async fn generate_with_text_file_returns_bundle() {
        let body = multipart_body(&[
            ("level", None, "apply"),
            ("files", Some(("notes.txt", "text/plain")), "abc"),
            ("files", Some(("notes.txt", "text/plain")), "duplicate"),
        ]);
        let res = app_with_fake()
            .oneshot(generate_request("/api/v1/generate?format=markdown", body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let v = json_body(res).await;
        assert_eq!(v["level"], "apply");
        assert!(v["resources"]["quiz"]["questions"].as_array().unwrap().len() >= 1);
        assert!(v["markdown"]["quiz"].as_str().unwrap().starts_with("# "));
    }

    #[tokio::test]
    async fn blank_form_is_rejected_with_empty_input() {
        let body = multipart_body(&[("text", None, "   ")]);
        let res = app_with_fake().oneshot(generate_request("/api/v1/generate", body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let v = json_body(res).await;
        assert_eq!(v["kind"], "empty_input");
    }

    #[tokio::test]
    async fn model_format_failure_maps_to_bad_gateway() {
        let model = FakeModel::answering(Ok("not json".into()));
        let app = build_router(Arc::new(AppState::with_model(Some(Arc::new(model)))));
        let body = multipart_body(&[("text", None, "Photosynthesis converts light to energy.")]);
        let res = app.oneshot(generate_request("/api/v1/generate", body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let v = json_body(res).await;
        assert_eq!(v["kind"], "response_format_error");
    }

    #[tokio::test]
    async fn missing_api_key_is_service_unavailable() {
        let app = build_router(Arc::new(AppState::with_model(None)));
        let body = multipart_body(&[("text", None, "hello")]);
        let res = app.oneshot(generate_request("/api/v1/generate", body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn blank_file_input_is_not_an_upload() {
        let model = Arc::new(FakeModel::ok());
        let app = build_router(Arc::new(AppState::with_model(Some(model.clone() as Arc<dyn ResourceModel>))));
        let body = multipart_body(&[
            ("text", None, ""),
            ("level", None, "understand"),
            ("files", Some(("", "application/octet-stream")), ""),
        ]);
        let res = app.oneshot(generate_request("/api/v1/generate", body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let v = json_body(res).await;
        assert_eq!(v["kind"], "empty_input");
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_input_wins_over_missing_api_key() {
        let app = build_router(Arc::new(AppState::with_model(None)));
        let body = multipart_body(&[("text", None, "  ")]);
        let res = app.oneshot(generate_request("/api/v1/generate", body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let v = json_body(res).await;
        assert_eq!(v["kind"], "empty_input");
    }
}
