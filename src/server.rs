//! Axum router construction and route mapping.
//!
//! The [`app`] function wires every endpoint to its handler and returns
//! a ready-to-serve [`axum::Router`].  Each `/api` route maps one-to-one
//! onto a store or storage call; the ambient endpoints (`/health`,
//! `/metrics`, `/openapi.json`, `/uploads`) sit outside that surface.

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::errors::generate_request_id;
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::AppState;

// -- OpenAPI specification ----------------------------------------------------

/// OpenAPI documentation for the GameStash API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GameStash API",
        version = "0.1.0",
        description = "Game inventory HTTP API with cloud image uploads"
    ),
    paths(
        // Health check
        health_check,
        // Tester
        crate::handlers::games::hello,
        // Game collection
        crate::handlers::games::list_games,
        crate::handlers::games::get_game,
        crate::handlers::games::update_game,
        crate::handlers::games::remove_game,
        crate::handlers::games::add_game,
        // Images
        crate::handlers::images::add_game_image,
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Tester", description = "Connectivity probes"),
        (name = "Games", description = "Game collection operations"),
        (name = "Images", description = "Image upload operations"),
    )
)]
struct ApiDoc;

/// Build the axum [`Router`] with all routes.
///
/// The returned router is ready to be passed to `axum::serve`.
pub fn app(state: Arc<AppState>) -> Router {
    let mut router: Router<Arc<AppState>> = Router::new();

    if state.config.observability.health_check {
        router = router.route("/health", get(health_check));
    }
    if state.config.observability.metrics {
        router = router.route("/metrics", get(metrics_handler));
    }

    router = router
        .route("/openapi.json", get(openapi_json))
        // Tester API
        .route("/api/hello/", get(crate::handlers::games::hello))
        // Game collection API
        .route("/api/gamelist/", get(crate::handlers::games::list_games))
        .route("/api/games/:id", get(crate::handlers::games::get_game))
        .route(
            "/api/games/:id/update",
            put(crate::handlers::games::update_game),
        )
        .route(
            "/api/games/:id/remove",
            delete(crate::handlers::games::remove_game),
        )
        .route("/api/addgame/", post(crate::handlers::games::add_game))
        .route(
            "/api/addGameImage/",
            post(crate::handlers::images::add_game_image),
        );

    // When uploads land on the local filesystem, serve them back so the
    // returned locations resolve.
    if state.config.storage.backend == "local" {
        router = router.nest_service(
            "/uploads",
            ServeDir::new(&state.config.storage.local.root_dir),
        );
    }

    router
        // Application state shared across all handlers.
        .with_state(state)
        // Layer ordering: inner layers run first, outer layers wrap them.
        .layer(middleware::from_fn(common_headers_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        // Lift the default 2MB body size limit for image uploads.
        .layer(DefaultBodyLimit::disable())
}

// -- Common headers middleware -----------------------------------------------

/// Tower middleware that adds common response headers to every response:
/// - `x-request-id`: 16-character uppercase hex string
/// - `Date`: RFC 7231 formatted timestamp
/// - `Server`: `GameStash`
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    if !headers.contains_key("x-request-id") {
        let request_id = generate_request_id();
        headers.insert("x-request-id", HeaderValue::from_str(&request_id).unwrap());
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    // Always overwrite Date and Server to ensure consistency.
    headers.insert("date", HeaderValue::from_str(&date).unwrap());
    headers.insert("server", HeaderValue::from_static("GameStash"));

    response
}

// -- Health check ------------------------------------------------------------

/// `GET /health` -- Returns `{"status": "ok"}` with 200 OK.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "HealthCheck",
    responses((status = 200, description = "Health check OK"))
)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

// -- OpenAPI endpoint --------------------------------------------------------

/// `GET /openapi.json` -- the generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::inventory::memory::MemoryGameStore;
    use crate::storage::backend::{ObjectStorage, UploadArtifact};
    use crate::storage::local::LocalBackend;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::{json, Value};
    use std::future::Future;
    use std::pin::Pin;
    use tower::util::ServiceExt;

    /// Storage stub that rejects every write, for the 422 path.
    struct FailingStorage;

    impl ObjectStorage for FailingStorage {
        fn store(
            &self,
            _artifact: UploadArtifact,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
            Box::pin(async { Err(anyhow::anyhow!("bucket unreachable")) })
        }
    }

    fn test_app_with_storage(storage: Arc<dyn ObjectStorage>) -> Router {
        let state = Arc::new(AppState {
            config: Config::default(),
            store: Arc::new(MemoryGameStore::new()),
            storage,
        });
        app(state)
    }

    /// App backed by the memory store and a tempdir local backend.
    fn test_app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let backend = LocalBackend::new(dir.path(), "http://localhost:3001/uploads")
            .expect("failed to create backend");
        (dir, test_app_with_storage(Arc::new(backend)))
    }

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_bytes(response: Response) -> bytes::Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn sample_game() -> Value {
        json!({
            "name": "Chrono Trigger",
            "console": "SNES",
            "condition": "Good",
            "availability": "Available",
            "notes": "",
            "img": ""
        })
    }

    /// Insert the sample game and return its assigned id.
    async fn insert_sample(app: &Router) -> String {
        let response = send(app, json_request("POST", "/api/addgame/", sample_game())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let list = body_json(response).await;
        list.as_array().unwrap().last().unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn multipart_request(uri: &str, include_file: bool) -> Request<Body> {
        let boundary = "gamestash-test-boundary";
        let mut body = String::new();
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"gameName\"\r\n\r\nChrono Trigger\r\n"
        ));
        if include_file {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"img\"; filename=\"cover.png\"\r\nContent-Type: image/png\r\n\r\nnot really a png\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    // -- Tester / ambient routes ----------------------------------------------

    #[tokio::test]
    async fn test_hello() {
        let (_dir, app) = test_app();
        let response = send(&app, get_request("/api/hello/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body_bytes(response).await[..], b"Hello");
    }

    #[tokio::test]
    async fn test_health_check() {
        let (_dir, app) = test_app();
        let response = send(&app, get_request("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_common_response_headers() {
        let (_dir, app) = test_app();
        let response = send(&app, get_request("/api/hello/")).await;
        assert_eq!(response.headers()["server"], "GameStash");
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("date"));
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (_dir, app) = test_app();
        let response = send(&app, get_request("/openapi.json")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["paths"]["/api/gamelist/"].is_object());
    }

    // -- Game collection ------------------------------------------------------

    #[tokio::test]
    async fn test_gamelist_empty() {
        let (_dir, app) = test_app();
        let response = send(&app, get_request("/api/gamelist/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_add_game_roundtrip() {
        let (_dir, app) = test_app();
        let id = insert_sample(&app).await;
        assert!(!id.is_empty());

        let response = send(&app, get_request("/api/gamelist/")).await;
        let list = body_json(response).await;
        let records = list.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], id.as_str());
        assert_eq!(records[0]["name"], "Chrono Trigger");
        assert_eq!(records[0]["console"], "SNES");
        assert_eq!(records[0]["condition"], "Good");
        assert_eq!(records[0]["availability"], "Available");
        assert_eq!(records[0]["notes"], "");
        assert_eq!(records[0]["img"], "");
    }

    #[tokio::test]
    async fn test_add_game_omits_unset_fields() {
        let (_dir, app) = test_app();
        let response = send(
            &app,
            json_request("POST", "/api/addgame/", json!({"name": "Ico"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let list = body_json(response).await;
        let record = &list.as_array().unwrap()[0];
        assert_eq!(record["name"], "Ico");
        assert!(record.get("console").is_none());
        assert!(record.get("img").is_none());
    }

    #[tokio::test]
    async fn test_get_game_by_id() {
        let (_dir, app) = test_app();
        let id = insert_sample(&app).await;

        let response = send(&app, get_request(&format!("/api/games/{id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let record = body_json(response).await;
        assert_eq!(record["id"], id.as_str());
        assert_eq!(record["name"], "Chrono Trigger");
    }

    #[tokio::test]
    async fn test_get_game_unknown_id_is_404_empty_body() {
        let (_dir, app) = test_app();
        insert_sample(&app).await;

        let response = send(&app, get_request("/api/games/no-such-id")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_game_returns_canonical_record() {
        let (_dir, app) = test_app();
        let id = insert_sample(&app).await;

        let mut update = sample_game();
        update["availability"] = json!("Loaned out");
        let response = send(
            &app,
            json_request("PUT", &format!("/api/games/{id}/update"), update),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let record = body_json(response).await;
        assert_eq!(record["id"], id.as_str());
        assert_eq!(record["availability"], "Loaned out");
        assert_eq!(record["name"], "Chrono Trigger");
    }

    #[tokio::test]
    async fn test_update_twice_is_idempotent() {
        let (_dir, app) = test_app();
        let id = insert_sample(&app).await;

        let mut update = sample_game();
        update["notes"] = json!("complete in box");
        let first = body_json(
            send(
                &app,
                json_request("PUT", &format!("/api/games/{id}/update"), update.clone()),
            )
            .await,
        )
        .await;
        let second = body_json(
            send(
                &app,
                json_request("PUT", &format!("/api/games/{id}/update"), update),
            )
            .await,
        )
        .await;
        assert_eq!(first, second);

        let list = body_json(send(&app, get_request("/api/gamelist/")).await).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0], second);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_404_but_upserts() {
        let (_dir, app) = test_app();
        insert_sample(&app).await;

        let response = send(
            &app,
            json_request("PUT", "/api/games/no-such-id/update", sample_game()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_bytes(response).await.is_empty());

        // The upsert persisted a record even though the route reported 404.
        let list = body_json(send(&app, get_request("/api/gamelist/")).await).await;
        assert_eq!(list.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_game_shrinks_list_by_one() {
        let (_dir, app) = test_app();
        let first_id = insert_sample(&app).await;
        let second_id = insert_sample(&app).await;
        assert_ne!(first_id, second_id);

        let response = send(
            &app,
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/games/{first_id}/remove"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let remaining = body_json(response).await;
        let records = remaining.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.iter().all(|r| r["id"] != first_id.as_str()));
    }

    // -- Image upload ---------------------------------------------------------

    #[tokio::test]
    async fn test_upload_success_returns_image_location() {
        let (_dir, app) = test_app();
        let response = send(&app, multipart_request("/api/addGameImage/", true)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let location = json["imageLocation"].as_str().unwrap();
        assert!(!location.is_empty());
        assert!(location.starts_with("http://localhost:3001/uploads/"));
    }

    #[tokio::test]
    async fn test_upload_stores_blob_and_metadata() {
        let (dir, app) = test_app();
        let response = send(&app, multipart_request("/api/addGameImage/", true)).await;
        let json = body_json(response).await;
        let key = json["imageLocation"]
            .as_str()
            .unwrap()
            .rsplit('/')
            .next()
            .unwrap()
            .to_string();

        let blob = std::fs::read(dir.path().join(&key)).unwrap();
        assert_eq!(blob, b"not really a png");

        let sidecar: Value = serde_json::from_slice(
            &std::fs::read(dir.path().join(format!("{key}.meta.json"))).unwrap(),
        )
        .unwrap();
        assert_eq!(sidecar["content_type"], "image/png");
        assert_eq!(sidecar["metadata"]["gameName"], "Chrono Trigger");
    }

    #[tokio::test]
    async fn test_upload_failure_propagates_as_422() {
        let app = test_app_with_storage(Arc::new(FailingStorage));
        let response = send(&app, multipart_request("/api/addGameImage/", true)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["title"], "Image Upload Error");
        assert!(!json["errors"][0]["detail"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_missing_file_field_is_422() {
        let (_dir, app) = test_app();
        let response = send(&app, multipart_request("/api/addGameImage/", false)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["errors"][0]["title"], "Image Upload Error");
    }
}
