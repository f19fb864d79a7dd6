pub mod health;
pub mod rate_limit;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::generation::handlers as generation;
use crate::state::AppState;
use crate::store::handlers as applications;

pub fn build_router(state: AppState) -> Router {
    // Generation tier: low-frequency limit.
    let generation_routes = Router::new()
        .route("/generate-application", post(generation::handle_generate))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_generation,
        ));

    // API tier: lighter calls, higher limit.
    let api_routes = Router::new()
        .route("/job-preview", get(generation::handle_job_preview))
        .route("/applications", get(applications::handle_list_applications))
        .route(
            "/applications/:application_id",
            delete(applications::handle_delete_application),
        )
        .route(
            "/download/:application_id/cover-letter",
            get(applications::handle_download_cover_letter),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_api,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(generation_routes)
        .merge(api_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::ConnectInfo,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::fetcher::testing::ScriptedSource;
    use crate::fetcher::SourceFailure;
    use crate::generation::enhance::testing::FakePolisher;

    const POSTING: &str = r#"<html><head><title>Jobs</title></head><body>
        <h1>Senior Backend Engineer</h1>
        <div class="company-name">Globex</div>
        <h2>Requirements</h2>
        <ul><li>Python, distributed systems</li></ul>
        </body></html>"#;

    fn test_config(output_dir: Option<std::path::PathBuf>) -> Config {
        Config {
            output_dir,
            fetch_backoff_ms: 1,
            ..Config::default()
        }
    }

    fn generate_body(style: &str) -> Value {
        json!({
            "job_url": "https://jobs.example.com/backend",
            "user_profile": {
                "name": "Grace Hopper",
                "email": "grace@example.com",
                "phone": "+1 555 010 2030",
                "experience_years": 8,
                "degree": "MSc Computer Science",
                "skills": ["Python", "COBOL"],
                "previous_roles": ["Backend Engineer"],
                "achievements": ["Built distributed systems for the Navy"]
            },
            "cover_letter_style": style
        })
    }

    fn request(method: &str, uri: &str, body: Option<&Value>, ip: [u8; 4]) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let mut request = builder.body(body).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((ip, 40000))));
        request
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = AppState::new(test_config(None), Arc::new(ScriptedSource::always("")), None);
        let response = build_router(state)
            .oneshot(request("GET", "/health", None, [127, 0, 0, 1]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage_enabled"], false);
    }

    #[tokio::test]
    async fn test_generate_end_to_end() {
        let source = Arc::new(ScriptedSource::always(POSTING));
        let state = AppState::new(test_config(None), source.clone(), None);
        let app = build_router(state);

        let body = generate_body("technical");
        let first = app
            .clone()
            .oneshot(request("POST", "/generate-application", Some(&body), [10, 0, 0, 1]))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let first = json_body(first).await;
        let letter = first["cover_letter_text"].as_str().unwrap();
        assert!(letter.contains("Senior Backend Engineer"));
        assert!(letter.contains("Python"));
        assert!(!letter.contains("COBOL"));
        assert_eq!(first["company_name"], "Globex");
        assert_eq!(first["enhanced"], false);

        let second = app
            .oneshot(request("POST", "/generate-application", Some(&body), [10, 0, 0, 1]))
            .await
            .unwrap();
        let second = json_body(second).await;
        assert_ne!(first["application_id"], second["application_id"]);
        assert_eq!(first["cover_letter_text"], second["cover_letter_text"]);
        // Second request is served from the page cache.
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_validation_errors_list_fields_without_fetching() {
        let source = Arc::new(ScriptedSource::always(POSTING));
        let state = AppState::new(test_config(None), source.clone(), None);

        let mut body = generate_body("professional");
        body["job_url"] = json!("ftp://jobs.example.com/x");
        body["user_profile"]["email"] = json!("not-an-email");

        let response = build_router(state)
            .oneshot(request("POST", "/generate-application", Some(&body), [10, 0, 0, 2]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        let fields: Vec<&str> = body["error"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["job_url", "user_profile.email"]);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_style_is_rejected() {
        let source = Arc::new(ScriptedSource::always(POSTING));
        let state = AppState::new(test_config(None), source.clone(), None);
        let response = build_router(state)
            .oneshot(request(
                "POST",
                "/generate-application",
                Some(&generate_body("haiku")),
                [10, 0, 0, 3],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "UNKNOWN_STYLE");
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_input() {
        let state = AppState::new(test_config(None), Arc::new(ScriptedSource::always("")), None);
        let response = build_router(state)
            .oneshot(request(
                "POST",
                "/generate-application",
                Some(&json!({"job_url": 42})),
                [10, 0, 0, 4],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_upstream_failure_maps_to_bad_gateway() {
        let source = Arc::new(ScriptedSource::new(vec![Err(SourceFailure::permanent(
            "HTTP 404 Not Found",
        ))]));
        let state = AppState::new(test_config(None), source, None);
        let response = build_router(state)
            .oneshot(request(
                "POST",
                "/generate-application",
                Some(&generate_body("professional")),
                [10, 0, 0, 5],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["error"]["code"], "FETCH_FAILED");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_map_to_gateway_timeout() {
        let source = Arc::new(ScriptedSource::new(vec![Err(SourceFailure::timeout(
            "timed out",
        ))]));
        let state = AppState::new(test_config(None), source.clone(), None);
        let response = build_router(state)
            .oneshot(request(
                "POST",
                "/generate-application",
                Some(&generate_body("creative")),
                [10, 0, 0, 6],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_rate_limit_and_reset() {
        let config = Config {
            rate_limit_generate_per_hour: 2,
            ..test_config(None)
        };
        let source = Arc::new(ScriptedSource::always(POSTING));
        let app = build_router(AppState::new(config, source.clone(), None));
        let body = generate_body("professional");
        let send = |ip: [u8; 4]| {
            app.clone()
                .oneshot(request("POST", "/generate-application", Some(&body), ip))
        };

        assert_eq!(send([10, 1, 1, 1]).await.unwrap().status(), StatusCode::OK);
        assert_eq!(send([10, 1, 1, 1]).await.unwrap().status(), StatusCode::OK);

        let limited = send([10, 1, 1, 1]).await.unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.headers()[header::RETRY_AFTER], "3600");
        assert_eq!(json_body(limited).await["error"]["code"], "RATE_LIMITED");
        assert_eq!(source.calls(), 1);

        // Another client is unaffected.
        assert_eq!(send([10, 1, 1, 2]).await.unwrap().status(), StatusCode::OK);

        tokio::time::advance(std::time::Duration::from_secs(3600)).await;
        assert_eq!(send([10, 1, 1, 1]).await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_is_not_rate_limited() {
        let config = Config {
            rate_limit_api_per_minute: 1,
            ..test_config(None)
        };
        let app = build_router(AppState::new(
            config,
            Arc::new(ScriptedSource::always(POSTING)),
            None,
        ));
        for _ in 0..5 {
            let response = app
                .clone()
                .oneshot(request("GET", "/health", None, [10, 2, 2, 2]))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let preview = |app: Router| {
            app.oneshot(request(
                "GET",
                "/job-preview?url=https://jobs.example.com/backend",
                None,
                [10, 2, 2, 2],
            ))
        };
        assert_eq!(preview(app.clone()).await.unwrap().status(), StatusCode::OK);
        assert_eq!(
            preview(app).await.unwrap().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_job_preview_returns_extracted_fields() {
        let app = build_router(AppState::new(
            test_config(None),
            Arc::new(ScriptedSource::always(POSTING)),
            None,
        ));
        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/job-preview?url=https://jobs.example.com/backend",
                None,
                [10, 3, 3, 3],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["job_details"]["job_title"], "Senior Backend Engineer");
        assert_eq!(body["job_details"]["company_name"], "Globex");
        assert_eq!(
            body["job_details"]["requirements"],
            json!(["Python, distributed systems"])
        );
        assert_eq!(body["from_cache"], false);

        let missing = app
            .oneshot(request("GET", "/job-preview", None, [10, 3, 3, 3]))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_enhanced_generation_uses_polisher() {
        let state = AppState::new(
            test_config(None),
            Arc::new(ScriptedSource::always(POSTING)),
            Some(Arc::new(FakePolisher { fail: false })),
        );
        let response = build_router(state)
            .oneshot(request(
                "POST",
                "/generate-application",
                Some(&generate_body("professional")),
                [10, 4, 4, 4],
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["enhanced"], true);
        assert!(body["cover_letter_text"]
            .as_str()
            .unwrap()
            .contains("SENIOR BACKEND ENGINEER"));
    }

    #[tokio::test]
    async fn test_stored_application_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            test_config(Some(dir.path().to_path_buf())),
            Arc::new(ScriptedSource::always(POSTING)),
            None,
        );
        let app = build_router(state);
        let ip = [10, 5, 5, 5];

        let generated = app
            .clone()
            .oneshot(request(
                "POST",
                "/generate-application",
                Some(&generate_body("creative")),
                ip,
            ))
            .await
            .unwrap();
        let generated = json_body(generated).await;
        let id = generated["application_id"].as_str().unwrap().to_string();

        let listed = app
            .clone()
            .oneshot(request("GET", "/applications", None, ip))
            .await
            .unwrap();
        let listed = json_body(listed).await;
        assert_eq!(listed["storage_enabled"], true);
        assert_eq!(listed["applications"][0]["application_id"], id.as_str());
        assert_eq!(listed["applications"][0]["style"], "creative");

        let download = app
            .clone()
            .oneshot(request(
                "GET",
                &format!("/download/{id}/cover-letter"),
                None,
                ip,
            ))
            .await
            .unwrap();
        assert_eq!(download.status(), StatusCode::OK);
        assert!(download.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let bytes = to_bytes(download.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            generated["cover_letter_text"].as_str().unwrap()
        );

        let deleted = app
            .clone()
            .oneshot(request("DELETE", &format!("/applications/{id}"), None, ip))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let gone = app
            .oneshot(request(
                "GET",
                &format!("/download/{id}/cover-letter"),
                None,
                ip,
            ))
            .await
            .unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }
}
