use axum::{
    body::Body,
    http::{header, Method, Request},
    middleware::from_fn,
    response::Html,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{handlers, middleware, openapi::ApiDoc, AppState};

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    let auth_routes = Router::new()
        .route("/login", post(handlers::auth_handler::login))
        .route("/logout", post(handlers::auth_handler::logout))
        .route("/me", get(handlers::auth_handler::get_me));

    let animal_routes = Router::new()
        .route(
            "/",
            get(handlers::animals_handler::get_animals).post(handlers::animals_handler::create_animal),
        )
        .route("/{id}", put(handlers::animals_handler::update_animal));

    let food_type_routes = Router::new()
        .route(
            "/",
            get(handlers::food_types_handler::get_food_types)
                .post(handlers::food_types_handler::create_food_type),
        )
        .route("/{id}", put(handlers::food_types_handler::update_food_type));

    let food_entry_routes = Router::new()
        .route("/", post(handlers::food_entries_handler::create_food_entry))
        .route(
            "/{id}",
            get(handlers::food_entries_handler::get_food_entry)
                .put(handlers::food_entries_handler::update_food_entry)
                .delete(handlers::food_entries_handler::delete_food_entry),
        );

    let weight_entry_routes = Router::new()
        .route("/", post(handlers::weight_entries_handler::create_weight_entry))
        .route(
            "/{id}",
            get(handlers::weight_entries_handler::get_weight_entry)
                .put(handlers::weight_entries_handler::update_weight_entry),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api/auth", auth_routes)
        .route("/api/dashboard", get(handlers::dashboard_handler::get_dashboard))
        .route("/api/history", get(handlers::history_handler::get_history))
        .route("/api/statistics", get(handlers::statistics_handler::get_statistics))
        .route("/api/settings", get(handlers::settings_handler::get_settings))
        .route("/api/vitamin/toggle", post(handlers::vitamin_handler::toggle_vitamin))
        .nest("/api/animals", animal_routes)
        .nest("/api/food-types", food_type_routes)
        .nest("/api/food-entries", food_entry_routes)
        .nest("/api/weight-entries", weight_entry_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/swagger-ui", get(swagger_ui))
        .layer(from_fn(middleware::metrics_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(trace)
        .layer(cors)
        .with_state(state)
}

async fn swagger_ui() -> Html<&'static str> {
    Html(r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Guinea Tracker API</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: '/api-docs/openapi.json',
                dom_id: '#swagger-ui',
            });
        };
    </script>
</body>
</html>
    "#)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MemoryStore, handlers::metrics::detached_metrics, AppConfig, StoreBackend};
    use axum::http::{HeaderValue, StatusCode};
    use chrono_tz::Tz;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = AppConfig {
            store: StoreBackend::Memory,
            timezone: Tz::UTC,
            title: "Test pigs".to_string(),
            session_secret: "router-test-secret".to_string(),
            session_max_age_secs: 3600,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
        };
        let state = AppState::new(Arc::new(MemoryStore::new()), config, detached_metrics());
        build_router(Arc::new(state))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, value)
    }

    async fn login(app: &Router, name: &str) -> String {
        let (status, headers, _) = send(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let set_cookie = headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.contains("Max-Age=3600"), "{}", set_cookie);
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn create(app: &Router, cookie: &str, uri: &str, body: Value) -> Value {
        let (status, _, value) = send(app, Method::POST, uri, Some(cookie), Some(body)).await;
        assert_eq!(status, StatusCode::OK, "{}: {}", uri, value);
        value
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, headers, body) = send(&app, Method::GET, "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_api_requires_session() {
        let app = test_app();
        let (status, _, body) = send(&app, Method::GET, "/api/dashboard", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _, _) = send(
            &app,
            Method::GET,
            "/api/dashboard",
            Some("session=forged"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_normalizes_name_and_sets_session() {
        let app = test_app();
        let cookie = login(&app, "Anna Maria").await;
        assert!(cookie.starts_with("session="));

        let (status, _, me) = send(&app, Method::GET, "/api/auth/me", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["name"], "anna");

        let again = login(&app, "ANNA").await;
        let (_, _, me_again) = send(&app, Method::GET, "/api/auth/me", Some(&again), None).await;
        assert_eq!(me_again["id"], me["id"]);
    }

    #[tokio::test]
    async fn test_login_rejects_unsafe_next() {
        let app = test_app();
        let (status, _, _) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "name": "anna", "next": "https://evil.example/" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "name": "anna", "next": "/history" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["redirect"], "/history");
    }

    #[tokio::test]
    async fn test_hidden_food_type_is_rejected_for_new_entries() {
        let app = test_app();
        let cookie = login(&app, "anna").await;
        let hidden = create(
            &app,
            &cookie,
            "/api/food-types",
            json!({ "label": "old pellets", "is_hidden": true }),
        )
        .await;

        let (status, _, _) = send(
            &app,
            Method::POST,
            "/api/food-entries",
            Some(&cookie),
            Some(json!({ "food_type_id": hidden["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, _, visible) = send(
            &app,
            Method::GET,
            "/api/food-types?visible_only=true",
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(visible, json!([]));
    }

    #[tokio::test]
    async fn test_unknown_animal_and_bad_weight_are_rejected() {
        let app = test_app();
        let cookie = login(&app, "anna").await;
        let pickle = create(&app, &cookie, "/api/animals", json!({ "name": "Pickle" })).await;

        let (status, _, _) = send(
            &app,
            Method::POST,
            "/api/weight-entries",
            Some(&cookie),
            Some(json!({ "value": 950.0, "animal_id": 999 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _, _) = send(
            &app,
            Method::POST,
            "/api/weight-entries",
            Some(&cookie),
            Some(json!({ "value": -1.0, "animal_id": pickle["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_statistics_after_feeding() {
        let app = test_app();
        let cookie = login(&app, "anna").await;
        let carrot = create(&app, &cookie, "/api/food-types", json!({ "label": "carrot" })).await;
        let treat = create(&app, &cookie, "/api/food-types", json!({ "label": "treat" })).await;
        let pickle = create(&app, &cookie, "/api/animals", json!({ "name": "Pickle" })).await;

        for food_type in [&carrot, &carrot, &carrot, &treat] {
            create(
                &app,
                &cookie,
                "/api/food-entries",
                json!({ "food_type_id": food_type["id"] }),
            )
            .await;
        }

        let (status, _, stats) =
            send(&app, Method::GET, "/api/statistics", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["food"]["most_frequent"], "carrot");
        assert_eq!(stats["food"]["least_frequent"], "treat");
        assert_eq!(stats["weights"], json!([{ "animal_id": pickle["id"], "name": "Pickle", "value": null }]));
    }

    #[tokio::test]
    async fn test_food_entry_lifecycle() {
        let app = test_app();
        let cookie = login(&app, "anna").await;
        let hay = create(&app, &cookie, "/api/food-types", json!({ "label": "hay" })).await;
        let pickle = create(&app, &cookie, "/api/animals", json!({ "name": "Pickle" })).await;

        let entry = create(
            &app,
            &cookie,
            "/api/food-entries",
            json!({ "food_type_id": hay["id"], "animal_ids": [pickle["id"]], "notes": "fresh" }),
        )
        .await;
        let uri = format!("/api/food-entries/{}", entry["id"]);

        let (status, _, updated) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&cookie),
            Some(json!({ "food_type_id": hay["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["created_at"], entry["created_at"]);
        assert_eq!(updated["animals"], json!([]));

        let (status, _, _) = send(&app, Method::DELETE, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(&app, Method::DELETE, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = send(&app, Method::GET, &uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_history_with_invalid_range_is_empty() {
        let app = test_app();
        let cookie = login(&app, "anna").await;

        let (status, _, body) = send(
            &app,
            Method::GET,
            "/api/history?start=2024-13-01&end=2024-01-02",
            Some(&cookie),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"], json!([]));
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_vitamin_toggle_shows_in_dashboard_and_history() {
        let app = test_app();
        let cookie = login(&app, "anna").await;

        let (status, _, toggled) =
            send(&app, Method::POST, "/api/vitamin/toggle", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["given"], true);

        let (_, _, dashboard) = send(&app, Method::GET, "/api/dashboard", Some(&cookie), None).await;
        assert_eq!(dashboard["vitamin"]["user_name"], "anna");

        let (_, _, history) =
            send(&app, Method::GET, "/api/history?mode=today", Some(&cookie), None).await;
        assert_eq!(history["entries"][0]["kind"], "vitamin");
        assert!(history["error"].is_null());

        let (_, _, toggled) =
            send(&app, Method::POST, "/api/vitamin/toggle", Some(&cookie), None).await;
        assert_eq!(toggled["given"], false);

        let (_, _, dashboard) = send(&app, Method::GET, "/api/dashboard", Some(&cookie), None).await;
        assert!(dashboard["vitamin"].is_null());
    }

    #[tokio::test]
    async fn test_settings_report_title() {
        let app = test_app();
        let cookie = login(&app, "anna").await;

        let (status, _, settings) =
            send(&app, Method::GET, "/api/settings", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settings["title"], "Test pigs");
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let app = test_app();
        let (status, _, doc) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/api/history"].is_object());
    }
}
