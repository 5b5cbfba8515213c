pub mod auth;
pub mod error;
pub mod middleware;
pub mod runs;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

pub use auth::{AppState, AppStateInner};

/// Build the full API router: public auth routes plus token-protected run
/// routes. The server binary layers CORS and tracing on top of this.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .with_state(state.clone());

    let run_routes = Router::new()
        .route("/api/nuzlocke/runs", get(runs::list_runs))
        .route("/api/nuzlocke/runs", post(runs::create_run))
        .route("/api/nuzlocke/runs/{id}", get(runs::get_run))
        .route("/api/nuzlocke/runs/{id}", put(runs::update_run))
        .route("/api/nuzlocke/runs/{id}", delete(runs::delete_run))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    auth_routes.merge(run_routes)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{AppState, AppStateInner, router};

    fn test_app() -> Router {
        let db = lockebox_db::Database::open_in_memory().unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db,
            jwt_secret: "test-secret".into(),
        });
        router(state)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(json_request(method, uri, token, body))
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(app: &Router, username: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/register",
            None,
            Some(&json!({ "username": username, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn register_login_logout_flow() {
        let app = test_app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(&json!({ "username": "ash", "password": "pikachu-123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["userId"].as_str().is_some());
        assert!(!body["token"].as_str().unwrap().is_empty());

        // Same username again
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(&json!({ "username": "ash", "password": "different-pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "username already taken");

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(&json!({ "username": "ash", "password": "pikachu-123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "ash");
        assert!(!body["token"].as_str().unwrap().is_empty());

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(&json!({ "username": "ash", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Unknown user looks the same as a bad password
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(&json!({ "username": "giovanni", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid credentials");

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/auth/logout", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cleared = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cleared.starts_with("token="));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let app = test_app();

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(&json!({ "username": "ab", "password": "long-enough-pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(&json!({ "username": "brock", "password": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn runs_require_token() {
        let app = test_app();

        let (status, body) = send(&app, "GET", "/api/nuzlocke/runs", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing authentication token");

        let (status, body) = send(
            &app,
            "GET",
            "/api/nuzlocke/runs",
            Some("not-a-real-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "invalid or expired token");
    }

    #[tokio::test]
    async fn cookie_session_works() {
        let app = test_app();
        register(&app, "misty", "starmie-pass").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                Some(&json!({ "username": "misty", "password": "starmie-pass" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.contains("HttpOnly"));
        let cookie_pair = set_cookie.split(';').next().unwrap().to_string();

        let request = Request::builder()
            .method("GET")
            .uri("/api/nuzlocke/runs")
            .header(header::COOKIE, cookie_pair)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn run_crud_flow() {
        let app = test_app();
        let token = register(&app, "may", "torchic-pass").await;

        let (status, created) = send(
            &app,
            "POST",
            "/api/nuzlocke/runs",
            Some(&token),
            Some(&json!({
                "gameVersion": "Emerald",
                "runName": "Hoenn Adventure",
                "currentRoute": "Route 101",
                "encounters": [{ "routeName": "Route 101", "pokemonId": 261, "pokemonName": "Poochyena" }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["gameVersion"], "Emerald");
        assert_eq!(created["encounters"][0]["status"], "Upcoming");
        assert_eq!(created["boxPokemon"], json!([]));
        let run_id = created["id"].as_str().unwrap().to_string();

        let (status, listed) = send(&app, "GET", "/api/nuzlocke/runs", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["id"], run_id.as_str());

        let uri = format!("/api/nuzlocke/runs/{run_id}");
        let (status, fetched) = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["runName"], "Hoenn Adventure");

        // Partial update: only the sent fields change
        let (status, updated) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(&json!({
                "runName": "Hoenn Adventure II",
                "badges": ["Stone Badge"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["runName"], "Hoenn Adventure II");
        assert_eq!(updated["gameVersion"], "Emerald");
        assert_eq!(updated["badges"], json!(["Stone Badge"]));
        assert_eq!(updated["encounters"][0]["pokemonName"], "Poochyena");
        assert_eq!(updated["createdAt"], created["createdAt"]);
        assert_eq!(updated["userId"], created["userId"]);

        let (status, _) = send(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn runs_scoped_to_owner() {
        let app = test_app();
        let owner = register(&app, "red", "pallet-town").await;
        let intruder = register(&app, "blue", "viridian-gym").await;

        let (status, created) = send(
            &app,
            "POST",
            "/api/nuzlocke/runs",
            Some(&owner),
            Some(&json!({ "runName": "Kanto Classic" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/nuzlocke/runs/{}", created["id"].as_str().unwrap());

        // Not in the other user's list
        let (status, listed) = send(&app, "GET", "/api/nuzlocke/runs", Some(&intruder), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 0);

        let (status, body) = send(&app, "GET", &uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "you do not own this run");

        let (status, _) = send(
            &app,
            "PUT",
            &uri,
            Some(&intruder),
            Some(&json!({ "runName": "Stolen Run" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, "DELETE", &uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Untouched for the owner
        let (status, fetched) = send(&app, "GET", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["runName"], "Kanto Classic");
    }

    #[tokio::test]
    async fn update_rejects_non_whitelisted_fields() {
        let app = test_app();
        let token = register(&app, "wally", "gardevoir-pw").await;

        let (_, created) = send(
            &app,
            "POST",
            "/api/nuzlocke/runs",
            Some(&token),
            Some(&json!({ "runName": "Ralts Only" })),
        )
        .await;
        let uri = format!("/api/nuzlocke/runs/{}", created["id"].as_str().unwrap());

        let (status, _) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(&json!({ "userId": "00000000-0000-0000-0000-000000000000" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "PUT",
            &uri,
            Some(&token),
            Some(&json!({ "createdAt": "1999-01-01T00:00:00Z" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Owner and timestamps survived the rejected updates
        let (_, fetched) = send(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(fetched["userId"], created["userId"]);
        assert_eq!(fetched["createdAt"], created["createdAt"]);
    }

    #[tokio::test]
    async fn malformed_and_unknown_run_ids() {
        let app = test_app();
        let token = register(&app, "steven", "metagross-pw").await;

        let (status, body) = send(
            &app,
            "GET",
            "/api/nuzlocke/runs/not-a-uuid",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "malformed run id");

        let (status, body) = send(
            &app,
            "GET",
            "/api/nuzlocke/runs/7f1fd627-21a5-4b37-8c5a-2d1ed3f9a001",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "run not found");
    }
}
