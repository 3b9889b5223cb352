#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use eat_race_back::{
    config::{AdminConfig, AppConfig},
    dao::competition_store::memory::MemoryCompetitionStore,
    routes,
    state::{AppState, SharedState},
};
use serde_json::Value;
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "letmein";

pub fn test_state() -> SharedState {
    let config = AppConfig::default().with_admin(AdminConfig {
        password: Some(ADMIN_PASSWORD.into()),
        session_token: None,
        secure_cookie: false,
    });
    AppState::with_store(config, Arc::new(MemoryCompetitionStore::new()))
}

pub fn app(state: SharedState) -> Router {
    routes::router(state)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    app.clone().oneshot(request).await.expect("route request")
}

pub async fn json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Send a request and return status plus decoded JSON body.
pub async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = send(app, method, uri, body, None).await;
    let status = response.status();
    (status, json(response).await)
}

/// Log into the admin console and return the `name=value` cookie pair.
pub async fn admin_cookie(app: &Router) -> String {
    let response = send(
        app,
        "POST",
        "/admin/login",
        Some(serde_json::json!({ "password": ADMIN_PASSWORD })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("session cookie");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_owned()
}
