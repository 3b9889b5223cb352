mod common;

use axum::http::{StatusCode, header};
use serde_json::json;

use common::{ADMIN_PASSWORD, admin_cookie, app, call, json as body_json, send, test_state};

#[tokio::test]
async fn login_sets_a_strict_http_only_cookie() {
    let app = app(test_state());
    let response = send(
        &app,
        "POST",
        "/admin/login",
        Some(json!({ "password": ADMIN_PASSWORD })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("set-cookie")
        .to_owned();
    assert!(cookie.starts_with("admin_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=43200"));
    assert!(!cookie.contains("Secure"));
    assert_eq!(body_json(response).await["authenticated"], true);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = app(test_state());
    let response = send(
        &app,
        "POST",
        "/admin/login",
        Some(json!({ "password": "nope" })),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn session_reflects_the_cookie() {
    let app = app(test_state());
    let cookie = admin_cookie(&app).await;

    let response = send(&app, "GET", "/admin/session", None, Some(&cookie)).await;
    assert_eq!(body_json(response).await["authenticated"], true);

    let response = send(&app, "GET", "/admin/session", None, Some("admin_session=short")).await;
    assert_eq!(body_json(response).await["authenticated"], false);

    let (_, body) = call(&app, "GET", "/admin/session", None).await;
    assert_eq!(body["authenticated"], false);
}

#[tokio::test]
async fn console_routes_require_the_session() {
    let app = app(test_state());

    let (status, body) = call(&app, "GET", "/admin/races", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let response = send(&app, "GET", "/admin/races", None, Some("admin_session=forged")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = admin_cookie(&app).await;
    call(
        &app,
        "POST",
        "/rooms",
        Some(json!({ "name": "Sushi Sunday", "food_type": "sushi" })),
    )
    .await;
    let response = send(&app, "GET", "/admin/races", None, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let races = body_json(response).await;
    assert_eq!(races.as_array().map(Vec::len), Some(1));
    assert_eq!(races[0]["participants"], 0);
}

#[tokio::test]
async fn malformed_participant_id_is_a_bad_request() {
    let app = app(test_state());
    let cookie = admin_cookie(&app).await;

    let response = send(
        &app,
        "DELETE",
        "/admin/participants/not-a-uuid",
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn moderation_ends_races_and_removes_participants() {
    let app = app(test_state());
    let cookie = admin_cookie(&app).await;

    let (_, race) = call(
        &app,
        "POST",
        "/rooms",
        Some(json!({ "name": "Pizza Night", "food_type": "pizza" })),
    )
    .await;
    let code = race["room_code"].as_str().expect("room code").to_owned();
    let (_, participant) = call(
        &app,
        "POST",
        &format!("/rooms/{code}/participants"),
        Some(json!({ "name": "Ana" })),
    )
    .await;
    let id = participant["id"].as_str().expect("id").to_owned();

    let response = send(
        &app,
        "DELETE",
        &format!("/admin/participants/{id}"),
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (_, snapshot) = call(&app, "GET", &format!("/rooms/{code}"), None).await;
    assert_eq!(snapshot["participants"].as_array().map(Vec::len), Some(0));

    let response = send(
        &app,
        "POST",
        &format!("/admin/races/{code}/end"),
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(
        &app,
        "POST",
        &format!("/admin/races/{code}/end"),
        None,
        Some(&cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn logout_expires_the_cookie() {
    let app = app(test_state());
    let cookie = admin_cookie(&app).await;
    let response = send(&app, "POST", "/admin/logout", None, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("set-cookie")
        .to_owned();
    assert!(cleared.starts_with("admin_session=;"));
    assert!(cleared.contains("Max-Age=0"));
}
