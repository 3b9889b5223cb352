mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{app, call, test_state};

#[tokio::test]
async fn pizza_race_ends_in_the_hall_of_fame() {
    let app = app(test_state());

    let (status, race) = call(
        &app,
        "POST",
        "/rooms",
        Some(json!({ "name": "Pizza Night", "food_type": "pizza" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let code = race["room_code"].as_str().expect("room code").to_owned();
    assert_eq!(code.len(), 5);
    assert!(race["is_active"].as_bool().expect("active flag"));

    let lower = code.to_lowercase();
    let (status, vip) = call(
        &app,
        "POST",
        &format!("/rooms/{lower}/participants"),
        Some(json!({ "name": "Ana", "avatar": "chef" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(vip["is_vip"], true);
    let vip_id = vip["id"].as_str().expect("vip id").to_owned();

    let (status, guest) = call(
        &app,
        "POST",
        &format!("/rooms/{code}/participants"),
        Some(json!({ "name": "Bia" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(guest["is_vip"], false);
    let guest_id = guest["id"].as_str().expect("guest id").to_owned();

    for delta in [1, 1, 1] {
        let (status, _) = call(
            &app,
            "POST",
            &format!("/rooms/{code}/participants/{vip_id}/count"),
            Some(json!({ "delta": delta })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, clamped) = call(
        &app,
        "POST",
        &format!("/rooms/{code}/participants/{guest_id}/count"),
        Some(json!({ "delta": -4 })),
    )
    .await;
    assert_eq!(clamped["items_eaten"], 0);

    let (status, body) = call(
        &app,
        "POST",
        &format!("/rooms/{code}/end"),
        Some(json!({ "participant_id": guest_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, ended) = call(
        &app,
        "POST",
        &format!("/rooms/{code}/end"),
        Some(json!({ "participant_id": vip_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["is_active"], false);
    assert!(ended["ended_at"].is_string());

    let (status, snapshot) = call(&app, "GET", &format!("/rooms/{code}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["view"], "hall_of_fame");
    assert_eq!(snapshot["participants"][0]["id"], vip_id.as_str());
    assert_eq!(snapshot["participants"][0]["items_eaten"], 3);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/rooms/{code}/participants/{vip_id}/count"),
        Some(json!({ "delta": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/rooms/{code}/end"),
        Some(json!({ "participant_id": vip_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_rooms_and_bad_bodies_use_the_error_envelope() {
    let app = app(test_state());

    let (status, body) = call(&app, "GET", "/rooms/ZZZZZ", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, body) = call(&app, "POST", "/rooms", Some(json!({ "name": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = call(
        &app,
        "POST",
        "/rooms",
        Some(json!({ "name": "   ", "food_type": "sushi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_participant_ids_use_the_error_envelope() {
    let app = app(test_state());
    let (_, race) = call(
        &app,
        "POST",
        "/rooms",
        Some(json!({ "name": "Burger Bash", "food_type": "burger" })),
    )
    .await;
    let code = race["room_code"].as_str().expect("room code").to_owned();

    let (status, body) = call(
        &app,
        "POST",
        &format!("/rooms/{code}/participants/not-a-uuid/count"),
        Some(json!({ "delta": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/rooms/{code}/participants/42/avatar"),
        Some(json!({ "avatar": "chef" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn team_mode_aggregates_standings() {
    let app = app(test_state());
    let (_, race) = call(
        &app,
        "POST",
        "/rooms",
        Some(json!({ "name": "Burger Bash", "food_type": "burger", "is_team_mode": true })),
    )
    .await;
    let code = race["room_code"].as_str().expect("room code").to_owned();

    let (_, ana) = call(
        &app,
        "POST",
        &format!("/rooms/{code}/participants"),
        Some(json!({ "name": "Ana", "team": "AZUL" })),
    )
    .await;
    let (_, bia) = call(
        &app,
        "POST",
        &format!("/rooms/{code}/participants"),
        Some(json!({ "name": "Bia" })),
    )
    .await;
    let bia_id = bia["id"].as_str().expect("id").to_owned();
    let (status, chosen) = call(
        &app,
        "PUT",
        &format!("/rooms/{code}/participants/{bia_id}/team"),
        Some(json!({ "team": "AZUL" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chosen["team"], "AZUL");

    let ana_id = ana["id"].as_str().expect("id").to_owned();
    for id in [&ana_id, &bia_id] {
        call(
            &app,
            "POST",
            &format!("/rooms/{code}/participants/{id}/count"),
            Some(json!({ "delta": 2 })),
        )
        .await;
    }

    let (_, snapshot) = call(&app, "GET", &format!("/rooms/{code}"), None).await;
    assert_eq!(snapshot["view"], "live");
    let leader = &snapshot["teams"][0];
    assert_eq!(leader["team"], "AZUL");
    assert_eq!(leader["items_eaten"], 4);
    assert_eq!(leader["members"], 2);
}
