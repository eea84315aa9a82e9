use serde_json::{json, Value};

mod common;
use common::utils::spawn_app;

#[tokio::test]
async fn new_players_start_at_the_initial_rating() {
    let app = spawn_app().await;
    let response = app.post("/players", &json!({ "name": "  alice " })).await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.expect("Cannot turn into a json.");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "alice");
    assert_eq!(body["data"]["rating"], 1000);
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let app = spawn_app().await;
    for name in ["", "   "] {
        let response = app.post("/players", &json!({ "name": name })).await;
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.expect("Cannot turn into a json.");
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn leaderboard_is_ordered_by_rating() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;
    let match_id = app.create_match(&[alice], &[bob]).await;
    app.end_match(match_id, "B").await;

    let players = app.get_data("/players").await;
    let names: Vec<&str> = players
        .as_array()
        .expect("list of players")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec!["bob", "alice"]);
}

#[tokio::test]
async fn profile_reports_record_and_recent_matches() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;

    let won = app.create_match(&[alice], &[bob]).await;
    app.end_match(won, "A").await;
    let lost = app.create_match(&[bob], &[alice]).await;
    app.end_match(lost, "A").await;
    app.create_match(&[alice], &[bob]).await;

    let profile = app.get_data(&format!("/players/{}", alice)).await;
    assert_eq!(profile["matches_played"], 2);
    assert_eq!(profile["wins"], 1);
    assert_eq!(profile["losses"], 1);

    let recent = profile["recent_matches"].as_array().expect("recent matches");
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0]["id"], lost.to_string());
    assert_eq!(recent[0]["result"], "loss");
    assert_eq!(recent[0]["opponents"][0]["name"], "bob");
    assert_eq!(recent[1]["result"], "win");
    assert_eq!(recent[1]["rating_change"], 36);
}

#[tokio::test]
async fn unknown_player_is_not_found() {
    let app = spawn_app().await;
    let response = app.get(&format!("/players/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(response.status().as_u16(), 404);
}
