use serde_json::{json, Value};
use uuid::Uuid;

use cuprank_backend::models::game_match::Side;
use cuprank_backend::models::shot::{NewShot, ShotEffect};

mod common;
use common::store::Interleave;
use common::utils::spawn_app;

#[tokio::test]
async fn shutout_win_moves_ratings_by_sixty() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;
    let match_id = app.create_match(&[alice], &[bob]).await;

    app.record_hits(match_id, alice, "A", 10).await;

    let response = app.end_match(match_id, "A").await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Cannot turn into a json.");
    assert_eq!(body["data"]["elo_variation_team_a"], 60);
    assert_eq!(body["data"]["elo_variation_team_b"], -60);
    assert_eq!(body["data"]["remaining_cups"], json!({ "team_a": 10, "team_b": 0 }));

    assert_eq!(app.rating_of(alice).await, 1060);
    assert_eq!(app.rating_of(bob).await, 940);

    let stored = app.get_data(&format!("/matches/{}", match_id)).await;
    assert_eq!(stored["status"], "FINISHED");
    assert_eq!(stored["winner_a"], true);
    assert_eq!(stored["winner_b"], false);
    assert_eq!(stored["elo_variation_team_a"], 60);
    assert_eq!(stored["elo_variation_team_b"], -60);
}

#[tokio::test]
async fn even_match_without_shots_moves_ratings_by_thirty_six() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;
    let match_id = app.create_match(&[alice], &[bob]).await;

    let response = app.end_match(match_id, "B").await;
    assert_eq!(response.status().as_u16(), 200);

    assert_eq!(app.rating_of(alice).await, 964);
    assert_eq!(app.rating_of(bob).await, 1036);
}

#[tokio::test]
async fn override_cups_replace_the_shot_log() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;
    let match_id = app.create_match(&[alice], &[bob]).await;

    let response = app
        .post(
            &format!("/matches/{}/end", match_id),
            &json!({ "winner": "A", "remaining_cups": { "team_a": 10, "team_b": 0 } }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(app.rating_of(alice).await, 1060);
}

#[tokio::test]
async fn ending_twice_is_rejected_and_ratings_change_once() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;
    let match_id = app.create_match(&[alice], &[bob]).await;

    assert_eq!(app.end_match(match_id, "A").await.status().as_u16(), 200);
    assert_eq!(app.end_match(match_id, "A").await.status().as_u16(), 409);
    assert_eq!(app.end_match(match_id, "B").await.status().as_u16(), 409);

    assert_eq!(app.rating_of(alice).await, 1036);
    assert_eq!(app.rating_of(bob).await, 964);
}

#[tokio::test]
async fn invalid_end_requests_are_rejected_before_any_write() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;
    let match_id = app.create_match(&[alice], &[bob]).await;

    for winner in ["C", "a", "", "AB"] {
        let response = app.end_match(match_id, winner).await;
        assert_eq!(response.status().as_u16(), 400, "winner {:?} accepted", winner);
    }

    let response = app
        .post(
            &format!("/matches/{}/end", match_id),
            &json!({ "winner": "A", "remaining_cups": { "team_a": 11, "team_b": 0 } }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app.end_match(Uuid::new_v4(), "A").await;
    assert_eq!(response.status().as_u16(), 404);

    let stored = app.get_data(&format!("/matches/{}", match_id)).await;
    assert_eq!(stored["status"], "ONGOING");
    assert_eq!(app.rating_of(alice).await, 1000);
}

#[tokio::test]
async fn failed_finish_leaves_everything_untouched_and_can_be_retried() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;
    let match_id = app.create_match(&[alice], &[bob]).await;
    app.record_hits(match_id, alice, "A", 10).await;

    app.store.fail_next_write();
    let response = app.end_match(match_id, "A").await;
    assert_eq!(response.status().as_u16(), 500);

    let stored = app.get_data(&format!("/matches/{}", match_id)).await;
    assert_eq!(stored["status"], "ONGOING");
    assert_eq!(stored["elo_variation_team_a"], Value::Null);
    assert_eq!(app.rating_of(alice).await, 1000);
    assert_eq!(app.rating_of(bob).await, 1000);

    assert_eq!(app.end_match(match_id, "A").await.status().as_u16(), 200);
    assert_eq!(app.rating_of(alice).await, 1060);
}

#[tokio::test]
async fn finish_scores_the_shot_log_it_closes_with() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;
    let match_id = app.create_match(&[alice], &[bob]).await;
    app.record_hits(match_id, alice, "A", 9).await;

    // The last cup lands while the end request is on its way to the store
    app.store.interleave(Interleave::ShotDuringFinish(NewShot {
        match_id,
        player_id: alice,
        side: Side::A,
        effect: ShotEffect::Hit { cup: 10 },
        sequence: None,
    }));
    let response = app.end_match(match_id, "A").await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Cannot turn into a json.");
    assert_eq!(body["data"]["remaining_cups"]["team_b"], 0);
    assert_eq!(body["data"]["elo_variation_team_a"], 60);
    assert_eq!(body["data"]["elo_variation_team_b"], -60);

    let stored = app.get_data(&format!("/matches/{}", match_id)).await;
    assert_eq!(stored["elo_variation_team_a"], 60);
    assert_eq!(app.rating_of(alice).await, 1060);

    // History agrees with what the live end applied
    let response = app.post("/admin/backfill", &json!({})).await;
    assert_eq!(response.status().as_u16(), 200);
    let stored = app.get_data(&format!("/matches/{}", match_id)).await;
    assert_eq!(stored["elo_variation_team_a"], 60);
    assert_eq!(stored["elo_variation_team_b"], -60);
    assert_eq!(app.rating_of(alice).await, 1060);
    assert_eq!(app.rating_of(bob).await, 940);
}

#[tokio::test]
async fn concurrent_ends_apply_ratings_once() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;
    let match_id = app.create_match(&[alice], &[bob]).await;

    let (first, second) = tokio::join!(app.end_match(match_id, "A"), app.end_match(match_id, "B"));
    let mut statuses = vec![first.status().as_u16(), second.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![200, 409]);

    let alice_rating = app.rating_of(alice).await;
    assert!(alice_rating == 1036 || alice_rating == 964, "rating {}", alice_rating);
    assert_eq!(alice_rating + app.rating_of(bob).await, 2000);
}

#[tokio::test]
async fn team_deltas_use_the_average_rating_of_each_side() {
    let app = spawn_app().await;
    let players: Vec<Uuid> = {
        let mut ids = Vec::new();
        for name in ["p1", "p2", "p3", "p4"] {
            ids.push(app.create_player(name).await);
        }
        ids
    };
    let match_id = app.create_match(&players[0..2], &players[2..4]).await;

    let response = app.end_match(match_id, "A").await;
    let body: Value = response.json().await.expect("Cannot turn into a json.");
    assert_eq!(body["data"]["elo_variation_team_a"], 36);

    for winner in &players[0..2] {
        assert_eq!(app.rating_of(*winner).await, 1036);
    }
    for loser in &players[2..4] {
        assert_eq!(app.rating_of(*loser).await, 964);
    }
}

#[tokio::test]
async fn match_creation_validates_rosters() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;

    let cases = vec![
        (json!({ "team_a": [], "team_b": [bob] }), 400),
        (json!({ "team_a": [alice], "team_b": [alice] }), 400),
        (json!({ "team_a": [alice, alice], "team_b": [bob] }), 400),
        (json!({ "team_a": [alice], "team_b": [Uuid::new_v4()] }), 404),
    ];
    for (body, expected) in cases {
        let response = app.post("/matches", &body).await;
        assert_eq!(response.status().as_u16(), expected, "body {} gave wrong status", body);
    }
}

#[tokio::test]
async fn history_is_newest_first_and_filters_by_status() {
    let app = spawn_app().await;
    let alice = app.create_player("alice").await;
    let bob = app.create_player("bob").await;
    let first = app.create_match(&[alice], &[bob]).await;
    let second = app.create_match(&[alice], &[bob]).await;
    app.end_match(first, "A").await;

    let all = app.get_data("/matches").await;
    let ids: Vec<String> = all
        .as_array()
        .expect("list of matches")
        .iter()
        .map(|m| m["id"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(ids, vec![second.to_string(), first.to_string()]);

    let finished = app.get_data("/matches?status=FINISHED").await;
    assert_eq!(finished.as_array().map(Vec::len), Some(1));
    assert_eq!(finished[0]["id"], first.to_string());

    let response = app.get("/matches?status=paused").await;
    assert_eq!(response.status().as_u16(), 400);
}
