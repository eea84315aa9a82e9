use serde_json::{json, Value};
use secrecy::ExposeSecret;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;
use std::sync::Arc;
use uuid::Uuid;
use once_cell::sync::Lazy;
use reqwest::{Client, Response};

use cuprank_backend::run;
use cuprank_backend::config::settings::{get_config, DatabaseSettings};
use cuprank_backend::db::{InMemoryStore, MatchStore, PgMatchStore};
use cuprank_backend::game::rating::EloConfig;
use cuprank_backend::telemetry::{get_subscriber, init_subscriber};

use crate::common::store::TestStore;

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::stdout
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::sink
        );
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub store: Arc<TestStore>,
    pub client: Client,
}

pub async fn spawn_app() -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    // Get port assigned by the OS
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Every test gets its own store, so tests never see each other's data.
    // With TEST_POSTGRES set, that store is a fresh database on the configured server.
    let inner: Arc<dyn MatchStore> = if std::env::var("TEST_POSTGRES").is_ok() {
        let mut configuration = get_config().expect("Failed to read configuration.");
        configuration.database.db_name = Uuid::new_v4().to_string();
        configuration.database.db_url = None;
        Arc::new(configure_db(&configuration.database).await)
    } else {
        Arc::new(InMemoryStore::new())
    };
    let store = Arc::new(TestStore::new(inner));
    let server = run(listener, store.clone(), EloConfig::default(), Vec::new())
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        client: Client::new(),
    }
}

pub async fn configure_db(config: &DatabaseSettings) -> PgMatchStore {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.db_name).as_str())
        .await
        .expect("Failed to create database.");

    // Migrate database
    let connection_pool = PgPool::connect(config.connection_string().expose_secret())
        .await
        .expect("Failed to connect to Postgres.");
    let store = PgMatchStore::new(connection_pool);
    store.migrate().await.expect("Failed to migrate the database");
    store
}

impl TestApp {
    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(&format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// GET and unwrap the `data` field of a successful envelope
    pub async fn get_data(&self, path: &str) -> Value {
        let response = self.get(path).await;
        assert!(response.status().is_success(), "GET {} failed: {}", path, response.status());
        let body: Value = response.json().await.expect("Cannot turn into a json.");
        body["data"].clone()
    }

    pub async fn create_player(&self, name: &str) -> Uuid {
        let response = self.post("/players", &json!({ "name": name })).await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.expect("Cannot turn into a json.");
        parse_id(&body["data"]["id"])
    }

    pub async fn create_match(&self, team_a: &[Uuid], team_b: &[Uuid]) -> Uuid {
        let response = self
            .post("/matches", &json!({ "team_a": team_a, "team_b": team_b }))
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.expect("Cannot turn into a json.");
        parse_id(&body["data"]["id"])
    }

    pub async fn record_shot(&self, match_id: Uuid, player_id: Uuid, side: &str, cup: i32, hit: bool) -> Response {
        self.post(
            "/shots",
            &json!({
                "match_id": match_id,
                "player_id": player_id,
                "side": side,
                "cup": cup,
                "hit": hit
            }),
        )
        .await
    }

    pub async fn record_bounce(&self, match_id: Uuid, player_id: Uuid, side: &str, cups: &[i32]) -> Response {
        self.post(
            "/shots/bounce",
            &json!({
                "match_id": match_id,
                "player_id": player_id,
                "side": side,
                "cups": cups
            }),
        )
        .await
    }

    /// Record `count` hits on distinct cups, all of which must be accepted
    pub async fn record_hits(&self, match_id: Uuid, player_id: Uuid, side: &str, count: i32) {
        for cup in 1..=count {
            let response = self.record_shot(match_id, player_id, side, cup, true).await;
            assert_eq!(response.status().as_u16(), 201, "hit on cup {} rejected", cup);
        }
    }

    pub async fn end_match(&self, match_id: Uuid, winner: &str) -> Response {
        self.post(&format!("/matches/{}/end", match_id), &json!({ "winner": winner }))
            .await
    }

    pub async fn undo(&self, match_id: Uuid, side: &str, sequence: i32) -> Response {
        self.post(
            &format!("/matches/{}/undo", match_id),
            &json!({ "side": side, "sequence": sequence }),
        )
        .await
    }

    pub async fn rating_of(&self, player_id: Uuid) -> i64 {
        let profile = self.get_data(&format!("/players/{}", player_id)).await;
        profile["rating"].as_i64().expect("rating is a number")
    }
}

pub fn parse_id(value: &Value) -> Uuid {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("id is a uuid string")
}
