use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use uuid::Uuid;

use crate::config::settings::DatabaseSettings;
use crate::db::store::MatchStore;
use crate::error::GameError;
use crate::game::finish::{score_finish, FinishRequest};
use crate::game::shot_ledger::{check_shot_against_match, ShotLedger};
use crate::models::common::SortOrder;
use crate::models::game_match::{
    CleanupReport, Match, MatchDelta, MatchFilter, MatchFinish, MatchStatus, RosterEntry, Side,
};
use crate::models::player::Player;
use crate::models::shot::{NewShot, Shot, ShotEffect, ShotFilter};

const MATCH_COLUMNS: &str = r#"
    m.id, m.status, m.winner_a, m.winner_b,
    m.elo_variation_team_a, m.elo_variation_team_b,
    m.created_at, m.finished_at
"#;

const SHOT_COLUMNS: &str = r#"
    id, match_id, player_id, side, hit, cup, bounce_cup, sequence, created_at
"#;

#[derive(Debug, FromRow)]
struct MatchRow {
    id: Uuid,
    status: MatchStatus,
    winner_a: bool,
    winner_b: bool,
    elo_variation_team_a: Option<i32>,
    elo_variation_team_b: Option<i32>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct RosterRow {
    match_id: Uuid,
    side: Side,
    player_id: Uuid,
    name: String,
    rating: i32,
}

#[derive(Debug, FromRow)]
struct ShotRow {
    id: Uuid,
    match_id: Uuid,
    player_id: Uuid,
    side: Side,
    hit: bool,
    cup: i32,
    bounce_cup: Option<i32>,
    sequence: i32,
    created_at: DateTime<Utc>,
}

impl From<ShotRow> for Shot {
    fn from(row: ShotRow) -> Self {
        Shot {
            id: row.id,
            match_id: row.match_id,
            player_id: row.player_id,
            side: row.side,
            effect: ShotEffect::from_columns(row.hit, row.cup, row.bounce_cup),
            sequence: row.sequence,
            created_at: row.created_at,
        }
    }
}

/// Lazily connecting pool, sized like the API server needs it
pub fn get_connection_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(32)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_lazy(settings.connection_string().expose_secret())
}

#[derive(Debug, Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), GameError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

async fn fetch_rosters(
    conn: &mut PgConnection,
    match_ids: &[Uuid],
) -> Result<HashMap<Uuid, (Vec<RosterEntry>, Vec<RosterEntry>)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RosterRow>(
        r#"
        SELECT r.match_id, r.side, r.player_id, p.name, p.rating
        FROM match_rosters r
        JOIN players p ON p.id = r.player_id
        WHERE r.match_id = ANY($1)
        ORDER BY r.match_id, r.side, r.position
        "#,
    )
    .bind(match_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut rosters: HashMap<Uuid, (Vec<RosterEntry>, Vec<RosterEntry>)> = HashMap::new();
    for row in rows {
        let teams = rosters.entry(row.match_id).or_default();
        let entry = RosterEntry {
            player_id: row.player_id,
            name: row.name,
            rating: row.rating,
        };
        match row.side {
            Side::A => teams.0.push(entry),
            Side::B => teams.1.push(entry),
        }
    }
    Ok(rosters)
}

async fn assemble_matches(conn: &mut PgConnection, rows: Vec<MatchRow>) -> Result<Vec<Match>, sqlx::Error> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut rosters = fetch_rosters(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let (team_a, team_b) = rosters.remove(&row.id).unwrap_or_default();
            Match {
                id: row.id,
                status: row.status,
                team_a,
                team_b,
                winner_a: row.winner_a,
                winner_b: row.winner_b,
                elo_variation_team_a: row.elo_variation_team_a,
                elo_variation_team_b: row.elo_variation_team_b,
                created_at: row.created_at,
                finished_at: row.finished_at,
            }
        })
        .collect())
}

async fn fetch_match(conn: &mut PgConnection, match_id: Uuid, lock: bool) -> Result<Option<Match>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM matches m WHERE m.id = $1{}",
        MATCH_COLUMNS,
        if lock { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query_as::<_, MatchRow>(&sql)
        .bind(match_id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(assemble_matches(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

async fn fetch_shots(conn: &mut PgConnection, filter: &ShotFilter) -> Result<Vec<Shot>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {}
        FROM shots
        WHERE ($1::uuid IS NULL OR match_id = $1)
        AND ($2::uuid IS NULL OR player_id = $2)
        ORDER BY created_at ASC, side ASC, sequence ASC
        "#,
        SHOT_COLUMNS
    );
    let rows = sqlx::query_as::<_, ShotRow>(&sql)
        .bind(filter.match_id)
        .bind(filter.player_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(Shot::from).collect())
}

#[async_trait]
impl MatchStore for PgMatchStore {
    #[tracing::instrument(name = "Insert player", skip(self))]
    async fn create_player(&self, name: &str, rating: i32) -> Result<Player, GameError> {
        let player = sqlx::query_as::<_, Player>(
            r#"
            INSERT INTO players (id, name, rating, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, name, rating, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(rating)
        .fetch_one(&self.pool)
        .await?;
        Ok(player)
    }

    async fn get_player(&self, player_id: Uuid) -> Result<Option<Player>, GameError> {
        let player = sqlx::query_as::<_, Player>(
            "SELECT id, name, rating, created_at FROM players WHERE id = $1",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(player)
    }

    async fn list_players(&self) -> Result<Vec<Player>, GameError> {
        let players = sqlx::query_as::<_, Player>(
            "SELECT id, name, rating, created_at FROM players ORDER BY rating DESC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(players)
    }

    #[tracing::instrument(
        name = "Insert match with rosters",
        skip(self),
        fields(team_a_size = team_a.len(), team_b_size = team_b.len())
    )]
    async fn create_match(&self, team_a: &[Uuid], team_b: &[Uuid]) -> Result<Match, GameError> {
        let match_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO matches (id, status, winner_a, winner_b, created_at)
            VALUES ($1, 'ONGOING', FALSE, FALSE, NOW())
            "#,
        )
        .bind(match_id)
        .execute(&mut *tx)
        .await?;

        for (side, roster) in [(Side::A, team_a), (Side::B, team_b)] {
            for (position, player_id) in roster.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO match_rosters (match_id, player_id, side, position)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(match_id)
                .bind(player_id)
                .bind(side)
                .bind(position as i32)
                .execute(&mut *tx)
                .await?;
            }
        }

        let created = fetch_match(&mut *tx, match_id, false).await?;
        tx.commit().await?;

        created.ok_or_else(|| GameError::not_found(format!("Match {} not found", match_id)))
    }

    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>, GameError> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_match(&mut *conn, match_id, false).await?)
    }

    async fn list_matches(&self, filter: &MatchFilter, order: SortOrder) -> Result<Vec<Match>, GameError> {
        let sql = format!(
            r#"
            SELECT {columns}
            FROM matches m
            WHERE ($1::varchar IS NULL OR m.status = $1)
            AND ($2::uuid IS NULL OR EXISTS (
                SELECT 1 FROM match_rosters r WHERE r.match_id = m.id AND r.player_id = $2
            ))
            ORDER BY m.created_at {order}, m.id {order}
            "#,
            columns = MATCH_COLUMNS,
            order = order.as_sql()
        );

        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(filter.status)
            .bind(filter.player_id)
            .fetch_all(&mut *conn)
            .await?;
        Ok(assemble_matches(&mut *conn, rows).await?)
    }

    #[tracing::instrument(
        name = "Finish match",
        skip(self, request),
        fields(match_id = %request.match_id, winner = %request.winner)
    )]
    async fn finish_match(&self, request: &FinishRequest) -> Result<MatchFinish, GameError> {
        let mut tx = self.pool.begin().await?;

        // Shot appends and undos queue behind this lock, so the scored log is the final one
        let game_match = fetch_match(&mut *tx, request.match_id, true)
            .await?
            .ok_or_else(|| GameError::not_found(format!("Match {} not found", request.match_id)))?;
        let shots = fetch_shots(
            &mut *tx,
            &ShotFilter {
                match_id: Some(request.match_id),
                player_id: None,
            },
        )
        .await?;
        let finish = score_finish(&game_match, &ShotLedger::new(shots), request)?;

        let updated = sqlx::query(
            r#"
            UPDATE matches
            SET
                status = 'FINISHED',
                winner_a = $2,
                winner_b = $3,
                elo_variation_team_a = $4,
                elo_variation_team_b = $5,
                finished_at = NOW()
            WHERE id = $1 AND status = 'ONGOING'
            "#,
        )
        .bind(finish.match_id)
        .bind(finish.winner == Side::A)
        .bind(finish.winner == Side::B)
        .bind(finish.elo_variation_team_a)
        .bind(finish.elo_variation_team_b)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(GameError::consistency(format!(
                "Match {} is already finished",
                finish.match_id
            )));
        }

        // Increment in place so concurrent finishes touching the same player never lose an update
        let players_updated = sqlx::query(
            r#"
            UPDATE players p
            SET rating = p.rating + CASE WHEN r.side = 'A' THEN $2 ELSE $3 END
            FROM match_rosters r
            WHERE r.match_id = $1 AND r.player_id = p.id
            "#,
        )
        .bind(finish.match_id)
        .bind(finish.elo_variation_team_a)
        .bind(finish.elo_variation_team_b)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Match {} finished, {} player ratings updated",
            finish.match_id,
            players_updated.rows_affected()
        );
        Ok(finish)
    }

    #[tracing::instrument(
        name = "Append shot",
        skip(self, new),
        fields(match_id = %new.match_id, side = %new.side)
    )]
    async fn append_shot(&self, new: &NewShot) -> Result<Shot, GameError> {
        let mut tx = self.pool.begin().await?;

        // Locking the match row serializes sequence assignment per match
        let game_match = fetch_match(&mut *tx, new.match_id, true)
            .await?
            .ok_or_else(|| GameError::not_found(format!("Match {} not found", new.match_id)))?;
        check_shot_against_match(&game_match, new)?;

        let existing = fetch_shots(
            &mut *tx,
            &ShotFilter {
                match_id: Some(new.match_id),
                player_id: None,
            },
        )
        .await?;
        let sequence = ShotLedger::new(existing).prepare_append(new)?;

        let sql = format!(
            r#"
            INSERT INTO shots (id, match_id, player_id, side, hit, cup, bounce_cup, sequence, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING {}
            "#,
            SHOT_COLUMNS
        );
        let row = sqlx::query_as::<_, ShotRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.match_id)
            .bind(new.player_id)
            .bind(new.side)
            .bind(new.effect.is_hit())
            .bind(new.effect.cup())
            .bind(new.effect.bounce_cup())
            .bind(sequence)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    #[tracing::instrument(name = "Remove shot", skip(self), fields(match_id = %match_id))]
    async fn remove_shot(&self, match_id: Uuid, side: Side, sequence: i32) -> Result<Shot, GameError> {
        let mut tx = self.pool.begin().await?;

        let game_match = fetch_match(&mut *tx, match_id, true)
            .await?
            .ok_or_else(|| GameError::not_found(format!("Match {} not found", match_id)))?;
        if game_match.is_finished() {
            tx.rollback().await?;
            return Err(GameError::consistency(format!(
                "Match {} is finished, its shots are final",
                match_id
            )));
        }

        let sql = format!(
            "DELETE FROM shots WHERE match_id = $1 AND side = $2 AND sequence = $3 RETURNING {}",
            SHOT_COLUMNS
        );
        let removed = sqlx::query_as::<_, ShotRow>(&sql)
            .bind(match_id)
            .bind(side)
            .bind(sequence)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = removed else {
            tx.rollback().await?;
            return Err(GameError::not_found(format!(
                "No shot {} for team {} in match {}",
                sequence, side, match_id
            )));
        };
        tx.commit().await?;
        Ok(row.into())
    }

    async fn list_shots(&self, filter: &ShotFilter) -> Result<Vec<Shot>, GameError> {
        let mut conn = self.pool.acquire().await?;
        Ok(fetch_shots(&mut *conn, filter).await?)
    }

    #[tracing::instrument(
        name = "Apply backfill",
        skip(self, match_deltas, ratings),
        fields(matches = match_deltas.len(), players = ratings.len())
    )]
    async fn apply_backfill(
        &self,
        match_deltas: &[MatchDelta],
        ratings: &BTreeMap<Uuid, i32>,
    ) -> Result<(), GameError> {
        let mut tx = self.pool.begin().await?;

        for delta in match_deltas {
            let updated = sqlx::query(
                r#"
                UPDATE matches
                SET elo_variation_team_a = $2, elo_variation_team_b = $3
                WHERE id = $1
                "#,
            )
            .bind(delta.match_id)
            .bind(delta.elo_variation_team_a)
            .bind(delta.elo_variation_team_b)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(GameError::not_found(format!("Match {} not found", delta.match_id)));
            }
        }

        let player_ids: Vec<Uuid> = ratings.keys().copied().collect();
        let values: Vec<i32> = ratings.values().copied().collect();
        sqlx::query(
            r#"
            UPDATE players
            SET rating = v.rating
            FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, rating)
            WHERE players.id = v.id
            "#,
        )
        .bind(&player_ids)
        .bind(&values)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    #[tracing::instrument(name = "Delete ongoing matches", skip(self))]
    async fn delete_ongoing_matches(&self) -> Result<CleanupReport, GameError> {
        let mut tx = self.pool.begin().await?;

        let match_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM matches WHERE status = 'ONGOING' ORDER BY created_at FOR UPDATE",
        )
        .fetch_all(&mut *tx)
        .await?;

        if match_ids.is_empty() {
            tx.rollback().await?;
            return Ok(CleanupReport::default());
        }

        let shots = sqlx::query("DELETE FROM shots WHERE match_id = ANY($1)")
            .bind(&match_ids)
            .execute(&mut *tx)
            .await?;
        let roster_links = sqlx::query("DELETE FROM match_rosters WHERE match_id = ANY($1)")
            .bind(&match_ids)
            .execute(&mut *tx)
            .await?;
        let matches = sqlx::query("DELETE FROM matches WHERE id = ANY($1)")
            .bind(&match_ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CleanupReport {
            matches_deleted: matches.rows_affected(),
            shots_deleted: shots.rows_affected(),
            roster_links_deleted: roster_links.rows_affected(),
            match_ids,
        })
    }
}
