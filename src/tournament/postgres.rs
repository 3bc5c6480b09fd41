use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::str::FromStr;
use tracing::{debug, instrument, warn};

use super::models::{MatchModel, PredictionModel, UserModel};
use super::repository::TournamentRepository;
use crate::scoring::{KnockoutWinner, ResolutionType, Scoreline, Tiebreak};
use crate::shared::AppError;

const USER_COLUMNS: &str =
    "id, first_name, last_name, username, is_admin, registered_at, score";
const MATCH_COLUMNS: &str = "id, team1, team2, kickoff, is_knockout, locked, \
    result_home_goals, result_away_goals, result_resolution_type, result_knockout_winner";
const PREDICTION_COLUMNS: &str =
    "user_id, match_id, home_goals, away_goals, resolution_type, knockout_winner, updated_at";

/// PostgreSQL implementation of the tournament repository (see `sql/schema.sql`)
pub struct PostgresTournamentRepository {
    pool: PgPool,
}

impl PostgresTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn goals(value: i32, column: &str) -> Result<u32, AppError> {
    u32::try_from(value)
        .map_err(|_| AppError::DatabaseError(format!("{column} holds negative value {value}")))
}

fn goals_column(value: u32, column: &str) -> Result<i32, AppError> {
    i32::try_from(value)
        .map_err(|_| AppError::Validation(format!("{column} value {value} is out of range")))
}

fn decode_tiebreak(
    resolution_type: Option<String>,
    knockout_winner: Option<String>,
) -> Result<Option<Tiebreak>, AppError> {
    let (Some(resolution_type), Some(knockout_winner)) = (resolution_type, knockout_winner)
    else {
        return Ok(None);
    };

    let resolution_type = ResolutionType::from_str(&resolution_type).map_err(|_| {
        AppError::DatabaseError(format!("unknown resolution type {resolution_type}"))
    })?;
    if resolution_type == ResolutionType::FullTime {
        return Ok(None);
    }

    let knockout_winner = KnockoutWinner::from_str(&knockout_winner).map_err(|_| {
        AppError::DatabaseError(format!("unknown knockout winner {knockout_winner}"))
    })?;

    Ok(Some(Tiebreak {
        resolution_type,
        knockout_winner,
    }))
}

fn encode_tiebreak(tiebreak: Option<Tiebreak>) -> (Option<String>, Option<String>) {
    match tiebreak {
        Some(t) => (
            Some(t.resolution_type.to_string()),
            Some(t.knockout_winner.to_string()),
        ),
        None => (None, None),
    }
}

fn user_from_row(row: &PgRow) -> Result<UserModel, AppError> {
    Ok(UserModel {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        username: row.try_get("username")?,
        is_admin: row.try_get("is_admin")?,
        registered_at: row.try_get("registered_at")?,
        score: row.try_get("score")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<MatchModel, AppError> {
    let home: Option<i32> = row.try_get("result_home_goals")?;
    let away: Option<i32> = row.try_get("result_away_goals")?;

    let result = match (home, away) {
        (Some(home), Some(away)) => Some(Scoreline {
            home_goals: goals(home, "result_home_goals")?,
            away_goals: goals(away, "result_away_goals")?,
            tiebreak: decode_tiebreak(
                row.try_get("result_resolution_type")?,
                row.try_get("result_knockout_winner")?,
            )?,
        }),
        _ => None,
    };

    Ok(MatchModel {
        id: row.try_get("id")?,
        team1: row.try_get("team1")?,
        team2: row.try_get("team2")?,
        kickoff: row.try_get("kickoff")?,
        is_knockout: row.try_get("is_knockout")?,
        locked: row.try_get("locked")?,
        result,
    })
}

fn prediction_from_row(row: &PgRow) -> Result<PredictionModel, AppError> {
    Ok(PredictionModel {
        user_id: row.try_get("user_id")?,
        match_id: row.try_get("match_id")?,
        scoreline: Scoreline {
            home_goals: goals(row.try_get("home_goals")?, "home_goals")?,
            away_goals: goals(row.try_get("away_goals")?, "away_goals")?,
            tiebreak: decode_tiebreak(
                row.try_get("resolution_type")?,
                row.try_get("knockout_winner")?,
            )?,
        },
        updated_at: row.try_get("updated_at")?,
    })
}

fn query_failed(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        warn!(error = %e, "{}", context);
        AppError::from(e)
    }
}

#[async_trait]
impl TournamentRepository for PostgresTournamentRepository {
    #[instrument(skip(self))]
    async fn get_all_users(&self) -> Result<Vec<UserModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY registered_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("Failed to list users"))?;

        debug!(user_count = rows.len(), "Users fetched from database");
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("Failed to fetch user"))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn save_user(&self, user: &UserModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, username, is_admin, registered_at, score) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET first_name = EXCLUDED.first_name, \
             last_name = EXCLUDED.last_name, username = EXCLUDED.username, \
             is_admin = EXCLUDED.is_admin, score = EXCLUDED.score",
        )
        .bind(&user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(user.is_admin)
        .bind(user.registered_at)
        .bind(user.score)
        .execute(&self.pool)
        .await
        .map_err(query_failed("Failed to save user"))?;

        debug!(score = ?user.score, "User saved in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(query_failed("Failed to delete user"))?;

        debug!(rows = result.rows_affected(), "User deleted from database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_all_matches(&self) -> Result<Vec<MatchModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches ORDER BY kickoff, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("Failed to list matches"))?;

        debug!(match_count = rows.len(), "Matches fetched from database");
        rows.iter().map(match_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn get_match(&self, match_id: &str) -> Result<Option<MatchModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed("Failed to fetch match"))?;

        row.as_ref().map(match_from_row).transpose()
    }

    #[instrument(skip(self, fixture), fields(match_id = %fixture.id))]
    async fn save_match(&self, fixture: &MatchModel) -> Result<(), AppError> {
        let (resolution_type, knockout_winner) =
            encode_tiebreak(fixture.result.and_then(|r| r.tiebreak));
        let result_home_goals = fixture
            .result
            .map(|r| goals_column(r.home_goals, "result_home_goals"))
            .transpose()?;
        let result_away_goals = fixture
            .result
            .map(|r| goals_column(r.away_goals, "result_away_goals"))
            .transpose()?;

        sqlx::query(
            "INSERT INTO matches (id, team1, team2, kickoff, is_knockout, locked, \
             result_home_goals, result_away_goals, result_resolution_type, result_knockout_winner) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET team1 = EXCLUDED.team1, team2 = EXCLUDED.team2, \
             kickoff = EXCLUDED.kickoff, is_knockout = EXCLUDED.is_knockout, \
             locked = matches.locked OR EXCLUDED.locked, \
             result_home_goals = EXCLUDED.result_home_goals, \
             result_away_goals = EXCLUDED.result_away_goals, \
             result_resolution_type = EXCLUDED.result_resolution_type, \
             result_knockout_winner = EXCLUDED.result_knockout_winner",
        )
        .bind(&fixture.id)
        .bind(&fixture.team1)
        .bind(&fixture.team2)
        .bind(fixture.kickoff)
        .bind(fixture.is_knockout)
        .bind(fixture.locked)
        .bind(result_home_goals)
        .bind(result_away_goals)
        .bind(resolution_type)
        .bind(knockout_winner)
        .execute(&self.pool)
        .await
        .map_err(query_failed("Failed to save match"))?;

        debug!(locked = fixture.locked, "Match saved in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn lock_match(&self, match_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE matches SET locked = TRUE WHERE id = $1 AND NOT locked")
            .bind(match_id)
            .execute(&self.pool)
            .await
            .map_err(query_failed("Failed to lock match"))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn get_all_predictions(&self) -> Result<Vec<PredictionModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {PREDICTION_COLUMNS} FROM predictions ORDER BY user_id, match_id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("Failed to list predictions"))?;

        debug!(prediction_count = rows.len(), "Predictions fetched from database");
        rows.iter().map(prediction_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn get_user_predictions(
        &self,
        user_id: &str,
    ) -> Result<Vec<PredictionModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {PREDICTION_COLUMNS} FROM predictions WHERE user_id = $1 ORDER BY match_id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("Failed to fetch user predictions"))?;

        rows.iter().map(prediction_from_row).collect()
    }

    #[instrument(
        skip(self, prediction),
        fields(user_id = %prediction.user_id, match_id = %prediction.match_id)
    )]
    async fn save_prediction(&self, prediction: &PredictionModel) -> Result<(), AppError> {
        let (resolution_type, knockout_winner) = encode_tiebreak(prediction.scoreline.tiebreak);
        let home_goals = goals_column(prediction.scoreline.home_goals, "home_goals")?;
        let away_goals = goals_column(prediction.scoreline.away_goals, "away_goals")?;

        sqlx::query(
            "INSERT INTO predictions (user_id, match_id, home_goals, away_goals, \
             resolution_type, knockout_winner, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id, match_id) DO UPDATE SET home_goals = EXCLUDED.home_goals, \
             away_goals = EXCLUDED.away_goals, resolution_type = EXCLUDED.resolution_type, \
             knockout_winner = EXCLUDED.knockout_winner, updated_at = EXCLUDED.updated_at",
        )
        .bind(&prediction.user_id)
        .bind(&prediction.match_id)
        .bind(home_goals)
        .bind(away_goals)
        .bind(resolution_type)
        .bind(knockout_winner)
        .bind(prediction.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed("Failed to save prediction"))?;

        debug!("Prediction saved in database");
        Ok(())
    }
}
