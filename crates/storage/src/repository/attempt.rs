use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Attempt, AttemptChanges, NewAttempt, ObstacleTrail};

const ATTEMPT_COLUMNS: &str =
    "attempt_id, event_id, team_id, test_id, result, in_progress, obstacle_trail, created_at";

/// Repository for attempt ("participación") records
pub struct AttemptRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AttemptRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Attempt> {
        let attempt = sqlx::query_as::<_, Attempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE attempt_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(attempt)
    }

    /// All attempts of an event, oldest first
    pub async fn list_for_event(&self, event_id: i32) -> Result<Vec<Attempt>> {
        let attempts = sqlx::query_as::<_, Attempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE event_id = $1 ORDER BY created_at"
        ))
        .bind(event_id)
        .fetch_all(self.pool)
        .await?;

        Ok(attempts)
    }

    /// Number of attempts on `day` that are not a running race
    pub async fn count_completed(
        &self,
        team_id: i32,
        event_id: i32,
        test_id: i32,
        day: NaiveDate,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM attempts
            WHERE team_id = $1 AND event_id = $2 AND test_id = $3
              AND attempt_day = $4
              AND NOT in_progress
            "#,
        )
        .bind(team_id)
        .bind(event_id)
        .bind(test_id)
        .bind(day)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// The running race record for `day`, if any
    pub async fn find_in_progress(
        &self,
        team_id: i32,
        event_id: i32,
        test_id: i32,
        day: NaiveDate,
    ) -> Result<Option<Attempt>> {
        let attempt = sqlx::query_as::<_, Attempt>(&format!(
            r#"
            SELECT {ATTEMPT_COLUMNS}
            FROM attempts
            WHERE team_id = $1 AND event_id = $2 AND test_id = $3
              AND attempt_day = $4
              AND in_progress
            LIMIT 1
            "#
        ))
        .bind(team_id)
        .bind(event_id)
        .bind(test_id)
        .bind(day)
        .fetch_optional(self.pool)
        .await?;

        Ok(attempt)
    }

    pub async fn insert(&self, attempt: &NewAttempt) -> Result<Attempt> {
        let created = sqlx::query_as::<_, Attempt>(&format!(
            r#"
            INSERT INTO attempts
                (attempt_id, event_id, team_id, test_id, result, in_progress, obstacle_trail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(attempt.event_id)
        .bind(attempt.team_id)
        .bind(attempt.test_id)
        .bind(attempt.result)
        .bind(attempt.in_progress)
        .bind(Json(&attempt.obstacle_trail))
        .bind(attempt.created_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            // Only the single-running-race index is unique besides the key
            if err.is_unique_violation() {
                return StorageError::ConstraintViolation(
                    "A race is already in progress".to_string(),
                );
            }
            err
        })?;

        Ok(created)
    }

    /// Replace the trail of a running race
    pub async fn record_trail(&self, id: Uuid, trail: &ObstacleTrail) -> Result<Attempt> {
        let updated = sqlx::query_as::<_, Attempt>(&format!(
            r#"
            UPDATE attempts
            SET obstacle_trail = $2
            WHERE attempt_id = $1 AND in_progress
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Json(trail))
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(updated)
    }

    /// Close a running race with its final result
    pub async fn finish_race(&self, id: Uuid, result: Decimal) -> Result<Attempt> {
        let finished = sqlx::query_as::<_, Attempt>(&format!(
            r#"
            UPDATE attempts
            SET result = $2, in_progress = FALSE
            WHERE attempt_id = $1 AND in_progress
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(result)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(finished)
    }

    /// Apply a correction; a new result closes a running race
    pub async fn update(&self, id: Uuid, changes: &AttemptChanges) -> Result<Attempt> {
        let updated = sqlx::query_as::<_, Attempt>(&format!(
            r#"
            UPDATE attempts
            SET
                event_id = COALESCE($2, event_id),
                team_id = COALESCE($3, team_id),
                test_id = COALESCE($4, test_id),
                result = COALESCE($5, result),
                in_progress = in_progress AND $5::numeric IS NULL,
                obstacle_trail = COALESCE($6, obstacle_trail)
            WHERE attempt_id = $1
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.event_id)
        .bind(changes.team_id)
        .bind(changes.test_id)
        .bind(changes.result)
        .bind(changes.obstacle_trail.as_ref().map(Json))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_foreign_key_violation() {
                return StorageError::ConstraintViolation(
                    "Unknown event, team or test".to_string(),
                );
            }
            if err.is_unique_violation() {
                return StorageError::ConstraintViolation(
                    "A race is already in progress".to_string(),
                );
            }
            err
        })?
        .ok_or(StorageError::NotFound)?;

        Ok(updated)
    }

    /// Delete an attempt, returning the removed row
    pub async fn delete(&self, id: Uuid) -> Result<Attempt> {
        let deleted = sqlx::query_as::<_, Attempt>(&format!(
            "DELETE FROM attempts WHERE attempt_id = $1 RETURNING {ATTEMPT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(deleted)
    }
}
