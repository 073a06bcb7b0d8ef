use chrono::NaiveDateTime;
use sqlx::PgPool;

use crate::dto::event::CreateEventRequest;
use crate::error::{Result, StorageError};
use crate::models::Event;

const EVENT_COLUMNS: &str =
    "event_id, name, venue, latitude, longitude, start_at, end_at, created_at";

fn overlap_violation(e: sqlx::Error) -> StorageError {
    let err = StorageError::from(e);
    if err.is_exclusion_violation() {
        return StorageError::ExclusionViolation("Event dates overlap another event".to_string());
    }
    err
}

/// Repository for Event database operations
pub struct EventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepository<'a> {
    /// Create a new EventRepository
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all events, most recent first
    pub async fn list(&self) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY start_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    /// Get an event by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE event_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(event)
    }

    /// Get the event running at `now`, if any
    pub async fn find_current(&self, now: NaiveDateTime) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events
            WHERE start_at <= $1 AND end_at >= $1
            ORDER BY start_at
            LIMIT 1
            "#
        ))
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        Ok(event)
    }

    /// Create a new event
    pub async fn create(&self, req: &CreateEventRequest) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (name, venue, latitude, longitude, start_at, end_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(&req.name)
        .bind(&req.venue)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.start_at)
        .bind(req.end_at)
        .fetch_one(self.pool)
        .await
        .map_err(overlap_violation)?;

        Ok(event)
    }

    /// Overwrite an existing event
    pub async fn update(&self, id: i32, req: &CreateEventRequest) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET
                name = $2,
                venue = $3,
                latitude = $4,
                longitude = $5,
                start_at = $6,
                end_at = $7
            WHERE event_id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.name)
        .bind(&req.venue)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.start_at)
        .bind(req.end_at)
        .fetch_optional(self.pool)
        .await
        .map_err(overlap_violation)?
        .ok_or(StorageError::NotFound)?;

        Ok(event)
    }

    /// Delete an event by ID
    pub async fn delete(&self, id: i32) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE event_id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                let err = StorageError::from(e);
                if err.is_foreign_key_violation() {
                    return StorageError::ConstraintViolation(
                        "Event still has bookings or attempts".to_string(),
                    );
                }
                err
            })?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
