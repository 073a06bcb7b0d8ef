use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Attempt, AttemptChanges, Booking, Event, NewAttempt, Obstacle, ObstacleTrail, Team, Test,
};

/// Read access to events and everything attached to them.
#[async_trait]
pub trait EventDirectory: Send + Sync {
    /// The event whose interval contains `now`.
    async fn current_event(&self, now: NaiveDateTime) -> Result<Option<Event>>;

    async fn list_events(&self) -> Result<Vec<Event>>;

    async fn find_team(&self, team_id: i32) -> Result<Option<Team>>;

    async fn find_test(&self, test_id: i32) -> Result<Option<Test>>;

    async fn find_obstacle(&self, obstacle_id: i32) -> Result<Option<Obstacle>>;

    async fn test_belongs_to_event(&self, test_id: i32, event_id: i32) -> Result<bool>;

    async fn obstacle_belongs_to_test(&self, obstacle_id: i32, test_id: i32) -> Result<bool>;

    /// The team's booking for `day`, preferring a paid one.
    async fn booking_for_team_on(
        &self,
        team_id: i32,
        event_id: i32,
        day: NaiveDate,
    ) -> Result<Option<Booking>>;

    async fn tests_for_event(&self, event_id: i32) -> Result<Vec<Test>>;

    async fn obstacles_for_test(&self, test_id: i32) -> Result<Vec<Obstacle>>;
}

/// Identifies the attempts of one team at one test on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptKey {
    pub team_id: i32,
    pub event_id: i32,
    pub test_id: i32,
    pub day: NaiveDate,
}

/// Persistence of attempt records.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Attempts under `key` that are not flagged as a running race.
    async fn count_completed(&self, key: &AttemptKey) -> Result<i64>;

    async fn find_in_progress(&self, key: &AttemptKey) -> Result<Option<Attempt>>;

    /// Inserts a record. A second running race for the same key must be
    /// refused with a constraint violation.
    async fn insert(&self, attempt: NewAttempt) -> Result<Attempt>;

    /// Replaces the trail of a running race. `NotFound` unless it is running.
    async fn record_trail(&self, attempt_id: Uuid, trail: &ObstacleTrail) -> Result<Attempt>;

    /// Stores the final result and clears the running flag.
    async fn finish_race(&self, attempt_id: Uuid, result: Decimal) -> Result<Attempt>;

    async fn find_by_id(&self, attempt_id: Uuid) -> Result<Attempt>;

    async fn list_for_event(&self, event_id: i32) -> Result<Vec<Attempt>>;

    async fn update(&self, attempt_id: Uuid, changes: &AttemptChanges) -> Result<Attempt>;

    /// Removes a record, returning it as it was.
    async fn delete(&self, attempt_id: Uuid) -> Result<Attempt>;
}
