//! Postgres-backed collaborators, delegating to the repositories.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::Database;
use crate::dto::event::CreateEventRequest;
use crate::error::Result;
use crate::models::{
    Attempt, AttemptChanges, Booking, Event, NewAttempt, Obstacle, ObstacleTrail, Team, Test,
};
use crate::repository::{
    attempt::AttemptRepository, booking::BookingRepository, event::EventRepository,
    obstacle::ObstacleRepository, team::TeamRepository, test::TestRepository,
};
use crate::services::event_overlap::EventWriter;

use super::ports::{AttemptKey, AttemptStore, EventDirectory};

#[async_trait]
impl EventWriter for Database {
    async fn find_event(&self, event_id: i32) -> Result<Event> {
        EventRepository::new(self.pool()).find_by_id(event_id).await
    }

    async fn insert_event(&self, event: &CreateEventRequest) -> Result<Event> {
        EventRepository::new(self.pool()).create(event).await
    }

    async fn update_event(&self, event_id: i32, event: &CreateEventRequest) -> Result<Event> {
        EventRepository::new(self.pool()).update(event_id, event).await
    }
}

#[async_trait]
impl EventDirectory for Database {
    async fn current_event(&self, now: NaiveDateTime) -> Result<Option<Event>> {
        EventRepository::new(self.pool()).find_current(now).await
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        EventRepository::new(self.pool()).list().await
    }

    async fn find_team(&self, team_id: i32) -> Result<Option<Team>> {
        TeamRepository::new(self.pool()).find_by_id(team_id).await
    }

    async fn find_test(&self, test_id: i32) -> Result<Option<Test>> {
        TestRepository::new(self.pool()).find_by_id(test_id).await
    }

    async fn find_obstacle(&self, obstacle_id: i32) -> Result<Option<Obstacle>> {
        ObstacleRepository::new(self.pool())
            .find_by_id(obstacle_id)
            .await
    }

    async fn test_belongs_to_event(&self, test_id: i32, event_id: i32) -> Result<bool> {
        TestRepository::new(self.pool())
            .belongs_to_event(test_id, event_id)
            .await
    }

    async fn obstacle_belongs_to_test(&self, obstacle_id: i32, test_id: i32) -> Result<bool> {
        ObstacleRepository::new(self.pool())
            .belongs_to_test(obstacle_id, test_id)
            .await
    }

    async fn booking_for_team_on(
        &self,
        team_id: i32,
        event_id: i32,
        day: NaiveDate,
    ) -> Result<Option<Booking>> {
        BookingRepository::new(self.pool())
            .find_for_team_on(team_id, event_id, day)
            .await
    }

    async fn tests_for_event(&self, event_id: i32) -> Result<Vec<Test>> {
        TestRepository::new(self.pool()).list_for_event(event_id).await
    }

    async fn obstacles_for_test(&self, test_id: i32) -> Result<Vec<Obstacle>> {
        ObstacleRepository::new(self.pool())
            .list_for_test(test_id)
            .await
    }
}

#[async_trait]
impl AttemptStore for Database {
    async fn count_completed(&self, key: &AttemptKey) -> Result<i64> {
        AttemptRepository::new(self.pool())
            .count_completed(key.team_id, key.event_id, key.test_id, key.day)
            .await
    }

    async fn find_in_progress(&self, key: &AttemptKey) -> Result<Option<Attempt>> {
        AttemptRepository::new(self.pool())
            .find_in_progress(key.team_id, key.event_id, key.test_id, key.day)
            .await
    }

    async fn insert(&self, attempt: NewAttempt) -> Result<Attempt> {
        AttemptRepository::new(self.pool()).insert(&attempt).await
    }

    async fn record_trail(&self, attempt_id: Uuid, trail: &ObstacleTrail) -> Result<Attempt> {
        AttemptRepository::new(self.pool())
            .record_trail(attempt_id, trail)
            .await
    }

    async fn finish_race(&self, attempt_id: Uuid, result: Decimal) -> Result<Attempt> {
        AttemptRepository::new(self.pool())
            .finish_race(attempt_id, result)
            .await
    }

    async fn find_by_id(&self, attempt_id: Uuid) -> Result<Attempt> {
        AttemptRepository::new(self.pool())
            .find_by_id(attempt_id)
            .await
    }

    async fn list_for_event(&self, event_id: i32) -> Result<Vec<Attempt>> {
        AttemptRepository::new(self.pool())
            .list_for_event(event_id)
            .await
    }

    async fn update(&self, attempt_id: Uuid, changes: &AttemptChanges) -> Result<Attempt> {
        AttemptRepository::new(self.pool())
            .update(attempt_id, changes)
            .await
    }

    async fn delete(&self, attempt_id: Uuid) -> Result<Attempt> {
        AttemptRepository::new(self.pool()).delete(attempt_id).await
    }
}
