//! In-process implementations of the service collaborators.
//!
//! They keep the same contracts as the Postgres and Redis ones (including the
//! single-running-race constraint) and back the service tests and local demos.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::cache::AttemptCache;
use crate::clock::Clock;
use crate::dto::event::CreateEventRequest;
use crate::error::{Result, StorageError};
use crate::models::{
    Attempt, AttemptChanges, Booking, Event, NewAttempt, Obstacle, ObstacleTrail, Team, Test,
};
use crate::services::event_overlap::{EventWriter, overlaps};
use crate::services::participation::{AttemptKey, AttemptStore, EventDirectory};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct DirectoryData {
    events: Vec<Event>,
    teams: HashMap<i32, Team>,
    tests: HashMap<i32, Test>,
    obstacles: HashMap<i32, Obstacle>,
    // (event_id, test_id)
    event_tests: HashSet<(i32, i32)>,
    // (test_id, obstacle_id)
    test_obstacles: HashSet<(i32, i32)>,
    bookings: Vec<Booking>,
}

#[derive(Default)]
pub struct MemoryDirectory {
    data: Mutex<DirectoryData>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_event(&self, event: Event) {
        lock(&self.data).events.push(event);
    }

    pub fn add_team(&self, team: Team) {
        lock(&self.data).teams.insert(team.team_id, team);
    }

    /// Stores a test and links it to the given events.
    pub fn add_test(&self, test: Test, event_ids: &[i32]) {
        let mut data = lock(&self.data);
        for event_id in event_ids {
            data.event_tests.insert((*event_id, test.test_id));
        }
        data.tests.insert(test.test_id, test);
    }

    /// Stores an obstacle and links it to the given race tests.
    pub fn add_obstacle(&self, obstacle: Obstacle, test_ids: &[i32]) {
        let mut data = lock(&self.data);
        for test_id in test_ids {
            data.test_obstacles.insert((*test_id, obstacle.obstacle_id));
        }
        data.obstacles.insert(obstacle.obstacle_id, obstacle);
    }

    pub fn add_booking(&self, booking: Booking) {
        lock(&self.data).bookings.push(booking);
    }
}

#[async_trait]
impl EventDirectory for MemoryDirectory {
    async fn current_event(&self, now: NaiveDateTime) -> Result<Option<Event>> {
        let data = lock(&self.data);
        Ok(data
            .events
            .iter()
            .filter(|e| e.is_running_at(now))
            .min_by_key(|e| e.start_at)
            .cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        Ok(lock(&self.data).events.clone())
    }

    async fn find_team(&self, team_id: i32) -> Result<Option<Team>> {
        Ok(lock(&self.data).teams.get(&team_id).cloned())
    }

    async fn find_test(&self, test_id: i32) -> Result<Option<Test>> {
        Ok(lock(&self.data).tests.get(&test_id).cloned())
    }

    async fn find_obstacle(&self, obstacle_id: i32) -> Result<Option<Obstacle>> {
        Ok(lock(&self.data).obstacles.get(&obstacle_id).cloned())
    }

    async fn test_belongs_to_event(&self, test_id: i32, event_id: i32) -> Result<bool> {
        Ok(lock(&self.data).event_tests.contains(&(event_id, test_id)))
    }

    async fn obstacle_belongs_to_test(&self, obstacle_id: i32, test_id: i32) -> Result<bool> {
        Ok(lock(&self.data)
            .test_obstacles
            .contains(&(test_id, obstacle_id)))
    }

    async fn booking_for_team_on(
        &self,
        team_id: i32,
        event_id: i32,
        day: NaiveDate,
    ) -> Result<Option<Booking>> {
        let data = lock(&self.data);
        let mut bookings: Vec<&Booking> = data
            .bookings
            .iter()
            .filter(|b| b.team_id == team_id && b.event_id == event_id && b.day == day)
            .collect();
        bookings.sort_by_key(|b| (!b.payment_status.is_paid(), b.booking_id));
        Ok(bookings.first().map(|b| (*b).clone()))
    }

    async fn tests_for_event(&self, event_id: i32) -> Result<Vec<Test>> {
        let data = lock(&self.data);
        let mut tests: Vec<Test> = data
            .tests
            .values()
            .filter(|t| data.event_tests.contains(&(event_id, t.test_id)))
            .cloned()
            .collect();
        tests.sort_by_key(|t| t.test_id);
        Ok(tests)
    }

    async fn obstacles_for_test(&self, test_id: i32) -> Result<Vec<Obstacle>> {
        let data = lock(&self.data);
        let mut obstacles: Vec<Obstacle> = data
            .obstacles
            .values()
            .filter(|o| data.test_obstacles.contains(&(test_id, o.obstacle_id)))
            .cloned()
            .collect();
        obstacles.sort_by_key(|o| o.obstacle_id);
        Ok(obstacles)
    }
}

impl MemoryDirectory {
    fn refuse_overlap(
        events: &[Event],
        event: &CreateEventRequest,
        exclude: Option<i32>,
    ) -> Result<()> {
        if overlaps(events, event.start_at, event.end_at, exclude) {
            return Err(StorageError::ExclusionViolation(
                "Event dates overlap another event".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EventWriter for MemoryDirectory {
    async fn find_event(&self, event_id: i32) -> Result<Event> {
        lock(&self.data)
            .events
            .iter()
            .find(|e| e.event_id == event_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn insert_event(&self, event: &CreateEventRequest) -> Result<Event> {
        tokio::task::yield_now().await;
        let mut data = lock(&self.data);
        Self::refuse_overlap(&data.events, event, None)?;

        let event_id = data.events.iter().map(|e| e.event_id).max().unwrap_or(0) + 1;
        let created = Event {
            event_id,
            name: event.name.clone(),
            venue: event.venue.clone(),
            latitude: event.latitude,
            longitude: event.longitude,
            start_at: event.start_at,
            end_at: event.end_at,
            created_at: Local::now().naive_local(),
        };
        data.events.push(created.clone());
        Ok(created)
    }

    async fn update_event(&self, event_id: i32, event: &CreateEventRequest) -> Result<Event> {
        let mut data = lock(&self.data);
        let index = data
            .events
            .iter()
            .position(|e| e.event_id == event_id)
            .ok_or(StorageError::NotFound)?;
        Self::refuse_overlap(&data.events, event, Some(event_id))?;

        let stored = &mut data.events[index];
        stored.name = event.name.clone();
        stored.venue = event.venue.clone();
        stored.latitude = event.latitude;
        stored.longitude = event.longitude;
        stored.start_at = event.start_at;
        stored.end_at = event.end_at;
        Ok(stored.clone())
    }
}

#[derive(Default)]
pub struct MemoryAttemptStore {
    attempts: Mutex<Vec<Attempt>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn all(&self) -> Vec<Attempt> {
        lock(&self.attempts).clone()
    }

    fn key_of(attempt: &Attempt) -> AttemptKey {
        AttemptKey {
            team_id: attempt.team_id,
            event_id: attempt.event_id,
            test_id: attempt.test_id,
            day: attempt.created_at.date(),
        }
    }

    fn matches(attempt: &Attempt, key: &AttemptKey) -> bool {
        attempt.team_id == key.team_id
            && attempt.event_id == key.event_id
            && attempt.test_id == key.test_id
            && attempt.created_at.date() == key.day
    }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn count_completed(&self, key: &AttemptKey) -> Result<i64> {
        // Suspend like a database round-trip would, so concurrent callers interleave.
        tokio::task::yield_now().await;
        let attempts = lock(&self.attempts);
        let count = attempts
            .iter()
            .filter(|a| Self::matches(a, key) && !a.is_in_progress())
            .count();
        Ok(count as i64)
    }

    async fn find_in_progress(&self, key: &AttemptKey) -> Result<Option<Attempt>> {
        tokio::task::yield_now().await;
        let attempts = lock(&self.attempts);
        Ok(attempts
            .iter()
            .find(|a| Self::matches(a, key) && a.is_in_progress())
            .cloned())
    }

    async fn insert(&self, attempt: NewAttempt) -> Result<Attempt> {
        let mut attempts = lock(&self.attempts);
        let created = Attempt {
            attempt_id: Uuid::new_v4(),
            event_id: attempt.event_id,
            team_id: attempt.team_id,
            test_id: attempt.test_id,
            result: attempt.result,
            in_progress: attempt.in_progress,
            obstacle_trail: attempt.obstacle_trail,
            created_at: attempt.created_at,
        };

        if created.is_in_progress() {
            let key = Self::key_of(&created);
            if attempts
                .iter()
                .any(|a| Self::matches(a, &key) && a.is_in_progress())
            {
                return Err(StorageError::ConstraintViolation(
                    "A race is already in progress".to_string(),
                ));
            }
        }

        attempts.push(created.clone());
        Ok(created)
    }

    async fn record_trail(&self, attempt_id: Uuid, trail: &ObstacleTrail) -> Result<Attempt> {
        let mut attempts = lock(&self.attempts);
        let attempt = attempts
            .iter_mut()
            .find(|a| a.attempt_id == attempt_id && a.in_progress)
            .ok_or(StorageError::NotFound)?;
        attempt.obstacle_trail = trail.clone();
        Ok(attempt.clone())
    }

    async fn finish_race(&self, attempt_id: Uuid, result: Decimal) -> Result<Attempt> {
        let mut attempts = lock(&self.attempts);
        let attempt = attempts
            .iter_mut()
            .find(|a| a.attempt_id == attempt_id && a.in_progress)
            .ok_or(StorageError::NotFound)?;
        attempt.result = result;
        attempt.in_progress = false;
        Ok(attempt.clone())
    }

    async fn find_by_id(&self, attempt_id: Uuid) -> Result<Attempt> {
        lock(&self.attempts)
            .iter()
            .find(|a| a.attempt_id == attempt_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_for_event(&self, event_id: i32) -> Result<Vec<Attempt>> {
        let mut attempts: Vec<Attempt> = lock(&self.attempts)
            .iter()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.created_at);
        Ok(attempts)
    }

    async fn update(&self, attempt_id: Uuid, changes: &AttemptChanges) -> Result<Attempt> {
        let mut attempts = lock(&self.attempts);
        let index = attempts
            .iter()
            .position(|a| a.attempt_id == attempt_id)
            .ok_or(StorageError::NotFound)?;

        let mut updated = attempts[index].clone();
        changes.apply_to(&mut updated);

        if updated.in_progress {
            let key = Self::key_of(&updated);
            if attempts
                .iter()
                .any(|a| a.attempt_id != attempt_id && a.in_progress && Self::matches(a, &key))
            {
                return Err(StorageError::ConstraintViolation(
                    "A race is already in progress".to_string(),
                ));
            }
        }

        attempts[index] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, attempt_id: Uuid) -> Result<Attempt> {
        let mut attempts = lock(&self.attempts);
        let index = attempts
            .iter()
            .position(|a| a.attempt_id == attempt_id)
            .ok_or(StorageError::NotFound)?;
        Ok(attempts.remove(index))
    }
}

/// Cache held in process memory; expiry is not modelled.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.entries).contains_key(key)
    }
}

#[async_trait]
impl AttemptCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl_secs: u64) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut entries = lock(&self.entries);
        let current = entries
            .get(key)
            .map(|v| v.parse::<i64>())
            .transpose()
            .map_err(|_| {
                redis::RedisError::from((redis::ErrorKind::TypeError, "value is not an integer"))
            })?
            .unwrap_or(0);
        entries.insert(key.to_string(), (current + 1).to_string());
        Ok(current + 1)
    }
}

/// A clock that only moves when told to.
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *lock(&self.now) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock(&self.now);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *lock(&self.now)
    }
}

/// Record builders for tests and demos.
pub mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::models::{Booking, Event, Obstacle, PaymentStatus, Team, Test, TestKind};

    pub fn instant(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, minute, 0).unwrap_or_default()
    }

    pub fn event(event_id: i32, start_at: NaiveDateTime, end_at: NaiveDateTime) -> Event {
        Event {
            event_id,
            name: format!("Event {event_id}"),
            venue: "Riverside Park".to_string(),
            latitude: None,
            longitude: None,
            start_at,
            end_at,
            created_at: start_at,
        }
    }

    pub fn team(team_id: i32) -> Team {
        Team {
            team_id,
            name: format!("Team {team_id}"),
            owner_id: None,
            created_at: NaiveDateTime::default(),
        }
    }

    pub fn test(test_id: i32, kind: TestKind) -> Test {
        Test {
            test_id,
            name: format!("Test {test_id}"),
            kind,
            info: None,
            created_at: NaiveDateTime::default(),
        }
    }

    pub fn obstacle(obstacle_id: i32) -> Obstacle {
        Obstacle {
            obstacle_id,
            name: format!("Obstacle {obstacle_id}"),
            points: 10,
        }
    }

    pub fn booking(
        booking_id: i32,
        team_id: i32,
        event_id: i32,
        day: NaiveDate,
        payment_status: PaymentStatus,
        max_attempts: i32,
    ) -> Booking {
        Booking {
            booking_id,
            team_id,
            event_id,
            ticket_type_id: 1,
            day,
            payment_status,
            max_attempts,
        }
    }
}
