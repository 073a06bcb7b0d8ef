//! App wiring for route tests: in-memory collaborators and a frozen clock.

use std::sync::Arc;

use axum_test::TestServer;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::PgPoolOptions;
use storage::{
    Database,
    memory::{FixedClock, MemoryAttemptStore, MemoryCache, MemoryDirectory, fixtures},
    models::{PaymentStatus, TestKind},
    services::{event_overlap::EventScheduler, participation::ParticipationContext},
};

use crate::routes;
use crate::state::AppState;

pub const EVENT: i32 = 1;
pub const TEAM: i32 = 7;
pub const RACE_TEST: i32 = 3;
pub const SCORED_TEST: i32 = 4;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
}

pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    fixtures::instant(today(), hour, minute)
}

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryAttemptStore>,
    pub cache: Arc<MemoryCache>,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    /// One running event with a race test (obstacles 1 and 2) and a scored
    /// test; team 7 holds a paid booking for today.
    pub fn new(max_attempts: i32) -> Self {
        let directory = Arc::new(MemoryDirectory::new());
        directory.add_event(fixtures::event(EVENT, at(8, 0), at(21, 0)));
        directory.add_team(fixtures::team(TEAM));
        directory.add_test(fixtures::test(RACE_TEST, TestKind::Race), &[EVENT]);
        directory.add_test(fixtures::test(SCORED_TEST, TestKind::Points), &[EVENT]);
        directory.add_obstacle(fixtures::obstacle(1), &[RACE_TEST]);
        directory.add_obstacle(fixtures::obstacle(2), &[RACE_TEST]);
        directory.add_booking(fixtures::booking(
            1,
            TEAM,
            EVENT,
            today(),
            PaymentStatus::PaidOnline,
            max_attempts,
        ));

        let store = Arc::new(MemoryAttemptStore::new());
        let cache = Arc::new(MemoryCache::new());
        let clock = Arc::new(FixedClock::new(at(9, 0)));

        // Never connects; routes under test only reach the in-memory ports
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();

        let state = AppState {
            db: Database::from_pool(pool),
            events: EventScheduler::new(directory.clone(), directory.clone()),
            participation: ParticipationContext::new(
                directory,
                store.clone(),
                cache.clone(),
                clock.clone(),
            ),
            debug: false,
        };

        let server = TestServer::new(routes::router(state)).unwrap();

        Self {
            server,
            store,
            cache,
            clock,
        }
    }
}
