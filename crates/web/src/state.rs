use std::sync::Arc;

use storage::{
    Database,
    cache::AttemptCache,
    clock::{Clock, SystemClock},
    services::{event_overlap::EventScheduler, participation::ParticipationContext},
};

/// Shared state of every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub participation: ParticipationContext,
    pub events: EventScheduler,
    pub debug: bool,
}

impl AppState {
    /// Production wiring: Postgres behind every port, wall-clock time.
    pub fn new(db: Database, cache: Arc<dyn AttemptCache>, debug: bool) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let participation = ParticipationContext::new(
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            cache,
            clock,
        );

        let events = EventScheduler::new(Arc::new(db.clone()), Arc::new(db.clone()));

        Self {
            db,
            participation,
            events,
            debug,
        }
    }
}
