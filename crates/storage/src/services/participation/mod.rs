//! Participation eligibility and race progress.
//!
//! Nothing survives between requests: every check or registration resolves
//! the current event and re-reads bookings and attempts through the
//! collaborators held by [`ParticipationContext`].

mod code;
mod eligibility;
mod locks;
pub mod pg;
mod ports;
mod race;
mod registrar;
mod shape;

use std::sync::Arc;

pub use code::{ObstacleCode, RaceStep, obstacle_outcome};
pub use eligibility::{Eligibility, EligibilityEvaluator, ParticipationRequest};
pub use locks::AttemptLocks;
pub use ports::{AttemptKey, AttemptStore, EventDirectory};
pub use race::RaceProgressTracker;
pub use registrar::ParticipationRegistrar;
pub use shape::{Intent, Mode, validate_shape};

use crate::cache::AttemptCache;
use crate::clock::Clock;

/// Collaborators shared by every participation request.
#[derive(Clone)]
pub struct ParticipationContext {
    pub directory: Arc<dyn EventDirectory>,
    pub attempts: Arc<dyn AttemptStore>,
    pub cache: Arc<dyn AttemptCache>,
    pub clock: Arc<dyn Clock>,
    pub locks: AttemptLocks,
}

impl ParticipationContext {
    pub fn new(
        directory: Arc<dyn EventDirectory>,
        attempts: Arc<dyn AttemptStore>,
        cache: Arc<dyn AttemptCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            attempts,
            cache,
            clock,
            locks: AttemptLocks::new(),
        }
    }

    pub fn registrar(&self) -> ParticipationRegistrar<'_> {
        ParticipationRegistrar::new(self)
    }
}
