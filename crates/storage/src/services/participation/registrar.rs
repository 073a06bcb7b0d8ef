use crate::cache::ParticipationsCache;
use crate::models::{Attempt, NewAttempt};
use crate::services::error::{ServiceError, ServiceResult};

use super::ParticipationContext;
use super::eligibility::{EligibilityEvaluator, ParticipationRequest};
use super::ports::AttemptKey;
use super::race::RaceProgressTracker;
use super::shape::{Intent, Mode};

/// Records attempts after re-validating them from scratch.
pub struct ParticipationRegistrar<'a> {
    ctx: &'a ParticipationContext,
}

impl<'a> ParticipationRegistrar<'a> {
    pub fn new(ctx: &'a ParticipationContext) -> Self {
        Self { ctx }
    }

    /// Answers whether `request` could be registered right now.
    pub async fn check(&self, request: &ParticipationRequest) -> ServiceResult<()> {
        let now = self.ctx.clock.now();
        self.evaluator()
            .evaluate(request, Mode::Check, now)
            .await
            .map(|_| ())
    }

    /// Validates and stores one attempt, or one step of a race.
    pub async fn register(&self, request: &ParticipationRequest) -> ServiceResult<Attempt> {
        let now = self.ctx.clock.now();
        let event = self
            .ctx
            .directory
            .current_event(now)
            .await?
            .ok_or(ServiceError::NoCurrentEvent)?;
        let event_id = event.event_id;

        let key = AttemptKey {
            team_id: request.team_id,
            event_id,
            test_id: request.test_id,
            day: now.date(),
        };
        let _guard = self.ctx.locks.acquire(key).await;

        let eligibility = self
            .evaluator()
            .evaluate_for_event(event, request, Mode::Register, now)
            .await?;

        let outcome = match eligibility.intent {
            Intent::Race { .. } => {
                let step = eligibility
                    .intent
                    .race_step()
                    .ok_or(ServiceError::ObstacleIdExpectedForRace)?;
                RaceProgressTracker::new(self.ctx.attempts.as_ref())
                    .apply_transition(&eligibility.key, step, now)
                    .await
            }
            Intent::Scored { score } => {
                let result = score.ok_or(ServiceError::MissingScoreParam)?;
                self.ctx
                    .attempts
                    .insert(NewAttempt::scored(
                        event_id,
                        eligibility.team.team_id,
                        eligibility.test.test_id,
                        result,
                        now,
                    ))
                    .await
                    .map_err(ServiceError::from)
            }
        };

        // Dropped even when the write failed: a stale list is worse than a recompute
        self.invalidate(event_id).await;

        match &outcome {
            Ok(attempt) => tracing::info!(
                team_id = attempt.team_id,
                test_id = attempt.test_id,
                event_id,
                result = %attempt.result,
                trail = ?attempt.obstacle_trail.codes(),
                "Registered participation"
            ),
            Err(ServiceError::Database(e)) => {
                tracing::error!(error = %e, event_id, "Failed to store participation")
            }
            Err(_) => {}
        }

        outcome
    }

    fn evaluator(&self) -> EligibilityEvaluator<'_> {
        EligibilityEvaluator::new(self.ctx.directory.as_ref(), self.ctx.attempts.as_ref())
    }

    async fn invalidate(&self, event_id: i32) {
        if let Err(e) = ParticipationsCache::new(self.ctx.cache.as_ref())
            .invalidate(event_id)
            .await
        {
            tracing::warn!(error = %e, event_id, "Failed to invalidate cached participations");
        }
    }
}
