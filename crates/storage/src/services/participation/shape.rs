use rust_decimal::Decimal;

use crate::models::Test;
use crate::services::error::{ServiceError, ServiceResult};

use super::code::{ObstacleCode, RaceStep, obstacle_outcome};
use super::ports::EventDirectory;

/// Whether the request only asks if an attempt is allowed, or records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Check,
    Register,
}

impl Mode {
    fn needs_score(self) -> bool {
        matches!(self, Mode::Register)
    }
}

/// What a well-formed request intends to do with the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Race test. Checks may omit the code, and an obstacle outcome is only
    /// known when a score came with it.
    Race {
        code: Option<ObstacleCode>,
        passed: Option<bool>,
    },
    Scored { score: Option<Decimal> },
}

impl Intent {
    /// The race move to apply, when the request carries a complete one.
    pub fn race_step(self) -> Option<RaceStep> {
        match self {
            Intent::Race { code: Some(code), passed } => match code {
                ObstacleCode::Start => Some(RaceStep::Start),
                ObstacleCode::Finish => Some(RaceStep::Finish),
                ObstacleCode::Obstacle(obstacle_id) => passed.map(|passed| {
                    RaceStep::ObstacleAttempt {
                        obstacle_id,
                        passed,
                    }
                }),
            },
            _ => None,
        }
    }
}

/// Checks that obstacle code and score fit the kind of `test`.
///
/// Only obstacle lookups touch persisted state; bookings and attempts are
/// left to the eligibility evaluation.
pub async fn validate_shape(
    directory: &dyn EventDirectory,
    test: &Test,
    obstacle: Option<i32>,
    score: Option<Decimal>,
    mode: Mode,
) -> ServiceResult<Intent> {
    if !test.is_race() {
        if obstacle.is_some() {
            return Err(ServiceError::InvalidFields);
        }
        if mode.needs_score() && score.is_none() {
            return Err(ServiceError::MissingScoreParam);
        }
        return Ok(Intent::Scored { score });
    }

    let Some(raw) = obstacle else {
        if mode.needs_score() {
            return Err(ServiceError::ObstacleIdExpectedForRace);
        }
        return Ok(Intent::Race {
            code: None,
            passed: None,
        });
    };

    let code = ObstacleCode::from_wire(raw)?;
    let passed = match code {
        ObstacleCode::Start | ObstacleCode::Finish => {
            if score.is_some() {
                return Err(ServiceError::InvalidFields);
            }
            None
        }
        ObstacleCode::Obstacle(obstacle_id) => {
            directory
                .find_obstacle(obstacle_id)
                .await?
                .ok_or(ServiceError::ObstacleNotFound)?;

            if !directory
                .obstacle_belongs_to_test(obstacle_id, test.test_id)
                .await?
            {
                return Err(ServiceError::ObstacleNotInTest);
            }

            match score {
                Some(score) => Some(obstacle_outcome(score)?),
                None if mode.needs_score() => return Err(ServiceError::InvalidObstacleScore),
                None => None,
            }
        }
    };

    Ok(Intent::Race {
        code: Some(code),
        passed,
    })
}
