use rust_decimal::Decimal;

use crate::models::TrailEntry;
use crate::services::error::{ServiceError, ServiceResult};

/// Obstacle code received from the monitor app, decoded from its wire form
/// (`-1` start, `-2` finish, positive obstacle id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleCode {
    Start,
    Finish,
    Obstacle(i32),
}

impl ObstacleCode {
    pub const START: i32 = -1;
    pub const FINISH: i32 = -2;

    pub fn from_wire(code: i32) -> ServiceResult<Self> {
        match code {
            Self::START => Ok(Self::Start),
            Self::FINISH => Ok(Self::Finish),
            id if id > 0 => Ok(Self::Obstacle(id)),
            _ => Err(ServiceError::InvalidObstacle),
        }
    }

    pub fn to_wire(self) -> i32 {
        match self {
            Self::Start => Self::START,
            Self::Finish => Self::FINISH,
            Self::Obstacle(id) => id,
        }
    }
}

/// A fully specified move in the race protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceStep {
    Start,
    Finish,
    ObstacleAttempt { obstacle_id: i32, passed: bool },
}

impl RaceStep {
    pub fn code(self) -> ObstacleCode {
        match self {
            Self::Start => ObstacleCode::Start,
            Self::Finish => ObstacleCode::Finish,
            Self::ObstacleAttempt { obstacle_id, .. } => ObstacleCode::Obstacle(obstacle_id),
        }
    }

    pub fn trail_entry(self) -> Option<TrailEntry> {
        match self {
            Self::ObstacleAttempt {
                obstacle_id,
                passed,
            } => Some(TrailEntry {
                obstacle_id,
                passed,
            }),
            _ => None,
        }
    }
}

/// Obstacle outcomes are reported as 1 (passed) or 0 (failed).
pub fn obstacle_outcome(score: Decimal) -> ServiceResult<bool> {
    if score == Decimal::ONE {
        Ok(true)
    } else if score.is_zero() {
        Ok(false)
    } else {
        Err(ServiceError::InvalidObstacleScore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        assert_eq!(ObstacleCode::from_wire(-1).unwrap(), ObstacleCode::Start);
        assert_eq!(ObstacleCode::from_wire(-2).unwrap(), ObstacleCode::Finish);
        assert_eq!(ObstacleCode::from_wire(7).unwrap(), ObstacleCode::Obstacle(7));
        assert_eq!(ObstacleCode::Obstacle(7).to_wire(), 7);
        assert_eq!(ObstacleCode::Finish.to_wire(), -2);
    }

    #[test]
    fn test_other_codes_are_invalid() {
        for code in [0, -3, -100] {
            assert!(matches!(
                ObstacleCode::from_wire(code),
                Err(ServiceError::InvalidObstacle)
            ));
        }
    }

    #[test]
    fn test_obstacle_outcome() {
        assert!(obstacle_outcome(Decimal::ONE).unwrap());
        assert!(!obstacle_outcome(Decimal::ZERO).unwrap());
        assert!(obstacle_outcome(Decimal::TWO).is_err());
        assert!(obstacle_outcome(Decimal::new(5, 1)).is_err());
    }

    #[test]
    fn test_failed_obstacle_becomes_negative_trail_entry() {
        let step = RaceStep::ObstacleAttempt {
            obstacle_id: 2,
            passed: false,
        };
        assert_eq!(step.trail_entry().unwrap().code(), -2);
        assert_eq!(step.code(), ObstacleCode::Obstacle(2));
        assert!(RaceStep::Finish.trail_entry().is_none());
    }
}
