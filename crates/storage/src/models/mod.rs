mod attempt;
mod booking;
mod event;
mod obstacle;
mod team;

pub use attempt::{Attempt, AttemptChanges, NewAttempt, ObstacleTrail, TrailEntry};
pub use booking::{Booking, PaymentStatus};
pub use event::Event;
pub use obstacle::Obstacle;
pub use team::Team;
pub use test::{Test, TestKind};
