pub mod events;
pub mod monitor;
pub mod participations;
