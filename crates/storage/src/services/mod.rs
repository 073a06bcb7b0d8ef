pub mod error;
pub mod event_overlap;
pub mod participation;
