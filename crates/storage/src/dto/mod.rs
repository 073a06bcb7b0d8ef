pub mod event;
pub mod monitor;
pub mod participation;
