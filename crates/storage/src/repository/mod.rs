pub mod attempt;
pub mod booking;
pub mod event;
pub mod obstacle;
pub mod team;
pub mod test;
