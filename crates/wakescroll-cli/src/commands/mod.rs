pub mod breathe;
pub mod calendar;
pub mod config;
pub mod goal;
pub mod notify;
pub mod reflect;
pub mod reminder;
pub mod task;
pub mod today;
pub mod xp;
