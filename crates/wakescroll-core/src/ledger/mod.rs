//! Event ledgers.
//!
//! Every activity type records [`EventEnvelope`]s into its own
//! [`EventStore`]. Streaks and calendar views are derived from these lists
//! on demand; nothing derived is stored alongside them.

mod event;
mod store;

pub use event::EventEnvelope;
pub use store::EventStore;
