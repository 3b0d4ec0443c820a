//! # Wake Scroll Core Library
//!
//! Local event ledger and derived metrics for a doomscrolling-reduction
//! wellness app. Every operation is available through the standalone
//! `wakescroll` CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Ledger**: append-only, capped event lists, one key per activity type
//! - **Streaks**: consecutive-day counters per task or goal
//! - **Calendar**: month/week views, monthly stats and year heat maps,
//!   recomputed from the ledger on every call
//! - **XP**: one accumulated row per local day
//! - **Notify**: rolling window of mindfulness nudges, suppressed during the
//!   sleep window, plus weekly custom reminders
//! - **Storage**: SQLite key-value table and TOML configuration
//!
//! Day bucketing always uses the device's local calendar date.
//!
//! ## Key Components
//!
//! - [`WakeScroll`]: facade wiring every ledger onto one store
//! - [`EventStore`]: generic capped event collection
//! - [`StreakTracker`]: per-entity streak state
//! - [`NotificationScheduler`]: nudge window maintenance
//! - [`Config`]: application configuration management

pub mod app;
pub mod calendar;
pub mod clock;
pub mod domains;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod storage;
pub mod streak;
pub mod xp;

pub use app::{Awarded, TodaySummary, WakeScroll, XP_HISTORY_KEY};
pub use calendar::{CalendarAggregator, DayBucket, HeatmapDay, MonthView, MonthlyStats};
pub use clock::{Clock, FixedClock, SystemClock};
pub use domains::{
    BreathingLog, BreathingSession, Completion, CustomReminder, GoalBook, PersonalGoal,
    Reflection, ReflectionJournal, ReminderBook, TaskTracker,
};
pub use error::{ConfigError, CoreError, SchedulingError, StorageError, ValidationError};
pub use ledger::{EventEnvelope, EventStore};
pub use notify::{
    NotificationScheduler, NotificationService, ScheduleOutcome, ScheduleReport, SchedulerConfig,
    SleepWindow, StoredNotificationQueue, WindowState,
};
pub use storage::{Config, KvStore, MemoryStore, SqliteStore};
pub use streak::{StreakState, StreakTracker};
pub use xp::{XpDay, XpLedger};
