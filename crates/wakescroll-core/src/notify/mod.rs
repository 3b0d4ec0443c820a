//! Mindfulness nudges and custom reminder delivery.
//!
//! The platform notification service is reached only through
//! [`NotificationService`]; delivery is best effort and failures are logged,
//! never propagated into the completion-tracking flow.

mod content;
mod scheduler;
mod service;
mod window;

pub use content::{ContentPicker, MessageCategory, NotificationContent};
pub use scheduler::{
    NotificationScheduler, ScheduleOutcome, ScheduleReport, SchedulerConfig, WindowState,
};
pub use service::{
    NotificationRequest, NotificationService, ScheduledNotification, StoredNotificationQueue,
    Trigger,
};
pub use window::SleepWindow;
