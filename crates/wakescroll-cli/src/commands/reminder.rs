//! Custom reminder commands for CLI.
//!
//! Every change is mirrored onto the notification queue so that the
//! reminder's weekly triggers match its stored definition.

use chrono::{NaiveTime, Weekday};
use clap::Subcommand;
use wakescroll_core::WakeScroll;

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Create a reminder
    Add {
        /// Reminder title
        title: String,
        /// Notification body
        #[arg(long, default_value = "")]
        body: String,
        /// Comma-separated weekdays (e.g. "mon,wed,fri")
        #[arg(long)]
        days: String,
        /// Local time of day, HH:MM
        #[arg(long)]
        at: String,
    },
    /// List reminders
    List,
    /// Enable a reminder
    Enable {
        /// Reminder ID
        id: String,
    },
    /// Disable a reminder
    Disable {
        /// Reminder ID
        id: String,
    },
    /// Remove a reminder
    Remove {
        /// Reminder ID
        id: String,
    },
    /// Record that a reminder fired
    Fire {
        /// Reminder ID
        id: String,
    },
    /// Fire history
    Fires {
        /// Only fires of this reminder
        #[arg(long)]
        id: Option<String>,
    },
}

fn parse_days(days: &str) -> Result<Vec<Weekday>, String> {
    days.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<Weekday>().map_err(|_| format!("invalid weekday: {d}")))
        .collect()
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = WakeScroll::open()?;
    let reminders = app.reminders();

    match action {
        ReminderAction::Add {
            title,
            body,
            days,
            at,
        } => {
            let weekdays = parse_days(&days)?;
            let time = NaiveTime::parse_from_str(&at, "%H:%M")
                .map_err(|e| format!("invalid time '{at}': {e}"))?;
            let reminder = reminders.add(&title, &body, &weekdays, time)?;
            let scheduled = app.scheduler()?.schedule_reminder(&reminder);
            tracing::debug!(id = %reminder.id, scheduled, "reminder scheduled");
            println!("{}", serde_json::to_string_pretty(&reminder)?);
        }
        ReminderAction::List => {
            println!("{}", serde_json::to_string_pretty(&reminders.list())?);
        }
        ReminderAction::Enable { id } => {
            let reminder = reminders.set_enabled(&id, true)?;
            app.scheduler()?.schedule_reminder(&reminder);
            println!("{}", serde_json::to_string_pretty(&reminder)?);
        }
        ReminderAction::Disable { id } => {
            let reminder = reminders.set_enabled(&id, false)?;
            app.scheduler()?.cancel_reminder(&id);
            println!("{}", serde_json::to_string_pretty(&reminder)?);
        }
        ReminderAction::Remove { id } => {
            if !reminders.remove(&id)? {
                return Err(format!("reminder not found: {id}").into());
            }
            app.scheduler()?.cancel_reminder(&id);
            println!("removed: {id}");
        }
        ReminderAction::Fire { id } => {
            let fire = reminders.record_fire(&id)?;
            println!("{}", serde_json::to_string_pretty(&fire)?);
        }
        ReminderAction::Fires { id } => {
            let fires = reminders.fires(id.as_deref());
            println!("{}", serde_json::to_string_pretty(&fires)?);
        }
    }
    Ok(())
}
