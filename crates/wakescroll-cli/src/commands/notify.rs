use clap::Subcommand;
use serde_json::json;
use wakescroll_core::{Config, NotificationService, WakeScroll};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Top up the nudge window if it runs low
    Ensure {
        /// Cancel pending nudges and rebuild the window from now
        #[arg(long)]
        force: bool,
    },
    /// Change the interval, save it, and rebuild the window
    Reschedule {
        /// Minutes between nudges
        #[arg(long)]
        minutes: u32,
    },
    /// Window state and pending count
    Status,
    /// Pending nudges, earliest first
    Pending,
    /// Cancel every pending nudge
    Cancel,
    /// Everything in the notification queue, reminders included
    Queue,
}

pub fn run(action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = WakeScroll::open()?;
    let mut scheduler = app.scheduler()?;

    match action {
        NotifyAction::Ensure { force } => {
            let report = scheduler.ensure_scheduled(force);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        NotifyAction::Reschedule { minutes } => {
            // Later top-ups read the interval back from config.
            let mut config = Config::load()?;
            config.set("notifications.interval_minutes", &minutes.to_string())?;
            config.save()?;
            let report = scheduler.reschedule(chrono::Duration::minutes(i64::from(minutes)));
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        NotifyAction::Status => {
            let now = app.clock().now();
            let status = json!({
                "active": scheduler.is_active(),
                "state": scheduler.observe(),
                "pending": scheduler.pending().len(),
                "windowSize": scheduler.config().window_size,
                "sleeping": scheduler.is_sleep_time(now),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        NotifyAction::Pending => {
            println!("{}", serde_json::to_string_pretty(&scheduler.pending())?);
        }
        NotifyAction::Cancel => {
            let cancelled = scheduler.cancel_all();
            println!("{}", json!({ "cancelled": cancelled }));
        }
        NotifyAction::Queue => {
            let queued = app.notification_queue().list_scheduled()?;
            println!("{}", serde_json::to_string_pretty(&queued)?);
        }
    }
    Ok(())
}
