use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::json;
use wakescroll_core::WakeScroll;

#[derive(Subcommand)]
pub enum XpAction {
    /// XP earned today
    Today,
    /// Per-day history, most recent first
    History,
    /// XP across the whole stored history
    Total,
    /// XP between two dates, inclusive
    Range {
        /// Start date (YYYY-MM-DD)
        from: NaiveDate,
        /// End date (YYYY-MM-DD)
        to: NaiveDate,
    },
}

pub fn run(action: XpAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = WakeScroll::open()?;
    let xp = app.xp();

    let value = match action {
        XpAction::Today => json!({ "date": app.clock().today(), "xp": xp.todays_xp() }),
        XpAction::History => serde_json::to_value(xp.history())?,
        XpAction::Total => json!({ "xp": xp.total_xp() }),
        XpAction::Range { from, to } => {
            json!({ "from": from, "to": to, "xp": xp.xp_between(from, to) })
        }
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
