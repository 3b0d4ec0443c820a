use clap::Subcommand;
use wakescroll_core::WakeScroll;

#[derive(Subcommand)]
pub enum BreatheAction {
    /// Record a finished session
    Log {
        /// Breathing pattern name
        #[arg(long, default_value = "box")]
        pattern: String,
        /// Number of breaths
        #[arg(long)]
        breaths: u32,
        /// Session length in seconds
        #[arg(long, default_value = "0")]
        seconds: u32,
    },
    /// Today's sessions
    Today,
    /// All stored sessions
    List,
    /// Delete a session
    Delete {
        /// Event ID
        id: String,
    },
}

pub fn run(action: BreatheAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = WakeScroll::open()?;

    match action {
        BreatheAction::Log {
            pattern,
            breaths,
            seconds,
        } => {
            let logged = app.log_breathing(&pattern, breaths, seconds)?;
            println!("{}", serde_json::to_string_pretty(&logged)?);
        }
        BreatheAction::Today => {
            let sessions = app.breathing().todays_sessions();
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        BreatheAction::List => {
            println!("{}", serde_json::to_string_pretty(&app.breathing().sessions())?);
        }
        BreatheAction::Delete { id } => {
            if !app.breathing().delete(&id) {
                return Err(format!("session not found: {id}").into());
            }
            println!("deleted: {id}");
        }
    }
    Ok(())
}
