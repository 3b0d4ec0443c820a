//! Personal goal commands for CLI.

use clap::Subcommand;
use wakescroll_core::WakeScroll;

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a goal
    Add {
        /// Goal title
        title: String,
        /// XP awarded per completion
        #[arg(long)]
        xp: Option<u32>,
    },
    /// List goals
    List,
    /// Remove a goal (its history is kept)
    Remove {
        /// Goal ID
        id: String,
    },
    /// Mark a goal completed today
    Complete {
        /// Goal ID
        id: String,
    },
    /// Show a goal's streak
    Streak {
        /// Goal ID
        id: String,
    },
    /// Completion history
    History {
        /// Only completions of this goal
        #[arg(long)]
        id: Option<String>,
    },
}

pub fn run(action: GoalAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = WakeScroll::open()?;

    match action {
        GoalAction::Add { title, xp } => {
            let xp = xp.unwrap_or(app.config().xp.default_goal_xp);
            let goal = app.goals().add(&title, xp)?;
            println!("{}", serde_json::to_string_pretty(&goal)?);
        }
        GoalAction::List => {
            println!("{}", serde_json::to_string_pretty(&app.goals().list())?);
        }
        GoalAction::Remove { id } => {
            if !app.goals().remove(&id)? {
                return Err(format!("goal not found: {id}").into());
            }
            println!("removed: {id}");
        }
        GoalAction::Complete { id } => {
            let done = app.complete_goal(&id)?;
            println!("{}", serde_json::to_string_pretty(&done)?);
        }
        GoalAction::Streak { id } => {
            let streak = app.goal_completions().streak(&id);
            println!("{}", serde_json::to_string_pretty(&streak)?);
        }
        GoalAction::History { id } => {
            let events = app.goal_completions().completions(id.as_deref());
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
    }
    Ok(())
}
