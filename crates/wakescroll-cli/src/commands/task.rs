//! Prebuilt task commands for CLI.

use clap::Subcommand;
use serde::Serialize;
use wakescroll_core::domains::PREBUILT_TASKS;
use wakescroll_core::{StreakState, WakeScroll};

#[derive(Subcommand)]
pub enum TaskAction {
    /// List prebuilt tasks with today's status
    List,
    /// Mark a task completed today
    Complete {
        /// Task ID (e.g. "coldShower")
        id: String,
        /// XP to award instead of the task's default
        #[arg(long)]
        xp: Option<u32>,
    },
    /// Show a task's streak
    Streak {
        /// Task ID
        id: String,
    },
    /// Reset a task's streak
    Reset {
        /// Task ID
        id: String,
    },
    /// Completion history
    History {
        /// Only completions of this task
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete one completion event
    Delete {
        /// Event ID
        event_id: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskStatus {
    id: &'static str,
    title: &'static str,
    xp: u32,
    completed_today: bool,
    current_streak: u32,
    highest_streak: u32,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = WakeScroll::open()?;
    let tasks = app.tasks();

    match action {
        TaskAction::List => {
            let today = app.clock().today();
            let statuses: Vec<TaskStatus> = PREBUILT_TASKS
                .iter()
                .map(|t| {
                    let streak = tasks.streak(t.id);
                    TaskStatus {
                        id: t.id,
                        title: t.title,
                        xp: t.xp,
                        completed_today: tasks.is_completed_today(t.id),
                        current_streak: streak.current_as_of(today),
                        highest_streak: streak.highest_streak,
                    }
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&statuses)?);
        }
        TaskAction::Complete { id, xp } => {
            let done = app.complete_task(&id, xp)?;
            println!("{}", serde_json::to_string_pretty(&done)?);
        }
        TaskAction::Streak { id } => {
            let streak: StreakState = tasks.streak(&id);
            println!("{}", serde_json::to_string_pretty(&streak)?);
        }
        TaskAction::Reset { id } => {
            if tasks.reset_streak(&id)? {
                println!("streak reset: {id}");
            } else {
                println!("no streak for: {id}");
            }
        }
        TaskAction::History { id } => {
            let events = tasks.completions(id.as_deref());
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        TaskAction::Delete { event_id } => {
            if !tasks.delete_completion(&event_id) {
                return Err(format!("completion not found: {event_id}").into());
            }
            println!("deleted: {event_id}");
        }
    }
    Ok(())
}
