//! Per-domain managers built on the event ledger, streaks and XP.

mod breathing;
mod completion;
mod goals;
mod reflections;
mod reminders;
mod tasks;

pub use breathing::{BreathingLog, BreathingSession, BREATHING_SESSIONS_KEY};
pub use completion::{Completion, CompletionTracker};
pub use goals::{
    GoalBook, GoalCompletion, GoalTracker, PersonalGoal, GOALS_KEY, GOAL_COMPLETIONS_KEY,
    GOAL_STREAKS_KEY,
};
pub use reflections::{Reflection, ReflectionJournal, REFLECTIONS_KEY};
pub use reminders::{CustomReminder, ReminderBook, ReminderFire, REMINDERS_KEY, REMINDER_FIRES_KEY};
pub use tasks::{
    prebuilt_task, PrebuiltTask, TaskCompletion, TaskTracker, PREBUILT_TASKS,
    TASK_COMPLETIONS_KEY, TASK_STREAKS_KEY,
};
