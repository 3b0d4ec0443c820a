//! Application facade wiring every ledger onto one store, clock and config.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::domains::{
    prebuilt_task, BreathingLog, BreathingSession, Completion, GoalBook, GoalCompletion,
    GoalTracker, Reflection, ReflectionJournal, ReminderBook, TaskCompletion, TaskTracker,
    BREATHING_SESSIONS_KEY, GOAL_COMPLETIONS_KEY, GOAL_STREAKS_KEY, REFLECTIONS_KEY,
    REMINDER_FIRES_KEY, TASK_COMPLETIONS_KEY, TASK_STREAKS_KEY,
};
use crate::error::{CoreError, Result};
use crate::ledger::{EventEnvelope, EventStore};
use crate::notify::{NotificationScheduler, StoredNotificationQueue};
use crate::storage::{CollectionLocks, Config, KvStore, MemoryStore, SqliteStore};
use crate::streak::StreakTracker;
use crate::xp::XpLedger;

pub const XP_HISTORY_KEY: &str = "daily_xp_history";

/// A recorded activity plus the XP it earned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Awarded<T> {
    pub record: T,
    pub xp_awarded: u32,
    pub todays_xp: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySummary {
    pub date: NaiveDate,
    pub xp: u64,
    pub tasks_completed: Vec<String>,
    pub goals_completed: Vec<String>,
    pub breathing_sessions: usize,
    pub reflections: usize,
}

pub struct WakeScroll {
    config: Config,
    store: Arc<dyn KvStore>,
    locks: CollectionLocks,
    clock: Arc<dyn Clock>,
    tasks: TaskTracker,
    goals: GoalBook,
    goal_completions: GoalTracker,
    breathing: BreathingLog,
    reflections: ReflectionJournal,
    reminders: ReminderBook,
    xp: XpLedger,
}

impl WakeScroll {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, config: Config) -> Self {
        let locks = CollectionLocks::new();
        let retention = &config.retention;

        let tasks = TaskTracker::new(
            EventStore::new(
                store.clone(),
                locks.clone(),
                TASK_COMPLETIONS_KEY,
                retention.task_completions,
            ),
            StreakTracker::new(store.clone(), locks.clone(), clock.clone(), TASK_STREAKS_KEY),
            clock.clone(),
        );
        let goal_completions = GoalTracker::new(
            EventStore::new(
                store.clone(),
                locks.clone(),
                GOAL_COMPLETIONS_KEY,
                retention.goal_completions,
            ),
            StreakTracker::new(store.clone(), locks.clone(), clock.clone(), GOAL_STREAKS_KEY),
            clock.clone(),
        );
        let goals = GoalBook::new(store.clone(), locks.clone(), clock.clone());
        let breathing = BreathingLog::new(
            EventStore::new(
                store.clone(),
                locks.clone(),
                BREATHING_SESSIONS_KEY,
                retention.breathing_sessions,
            ),
            clock.clone(),
        );
        let reflections = ReflectionJournal::new(
            EventStore::new(store.clone(), locks.clone(), REFLECTIONS_KEY, retention.reflections),
            clock.clone(),
        );
        let reminders = ReminderBook::new(
            store.clone(),
            locks.clone(),
            clock.clone(),
            EventStore::new(
                store.clone(),
                locks.clone(),
                REMINDER_FIRES_KEY,
                retention.reminder_fires,
            ),
        );
        let xp = XpLedger::new(
            store.clone(),
            locks.clone(),
            clock.clone(),
            XP_HISTORY_KEY,
            retention.xp_days,
        );

        Self {
            config,
            store,
            locks,
            clock,
            tasks,
            goals,
            goal_completions,
            breathing,
            reflections,
            reminders,
            xp,
        }
    }

    /// Open the on-disk database and config under the data directory.
    pub fn open() -> Result<Self> {
        let store = SqliteStore::open()?;
        let config = Config::load_or_default();
        config.validate()?;
        Ok(Self::new(Arc::new(store), Arc::new(SystemClock), config))
    }

    /// Volatile instance with default config.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(Arc::new(MemoryStore::new()), clock, Config::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    pub fn goals(&self) -> &GoalBook {
        &self.goals
    }

    pub fn goal_completions(&self) -> &GoalTracker {
        &self.goal_completions
    }

    pub fn breathing(&self) -> &BreathingLog {
        &self.breathing
    }

    pub fn reflections(&self) -> &ReflectionJournal {
        &self.reflections
    }

    pub fn reminders(&self) -> &ReminderBook {
        &self.reminders
    }

    pub fn xp(&self) -> &XpLedger {
        &self.xp
    }

    /// Complete a task for today and award its XP.
    ///
    /// `xp` overrides the prebuilt value; unknown task ids fall back to the
    /// configured default. The XP write is separate from the completion
    /// write, so a failure there leaves the completion recorded.
    pub fn complete_task(
        &self,
        task_id: &str,
        xp: Option<u32>,
    ) -> Result<Awarded<Completion<TaskCompletion>>> {
        let xp_awarded = xp
            .or_else(|| prebuilt_task(task_id).map(|t| t.xp))
            .unwrap_or(self.config.xp.default_task_xp);
        let completion = self
            .tasks
            .complete(task_id, TaskCompletion { xp_awarded })?;
        let todays_xp = self.xp.add_xp(u64::from(xp_awarded))?;
        Ok(Awarded {
            record: completion,
            xp_awarded,
            todays_xp,
        })
    }

    /// Complete a personal goal for today and award the goal's XP.
    pub fn complete_goal(&self, goal_id: &str) -> Result<Awarded<Completion<GoalCompletion>>> {
        let goal = self.goals.get(goal_id).ok_or_else(|| CoreError::NotFound {
            kind: "goal",
            id: goal_id.to_string(),
        })?;
        let completion = self.goal_completions.complete(
            &goal.id,
            GoalCompletion {
                xp_awarded: goal.xp,
            },
        )?;
        let todays_xp = self.xp.add_xp(u64::from(goal.xp))?;
        Ok(Awarded {
            record: completion,
            xp_awarded: goal.xp,
            todays_xp,
        })
    }

    pub fn log_breathing(
        &self,
        pattern: &str,
        breath_count: u32,
        duration_secs: u32,
    ) -> Result<Awarded<EventEnvelope<BreathingSession>>> {
        let session = self
            .breathing
            .log_session(pattern, breath_count, duration_secs)?;
        self.award(session, self.config.xp.breathing_xp)
    }

    pub fn submit_reflection(
        &self,
        text: &str,
        mood: Option<u8>,
        prompt: Option<String>,
    ) -> Result<Awarded<EventEnvelope<Reflection>>> {
        let reflection = self.reflections.submit(text, mood, prompt)?;
        self.award(reflection, self.config.xp.reflection_xp)
    }

    fn award<T>(&self, record: T, xp_awarded: u32) -> Result<Awarded<T>> {
        let todays_xp = self.xp.add_xp(u64::from(xp_awarded))?;
        Ok(Awarded {
            record,
            xp_awarded,
            todays_xp,
        })
    }

    /// Notification queue persisted in this instance's store.
    pub fn notification_queue(&self) -> Arc<StoredNotificationQueue> {
        Arc::new(StoredNotificationQueue::new(
            self.store.clone(),
            self.locks.clone(),
            self.clock.clone(),
        ))
    }

    /// Nudge scheduler built from the notifications config. It is started
    /// only when notifications are enabled.
    pub fn scheduler(&self) -> Result<NotificationScheduler> {
        let config = self.config.notifications.scheduler_config()?;
        let mut scheduler =
            NotificationScheduler::new(config, self.notification_queue(), self.clock.clone());
        if self.config.notifications.enabled {
            scheduler.init();
        }
        Ok(scheduler)
    }

    pub fn today(&self) -> TodaySummary {
        TodaySummary {
            date: self.clock.today(),
            xp: self.xp.todays_xp(),
            tasks_completed: self.tasks.completed_today(),
            goals_completed: self.goal_completions.completed_today(),
            breathing_sessions: self.breathing.todays_sessions().len(),
            reflections: self.reflections.todays_reflections().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::notify::ScheduleOutcome;

    fn app() -> (Arc<FixedClock>, WakeScroll) {
        let clock = Arc::new(FixedClock::at("2024-03-04T10:00:00+01:00"));
        let app = WakeScroll::in_memory(clock.clone());
        (clock, app)
    }

    #[test]
    fn task_xp_resolution() {
        let (_, app) = app();
        assert_eq!(app.complete_task("coldShower", None).unwrap().xp_awarded, 8);
        assert_eq!(app.complete_task("custom", None).unwrap().xp_awarded, 5);
        let over = app.complete_task("makeBed", Some(20)).unwrap();
        assert_eq!(over.xp_awarded, 20);
        assert_eq!(over.todays_xp, 33);
    }

    #[test]
    fn duplicate_task_awards_nothing() {
        let (_, app) = app();
        app.complete_task("coldShower", None).unwrap();
        let err = app.complete_task("coldShower", None).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateCompletion { .. }));
        assert_eq!(app.xp().todays_xp(), 8);
    }

    #[test]
    fn goal_completion_needs_existing_goal() {
        let (_, app) = app();
        assert!(matches!(
            app.complete_goal("nope"),
            Err(CoreError::NotFound { kind: "goal", .. })
        ));
        let goal = app.goals().add("Journal", 12).unwrap();
        let done = app.complete_goal(&goal.id).unwrap();
        assert_eq!(done.xp_awarded, 12);
        assert_eq!(done.record.streak.current_streak, 1);
    }

    #[test]
    fn today_summary_rolls_over() {
        let (clock, app) = app();
        app.complete_task("coldShower", None).unwrap();
        app.log_breathing("box", 8, 64).unwrap();
        app.submit_reflection("calm", Some(4), None).unwrap();

        let today = app.today();
        assert_eq!(today.tasks_completed, vec!["coldShower".to_string()]);
        assert_eq!(today.breathing_sessions, 1);
        assert_eq!(today.reflections, 1);
        assert_eq!(today.xp, 8 + 3 + 4);

        clock.advance(chrono::Duration::days(1));
        let tomorrow = app.today();
        assert_eq!(tomorrow.xp, 0);
        assert!(tomorrow.tasks_completed.is_empty());
    }

    #[test]
    fn disabled_notifications_leave_scheduler_inactive() {
        let clock = Arc::new(FixedClock::at("2024-03-04T10:00:00+01:00"));
        let mut config = Config::default();
        config.notifications.enabled = false;
        let app = WakeScroll::new(Arc::new(MemoryStore::new()), clock, config);
        let mut scheduler = app.scheduler().unwrap();
        assert_eq!(
            scheduler.ensure_scheduled(false).outcome,
            ScheduleOutcome::Inactive
        );
    }
}
