//! Rolling-window nudge scheduler.
//!
//! Keeps a buffer of one-shot nudges scheduled ahead of time on the
//! platform's notification service. The window is topped up once fewer than
//! half of its slots are still pending:
//!
//! ```text
//!   Empty ──ensure──▶ Populated ──nudges fire──▶ Depleting (pending < window / 2)
//!     │                  ▲                           │
//!     │                  └───────────ensure──────────┘
//!     └──ensure, some slots failed──▶ Repopulating ──ensure──▶ Populated
//! ```
//!
//! While the local time is inside the sleep window nothing new is scheduled.
//! Nudges already scheduled to land inside the sleep window are left alone.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{
    ContentPicker, NotificationContent, NotificationRequest, NotificationService,
    ScheduledNotification, SleepWindow, Trigger,
};
use crate::clock::Clock;
use crate::domains::CustomReminder;

/// Scheduler settings, fixed for the lifetime of one scheduler instance
/// except for the interval, which [`NotificationScheduler::reschedule`]
/// replaces.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Number of pending nudges a full window holds.
    pub window_size: usize,
    /// Identifier prefix tagging everything this scheduler owns.
    pub id_prefix: String,
    pub sleep_window: Option<SleepWindow>,
    /// How many recent categories new content avoids.
    pub recent_category_memory: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::minutes(45),
            window_size: 12,
            id_prefix: "wakescroll-nudge".into(),
            sleep_window: NaiveTime::from_hms_opt(22, 0, 0)
                .zip(NaiveTime::from_hms_opt(7, 0, 0))
                .map(|(start, end)| SleepWindow::new(start, end)),
            recent_category_memory: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    /// No pending nudges.
    Empty,
    /// At least half the window is pending.
    Populated,
    /// Some nudges pending, fewer than half the window.
    Depleting,
    /// The last top-up could not schedule every slot; the next pass retries.
    Repopulating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleOutcome {
    /// The scheduler has not been initialized or was shut down.
    Inactive,
    /// Enough nudges are pending; nothing changed.
    AlreadyScheduled,
    /// Local time is inside the sleep window; nothing new was scheduled.
    Suppressed,
    /// The window was (re)filled.
    Populated,
    /// The notification service could not list its schedule.
    ServiceUnavailable,
}

/// What one scheduling pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub outcome: ScheduleOutcome,
    pub pending_before: usize,
    pub cancelled: usize,
    pub scheduled: usize,
    pub failed: usize,
    pub pending_after: usize,
}

impl ScheduleReport {
    fn unchanged(outcome: ScheduleOutcome, pending: usize) -> Self {
        Self {
            outcome,
            pending_before: pending,
            cancelled: 0,
            scheduled: 0,
            failed: 0,
            pending_after: pending,
        }
    }
}

pub struct NotificationScheduler {
    config: SchedulerConfig,
    service: Arc<dyn NotificationService>,
    clock: Arc<dyn Clock>,
    picker: ContentPicker,
    state: WindowState,
    active: bool,
}

impl NotificationScheduler {
    pub fn new(
        config: SchedulerConfig,
        service: Arc<dyn NotificationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let picker = ContentPicker::new(config.recent_category_memory);
        Self {
            config,
            service,
            clock,
            picker,
            state: WindowState::Empty,
            active: false,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Start accepting scheduling passes. Returns the observed window state.
    pub fn init(&mut self) -> WindowState {
        self.active = true;
        self.state = self.observe();
        tracing::info!(
            state = ?self.state,
            prefix = %self.config.id_prefix,
            "nudge scheduler started"
        );
        self.state
    }

    /// Stop accepting scheduling passes. Already scheduled nudges stay with
    /// the platform.
    pub fn shutdown(&mut self) {
        self.active = false;
        tracing::info!(prefix = %self.config.id_prefix, "nudge scheduler stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// State as of the last pass or observation.
    pub fn state(&self) -> WindowState {
        self.state
    }

    fn nudge_tag(&self) -> String {
        format!("{}:nudge:", self.config.id_prefix)
    }

    fn reminder_tag(&self, reminder_id: &str) -> String {
        format!("{}:reminder:{}:", self.config.id_prefix, reminder_id)
    }

    fn tagged_pending(
        &self,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<ScheduledNotification>, crate::error::SchedulingError> {
        let tag = self.nudge_tag();
        let mut pending: Vec<ScheduledNotification> = self
            .service
            .list_scheduled()?
            .into_iter()
            .filter(|n| n.identifier.starts_with(&tag))
            .filter(|n| n.fire_time().is_some_and(|at| at > now))
            .collect();
        pending.sort_by_key(|n| n.fire_time());
        Ok(pending)
    }

    /// Pending nudges owned by this scheduler, earliest first.
    pub fn pending(&self) -> Vec<ScheduledNotification> {
        self.tagged_pending(self.clock.now()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to list scheduled nudges");
            Vec::new()
        })
    }

    fn classify(&self, pending: usize) -> WindowState {
        if pending == 0 {
            WindowState::Empty
        } else if pending * 2 < self.config.window_size {
            WindowState::Depleting
        } else {
            WindowState::Populated
        }
    }

    /// Window state derived from what is pending right now.
    pub fn observe(&self) -> WindowState {
        self.classify(self.pending().len())
    }

    /// True if local `now` falls inside the configured sleep window.
    pub fn is_sleep_time(&self, now: DateTime<FixedOffset>) -> bool {
        self.config
            .sleep_window
            .is_some_and(|window| window.contains(now.time()))
    }

    /// Top up the window if it runs low.
    ///
    /// Without `force` this is a no-op while at least half the window is
    /// pending, so restarting the process does not reset the spacing of
    /// nudges already on the platform. With `force` every pending nudge is
    /// cancelled first and the window is rebuilt from now.
    pub fn ensure_scheduled(&mut self, force: bool) -> ScheduleReport {
        if !self.active {
            return ScheduleReport::unchanged(ScheduleOutcome::Inactive, 0);
        }

        let now = self.clock.now();
        let mut pending = match self.tagged_pending(now) {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!(error = %e, "cannot list scheduled nudges, skipping pass");
                return ScheduleReport::unchanged(ScheduleOutcome::ServiceUnavailable, 0);
            }
        };
        let pending_before = pending.len();
        let mut report = ScheduleReport::unchanged(ScheduleOutcome::Populated, pending_before);

        if force {
            // Nudges the platform refused to cancel stay in the window.
            pending.retain(|notification| match self.service.cancel(&notification.identifier) {
                Ok(()) => {
                    report.cancelled += 1;
                    false
                }
                Err(e) => {
                    tracing::warn!(
                        id = %notification.identifier,
                        error = %e,
                        "failed to cancel nudge"
                    );
                    true
                }
            });
        } else if self.classify(pending.len()) == WindowState::Populated {
            self.state = WindowState::Populated;
            report.outcome = ScheduleOutcome::AlreadyScheduled;
            return report;
        }

        if self.is_sleep_time(now) {
            self.state = self.classify(pending.len());
            report.outcome = ScheduleOutcome::Suppressed;
            report.pending_after = pending.len();
            tracing::info!(time = %now.time(), "inside sleep window, not scheduling nudges");
            return report;
        }

        let needed = self.config.window_size.saturating_sub(pending.len());
        let anchor = pending
            .last()
            .and_then(ScheduledNotification::fire_time)
            .filter(|last| *last > now)
            .unwrap_or(now);

        for slot in 1..=needed {
            let Some(fire_at) = i32::try_from(slot)
                .ok()
                .and_then(|n| self.config.interval.checked_mul(n))
                .and_then(|offset| anchor.checked_add_signed(offset))
            else {
                // Later slots lie even further out.
                let skipped = needed - slot + 1;
                report.failed += skipped;
                tracing::warn!(slot, skipped, "nudge fire time out of range");
                break;
            };
            let content = self.picker.pick(&mut rand::thread_rng());
            let request = NotificationRequest {
                identifier: format!("{}{}-{}", self.nudge_tag(), fire_at.timestamp_millis(), slot),
                content,
                trigger: Trigger::At { at: fire_at },
            };
            match self.service.schedule(request) {
                Ok(_) => report.scheduled += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(at = %fire_at, error = %e, "failed to schedule nudge");
                }
            }
        }

        report.pending_after = pending.len() + report.scheduled;
        self.state = if report.failed > 0 {
            WindowState::Repopulating
        } else {
            self.classify(report.pending_after)
        };
        tracing::info!(
            scheduled = report.scheduled,
            failed = report.failed,
            cancelled = report.cancelled,
            pending = report.pending_after,
            "nudge window populated"
        );
        report
    }

    /// Replace the interval and rebuild the window from now.
    pub fn reschedule(&mut self, interval: Duration) -> ScheduleReport {
        self.config.interval = interval;
        self.ensure_scheduled(true)
    }

    /// Cancel every pending nudge this scheduler owns. Returns how many were
    /// cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let tag = self.nudge_tag();
        let cancelled = self.cancel_matching(&tag);
        self.state = self.observe();
        cancelled
    }

    fn cancel_matching(&self, tag: &str) -> usize {
        let scheduled = match self.service.list_scheduled() {
            Ok(scheduled) => scheduled,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list scheduled notifications");
                return 0;
            }
        };
        scheduled
            .iter()
            .filter(|n| n.identifier.starts_with(tag))
            .filter(|n| match self.service.cancel(&n.identifier) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(id = %n.identifier, error = %e, "failed to cancel notification");
                    false
                }
            })
            .count()
    }

    /// Schedule weekly triggers for a custom reminder, one per weekday.
    /// Existing triggers for the reminder are replaced. Disabled reminders
    /// only have their triggers removed. Returns how many were scheduled.
    pub fn schedule_reminder(&self, reminder: &CustomReminder) -> usize {
        let tag = self.reminder_tag(&reminder.id);
        self.cancel_matching(&tag);
        if !reminder.enabled {
            return 0;
        }

        let mut scheduled = 0;
        for weekday in &reminder.weekdays {
            let request = NotificationRequest {
                identifier: format!("{tag}{weekday}"),
                content: NotificationContent {
                    title: reminder.title.clone(),
                    body: reminder.body.clone(),
                    sound: true,
                    category: None,
                },
                trigger: Trigger::Weekly {
                    weekday: *weekday,
                    hour: reminder.time.hour(),
                    minute: reminder.time.minute(),
                },
            };
            match self.service.schedule(request) {
                Ok(_) => scheduled += 1,
                Err(e) => tracing::warn!(
                    reminder = %reminder.id,
                    %weekday,
                    error = %e,
                    "failed to schedule reminder"
                ),
            }
        }
        scheduled
    }

    /// Remove every trigger of a custom reminder.
    pub fn cancel_reminder(&self, reminder_id: &str) -> usize {
        self.cancel_matching(&self.reminder_tag(reminder_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::SchedulingError;
    use crate::notify::StoredNotificationQueue;
    use crate::storage::{CollectionLocks, MemoryStore};
    use chrono::Weekday;

    fn setup(
        at: &str,
        config: SchedulerConfig,
    ) -> (Arc<FixedClock>, Arc<StoredNotificationQueue>, NotificationScheduler) {
        let clock = Arc::new(FixedClock::at(at));
        let queue = Arc::new(StoredNotificationQueue::new(
            Arc::new(MemoryStore::new()),
            CollectionLocks::new(),
            clock.clone(),
        ));
        let mut scheduler = NotificationScheduler::new(config, queue.clone(), clock.clone());
        scheduler.init();
        (clock, queue, scheduler)
    }

    fn daytime_config(interval_minutes: i64) -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::minutes(interval_minutes),
            ..SchedulerConfig::default()
        }
    }

    #[test]
    fn test_inactive_until_init() {
        let clock = Arc::new(FixedClock::at("2024-03-04T08:00:00+00:00"));
        let queue = Arc::new(StoredNotificationQueue::new(
            Arc::new(MemoryStore::new()),
            CollectionLocks::new(),
            clock.clone(),
        ));
        let mut scheduler = NotificationScheduler::new(SchedulerConfig::default(), queue, clock);
        assert_eq!(scheduler.ensure_scheduled(false).outcome, ScheduleOutcome::Inactive);
        scheduler.init();
        assert_eq!(scheduler.ensure_scheduled(false).outcome, ScheduleOutcome::Populated);
        scheduler.shutdown();
        assert_eq!(scheduler.ensure_scheduled(true).outcome, ScheduleOutcome::Inactive);
    }

    #[test]
    fn test_populates_full_window_spaced_by_interval() {
        let (clock, _, mut scheduler) = setup("2024-03-04T08:00:00+00:00", daytime_config(45));
        let report = scheduler.ensure_scheduled(false);
        assert_eq!(report.scheduled, 12);
        assert_eq!(scheduler.state(), WindowState::Populated);

        let pending = scheduler.pending();
        assert_eq!(pending.len(), 12);
        let first = pending[0].fire_time().unwrap();
        assert_eq!(first, clock.now() + Duration::minutes(45));
        for pair in pending.windows(2) {
            let gap = pair[1].fire_time().unwrap() - pair[0].fire_time().unwrap();
            assert_eq!(gap, Duration::minutes(45));
        }
    }

    #[test]
    fn test_non_forced_call_is_idempotent() {
        let (_, _, mut scheduler) = setup("2024-03-04T08:00:00+00:00", daytime_config(45));
        scheduler.ensure_scheduled(false);
        let before: Vec<String> = scheduler.pending().into_iter().map(|n| n.identifier).collect();

        let report = scheduler.ensure_scheduled(false);
        assert_eq!(report.outcome, ScheduleOutcome::AlreadyScheduled);
        let after: Vec<String> = scheduler.pending().into_iter().map(|n| n.identifier).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_tops_up_when_below_half() {
        let (clock, _, mut scheduler) = setup("2024-03-04T08:00:00+00:00", daytime_config(30));
        scheduler.ensure_scheduled(false);

        // Six of twelve fired: exactly half pending, still populated
        clock.advance(Duration::minutes(6 * 30 + 5));
        assert_eq!(scheduler.observe(), WindowState::Populated);
        assert_eq!(scheduler.ensure_scheduled(false).outcome, ScheduleOutcome::AlreadyScheduled);

        // Seventh fires: five pending, depleting
        clock.advance(Duration::minutes(30));
        assert_eq!(scheduler.pending().len(), 5);
        assert_eq!(scheduler.observe(), WindowState::Depleting);

        let report = scheduler.ensure_scheduled(false);
        assert_eq!(report.pending_before, 5);
        assert_eq!(report.scheduled, 7);
        let pending = scheduler.pending();
        assert_eq!(pending.len(), 12);

        // New nudges continue after the last old one
        for pair in pending.windows(2) {
            let gap = pair[1].fire_time().unwrap() - pair[0].fire_time().unwrap();
            assert_eq!(gap, Duration::minutes(30));
        }
    }

    #[test]
    fn test_force_reschedule_replaces_window() {
        let (clock, _, mut scheduler) = setup("2024-03-04T08:00:00+00:00", daytime_config(45));
        scheduler.ensure_scheduled(false);
        clock.advance(Duration::minutes(10));

        let report = scheduler.reschedule(Duration::minutes(20));
        assert_eq!(report.cancelled, 12);
        assert_eq!(report.scheduled, 12);
        let pending = scheduler.pending();
        assert_eq!(pending.len(), 12);
        assert_eq!(pending[0].fire_time().unwrap(), clock.now() + Duration::minutes(20));
    }

    #[test]
    fn test_sleep_window_suppresses_new_but_keeps_existing() {
        let (clock, _, mut scheduler) = setup("2024-03-04T20:00:00+00:00", daytime_config(45));
        scheduler.ensure_scheduled(false);
        // Some of these land after 22:00; they are not purged
        assert_eq!(scheduler.pending().len(), 12);

        clock.advance(Duration::hours(8)); // 04:00, inside 22:00-07:00
        let pending_now = scheduler.pending().len();
        assert_eq!(pending_now, 2);
        assert!(pending_now * 2 < 12);
        let report = scheduler.ensure_scheduled(false);
        assert_eq!(report.outcome, ScheduleOutcome::Suppressed);
        assert_eq!(report.scheduled, 0);
        assert_eq!(scheduler.pending().len(), pending_now);
    }

    #[test]
    fn test_empty_sleep_config_never_suppresses() {
        let config = SchedulerConfig {
            sleep_window: None,
            ..SchedulerConfig::default()
        };
        let (_, _, mut scheduler) = setup("2024-03-04T03:00:00+00:00", config);
        assert_eq!(scheduler.ensure_scheduled(false).scheduled, 12);
    }

    #[test]
    fn test_sleep_window_uses_local_time() {
        // 23:30 local at +09:00 is 14:30 UTC
        let (_, _, mut scheduler) = setup("2024-03-04T23:30:00+09:00", SchedulerConfig::default());
        assert_eq!(scheduler.ensure_scheduled(false).outcome, ScheduleOutcome::Suppressed);
    }

    #[test]
    fn test_cancel_all_leaves_reminders() {
        let (_, queue, mut scheduler) = setup("2024-03-04T08:00:00+00:00", daytime_config(45));
        scheduler.ensure_scheduled(false);
        let reminder = CustomReminder {
            id: "r1".into(),
            title: "Journal".into(),
            body: "Write three lines".into(),
            weekdays: vec![Weekday::Mon, Weekday::Thu],
            time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            enabled: true,
            created_at: "2024-03-04T08:00:00+00:00".parse().unwrap(),
        };
        assert_eq!(scheduler.schedule_reminder(&reminder), 2);

        assert_eq!(scheduler.cancel_all(), 12);
        assert_eq!(scheduler.state(), WindowState::Empty);
        assert_eq!(queue.list_scheduled().unwrap().len(), 2);

        // Rescheduling a reminder replaces rather than duplicates
        assert_eq!(scheduler.schedule_reminder(&reminder), 2);
        assert_eq!(queue.list_scheduled().unwrap().len(), 2);
        assert_eq!(scheduler.cancel_reminder("r1"), 2);
        assert!(queue.list_scheduled().unwrap().is_empty());
    }

    struct BrokenService;

    impl NotificationService for BrokenService {
        fn schedule(&self, _request: NotificationRequest) -> Result<String, SchedulingError> {
            Err(SchedulingError::Rejected("permission denied".into()))
        }
        fn cancel(&self, identifier: &str) -> Result<(), SchedulingError> {
            Err(SchedulingError::UnknownNotification(identifier.into()))
        }
        fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, SchedulingError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_delivery_failures_are_counted_not_fatal() {
        let clock = Arc::new(FixedClock::at("2024-03-04T08:00:00+00:00"));
        let mut scheduler =
            NotificationScheduler::new(daytime_config(45), Arc::new(BrokenService), clock);
        scheduler.init();
        let report = scheduler.ensure_scheduled(false);
        assert_eq!(report.scheduled, 0);
        assert_eq!(report.failed, 12);
        assert_eq!(report.pending_after, 0);
        assert_eq!(scheduler.state(), WindowState::Repopulating);
    }

    /// Schedules and lists normally but never lets go of a notification.
    struct NoCancelService(StoredNotificationQueue);

    impl NotificationService for NoCancelService {
        fn schedule(&self, request: NotificationRequest) -> Result<String, SchedulingError> {
            self.0.schedule(request)
        }
        fn cancel(&self, identifier: &str) -> Result<(), SchedulingError> {
            Err(SchedulingError::Rejected(format!("cannot cancel {identifier}")))
        }
        fn list_scheduled(&self) -> Result<Vec<ScheduledNotification>, SchedulingError> {
            self.0.list_scheduled()
        }
    }

    #[test]
    fn test_forced_pass_keeps_uncancelled_nudges() {
        let clock = Arc::new(FixedClock::at("2024-03-04T08:00:00+00:00"));
        let queue = StoredNotificationQueue::new(
            Arc::new(MemoryStore::new()),
            CollectionLocks::new(),
            clock.clone(),
        );
        let mut scheduler = NotificationScheduler::new(
            daytime_config(45),
            Arc::new(NoCancelService(queue)),
            clock,
        );
        scheduler.init();
        assert_eq!(scheduler.ensure_scheduled(false).scheduled, 12);

        let report = scheduler.reschedule(Duration::minutes(30));
        assert_eq!(report.cancelled, 0);
        assert_eq!(report.scheduled, 0);
        assert_eq!(report.pending_after, 12);
        assert_eq!(scheduler.pending().len(), 12);
    }

    #[test]
    fn test_out_of_range_fire_times_are_counted_not_fatal() {
        let config = SchedulerConfig {
            interval: Duration::minutes(4_000_000_000),
            window_size: 1000,
            sleep_window: None,
            ..SchedulerConfig::default()
        };
        let (_, _, mut scheduler) = setup("2024-03-04T08:00:00+00:00", config);

        let report = scheduler.ensure_scheduled(false);
        assert!(report.failed > 0);
        assert_eq!(report.scheduled + report.failed, 1000);
        assert_eq!(report.pending_after, report.scheduled);
        assert_eq!(scheduler.state(), WindowState::Repopulating);
    }
}
