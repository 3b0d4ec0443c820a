//! Sleep window: the local wall-clock range in which no new nudges are
//! scheduled.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Half-open `[start, end)` range of local time. When `start > end` the
/// window wraps past midnight (e.g. 22:00 - 07:00). `start == end` is an
/// empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SleepWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse `"HH:MM"` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, String> {
        Ok(Self {
            start: parse_hhmm(start)?,
            end: parse_hhmm(end)?,
        })
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        // Seconds are ignored so a boundary of 07:00 releases at 07:00:00.
        let t = time.hour() * 60 + time.minute();
        let start = self.start.hour() * 60 + self.start.minute();
        let end = self.end.hour() * 60 + self.end.minute();

        if start > end {
            // Overnight window (e.g., 22:00 - 07:00)
            return t >= start || t < end;
        }

        // Daytime window (e.g., 12:00 - 17:00)
        t >= start && t < end
    }
}

fn parse_hhmm(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| format!("expected HH:MM, got '{value}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_overnight_window() {
        let window = SleepWindow::parse("22:00", "07:00").unwrap();
        assert!(window.contains(t(23, 0)));
        assert!(window.contains(t(3, 0)));
        assert!(window.contains(t(22, 0)));
        assert!(!window.contains(t(7, 0)));
        assert!(!window.contains(t(10, 0)));
    }

    #[test]
    fn test_daytime_window() {
        let window = SleepWindow::parse("13:30", "15:00").unwrap();
        assert!(window.contains(t(14, 0)));
        assert!(!window.contains(t(13, 29)));
        assert!(!window.contains(t(15, 0)));
    }

    #[test]
    fn test_empty_window() {
        let window = SleepWindow::new(t(9, 0), t(9, 0));
        assert!(!window.contains(t(9, 0)));
        assert!(!window.contains(t(21, 0)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(SleepWindow::parse("25:00", "07:00").is_err());
        assert!(SleepWindow::parse("late", "07:00").is_err());
    }
}
