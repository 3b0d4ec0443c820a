//! Calendar projections of event ledgers.
//!
//! Every view is recomputed from the full event list on each call. Events
//! are bucketed by their stored local `day_key`, never by UTC date.

use chrono::{Datelike, Duration, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, ValidationError};
use crate::ledger::{EventEnvelope, EventStore};

/// Day of month (1-based) to that day's events, most recent first.
pub type MonthView<P> = BTreeMap<u32, Vec<EventEnvelope<P>>>;

/// One day of a week view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket<P> {
    pub date: NaiveDate,
    pub count: usize,
    pub events: Vec<EventEnvelope<P>>,
}

/// Summary of one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub days_with_events: usize,
    pub total_events: usize,
    /// Events per active day; 0.0 for an empty month.
    pub average_per_day: f64,
}

/// Event count for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub count: usize,
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ValidationError::InvalidMonth { year, month }.into())
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = first_of_month(year, month)?;
    let next = if month == 12 {
        first_of_month(year + 1, 1)?
    } else {
        first_of_month(year, month + 1)?
    };
    Ok((next - first).num_days() as u32)
}

/// The Sunday on or before `date`.
pub fn week_start_for(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Group the events of `year`/`month` by day of month.
///
/// `entity` restricts the view to one entity; `None` includes everything.
pub fn month_view<P: Clone>(
    events: &[EventEnvelope<P>],
    entity: Option<&str>,
    year: i32,
    month: u32,
) -> Result<MonthView<P>> {
    first_of_month(year, month)?;
    let mut view: MonthView<P> = BTreeMap::new();
    for event in events {
        if !event.matches(entity) {
            continue;
        }
        let day = event.day_key;
        if day.year() == year && day.month() == month {
            view.entry(day.day()).or_default().push(event.clone());
        }
    }
    Ok(view)
}

/// Seven consecutive days starting at `week_start`.
///
/// Callers normally pass [`week_start_for`] of some date so weeks begin on
/// Sunday; any start day is accepted.
pub fn week_view<P: Clone>(
    events: &[EventEnvelope<P>],
    entity: Option<&str>,
    week_start: NaiveDate,
) -> Vec<DayBucket<P>> {
    (0..7)
        .map(|offset| {
            let date = week_start + Duration::days(offset);
            let day_events: Vec<_> = events
                .iter()
                .filter(|e| e.day_key == date && e.matches(entity))
                .cloned()
                .collect();
            DayBucket {
                date,
                count: day_events.len(),
                events: day_events,
            }
        })
        .collect()
}

/// Reduce a month view into summary statistics.
pub fn stats_from_view<P>(view: &MonthView<P>) -> MonthlyStats {
    let days_with_events = view.values().filter(|v| !v.is_empty()).count();
    let total_events: usize = view.values().map(Vec::len).sum();
    let average_per_day = if days_with_events == 0 {
        0.0
    } else {
        total_events as f64 / days_with_events as f64
    };
    MonthlyStats {
        days_with_events,
        total_events,
        average_per_day,
    }
}

pub fn monthly_stats<P: Clone>(
    events: &[EventEnvelope<P>],
    entity: Option<&str>,
    year: i32,
    month: u32,
) -> Result<MonthlyStats> {
    Ok(stats_from_view(&month_view(events, entity, year, month)?))
}

/// Per-day counts for every day of `year`, January 1st first.
pub fn year_heatmap<P>(
    events: &[EventEnvelope<P>],
    entity: Option<&str>,
    year: i32,
) -> Result<Vec<HeatmapDay>> {
    let start = first_of_month(year, 1)?;
    let end = first_of_month(year + 1, 1)?;

    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for event in events {
        if event.day_key.year() == year && event.matches(entity) {
            *counts.entry(event.day_key).or_insert(0) += 1;
        }
    }

    Ok(start
        .iter_days()
        .take_while(|d| *d < end)
        .map(|date| HeatmapDay {
            date,
            count: counts.get(&date).copied().unwrap_or(0),
        })
        .collect())
}

/// Calendar views bound to one event store.
pub struct CalendarAggregator<'a, P> {
    store: &'a EventStore<P>,
}

impl<'a, P> CalendarAggregator<'a, P>
where
    P: Serialize + DeserializeOwned + Clone,
{
    pub fn new(store: &'a EventStore<P>) -> Self {
        Self { store }
    }

    pub fn month_view(&self, entity: Option<&str>, year: i32, month: u32) -> Result<MonthView<P>> {
        month_view(&self.store.all(), entity, year, month)
    }

    pub fn week_view(&self, entity: Option<&str>, week_start: NaiveDate) -> Vec<DayBucket<P>> {
        week_view(&self.store.all(), entity, week_start)
    }

    pub fn monthly_stats(
        &self,
        entity: Option<&str>,
        year: i32,
        month: u32,
    ) -> Result<MonthlyStats> {
        monthly_stats(&self.store.all(), entity, year, month)
    }

    pub fn year_heatmap(&self, entity: Option<&str>, year: i32) -> Result<Vec<HeatmapDay>> {
        year_heatmap(&self.store.all(), entity, year)
    }
}
