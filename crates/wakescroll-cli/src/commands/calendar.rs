//! Calendar views over any ledger.

use chrono::{Datelike, NaiveDate};
use clap::{Args, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wakescroll_core::calendar::week_start_for;
use wakescroll_core::{CalendarAggregator, WakeScroll};

#[derive(Clone, Copy, ValueEnum)]
pub enum Ledger {
    Tasks,
    Goals,
    Breathing,
    Reflections,
}

#[derive(Args)]
pub struct Target {
    /// Ledger to aggregate
    ledger: Ledger,
    /// Only events of this task or goal
    #[arg(long)]
    entity: Option<String>,
}

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Events grouped by day of month
    Month {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Seven days starting on the Sunday on or before `date`
    Week {
        #[command(flatten)]
        target: Target,
        /// Any date in the week (YYYY-MM-DD), default today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Monthly statistics
    Stats {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
    /// Per-day counts for a whole year
    Heatmap {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        year: Option<i32>,
    },
}

impl CalendarAction {
    fn target(&self) -> &Target {
        match self {
            Self::Month { target, .. }
            | Self::Week { target, .. }
            | Self::Stats { target, .. }
            | Self::Heatmap { target, .. } => target,
        }
    }
}

fn render<P>(
    calendar: CalendarAggregator<'_, P>,
    action: &CalendarAction,
    today: NaiveDate,
) -> Result<String, Box<dyn std::error::Error>>
where
    P: Serialize + DeserializeOwned + Clone,
{
    let entity = action.target().entity.as_deref();
    let json = match action {
        CalendarAction::Month { year, month, .. } => {
            let view = calendar.month_view(
                entity,
                year.unwrap_or(today.year()),
                month.unwrap_or(today.month()),
            )?;
            serde_json::to_string_pretty(&view)?
        }
        CalendarAction::Week { date, .. } => {
            let start = week_start_for(date.unwrap_or(today));
            serde_json::to_string_pretty(&calendar.week_view(entity, start))?
        }
        CalendarAction::Stats { year, month, .. } => {
            let stats = calendar.monthly_stats(
                entity,
                year.unwrap_or(today.year()),
                month.unwrap_or(today.month()),
            )?;
            serde_json::to_string_pretty(&stats)?
        }
        CalendarAction::Heatmap { year, .. } => {
            let days = calendar.year_heatmap(entity, year.unwrap_or(today.year()))?;
            serde_json::to_string_pretty(&days)?
        }
    };
    Ok(json)
}

pub fn run(action: CalendarAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = WakeScroll::open()?;
    let today = app.clock().today();

    let json = match action.target().ledger {
        Ledger::Tasks => render(app.tasks().calendar(), &action, today)?,
        Ledger::Goals => render(app.goal_completions().calendar(), &action, today)?,
        Ledger::Breathing => render(app.breathing().calendar(), &action, today)?,
        Ledger::Reflections => render(app.reflections().calendar(), &action, today)?,
    };
    println!("{json}");
    Ok(())
}
