//! Screen models rendered by the client: home (list or chart), day detail
//! and settings.
//!
//! Builders here only reshape the core summaries into display form: local
//! dates and times, tier colours, and navigation links.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use step_counter_core::Sample;
use step_counter_core::aggregation::{
    AccentTier, AggregationError, DaySummary, DisplayRow, WeekSummary, accent_tier,
};
use step_counter_core::calendar::Calendar;
use step_counter_core::fetch::FetchState;
use step_counter_core::goal::Goal;

use crate::state::LoadStatus;

pub const COLOR_AT_OR_ABOVE: &str = "#82D14A";
pub const COLOR_BELOW: &str = "#FF9400";
pub const COLOR_NO_DATA: &str = "#C7C7CC";

pub fn tier_color(tier: AccentTier) -> &'static str {
    match tier {
        AccentTier::AtOrAbove => COLOR_AT_OR_ABOVE,
        AccentTier::Below => COLOR_BELOW,
        AccentTier::NoData => COLOR_NO_DATA,
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Chart,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TodayCard {
    pub count: u64,
    pub date: Option<NaiveDate>,
    pub tier: AccentTier,
    pub color: &'static str,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ListRow {
    pub date: NaiveDate,
    pub count: u64,
    pub label: String,
    pub placeholder: bool,
    pub tier: AccentTier,
    pub color: &'static str,
    /// Detail screen path; only rows with steps link anywhere.
    pub detail_path: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChartBar {
    pub date: NaiveDate,
    pub count: u64,
    pub tier: AccentTier,
    pub color: &'static str,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChartView {
    pub bars: Vec<ChartBar>,
    /// Height of the horizontal goal reference line.
    pub goal_line: u64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct HomeScreen {
    pub status: LoadStatus,
    pub today: TodayCard,
    pub goal: u64,
    pub progress: f64,
    pub mode: ViewMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<ListRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartView>,
}

pub fn home_screen(
    state: &FetchState<Vec<Sample>>,
    goal: Goal,
    calendar: &Calendar,
    now: DateTime<Utc>,
    mode: ViewMode,
) -> Result<HomeScreen, AggregationError> {
    let summary = WeekSummary::derive(state.samples(), goal.get(), now)?;
    let today = TodayCard {
        count: summary.today.count,
        date: summary.today.timestamp.map(|t| calendar.local_date(t)),
        tier: summary.today_tier,
        color: tier_color(summary.today_tier),
    };

    let (list, chart) = match mode {
        ViewMode::List => (Some(list_rows(&summary, calendar)), None),
        ViewMode::Chart => (None, Some(chart_view(&summary, calendar))),
    };

    Ok(HomeScreen {
        status: state.into(),
        today,
        goal: summary.goal,
        progress: summary.progress,
        mode,
        list,
        chart,
    })
}

fn row_tier(row: &DisplayRow, goal: u64) -> AccentTier {
    if row.is_placeholder() {
        AccentTier::NoData
    } else {
        accent_tier(row.count(), goal)
    }
}

fn list_rows(summary: &WeekSummary, calendar: &Calendar) -> Vec<ListRow> {
    summary
        .rows
        .iter()
        .map(|row| {
            let date = calendar.local_date(row.timestamp());
            let tier = row_tier(row, summary.goal);
            let placeholder = !row.is_navigable();
            ListRow {
                date,
                count: row.count(),
                label: if placeholder {
                    "No data".to_string()
                } else {
                    format!("{} steps", row.count())
                },
                placeholder,
                tier,
                color: tier_color(tier),
                detail_path: (!placeholder).then(|| format!("/days/{date}")),
            }
        })
        .collect()
}

fn chart_view(summary: &WeekSummary, calendar: &Calendar) -> ChartView {
    let bars = summary
        .rows
        .iter()
        .map(|row| {
            let tier = row_tier(row, summary.goal);
            ChartBar {
                date: calendar.local_date(row.timestamp()),
                count: row.count(),
                tier,
                color: tier_color(tier),
            }
        })
        .collect();
    ChartView {
        bars,
        goal_line: summary.goal,
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PeakHour {
    pub count: u64,
    pub start: DateTime<Utc>,
    pub local_time: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct HourBar {
    pub start: DateTime<Utc>,
    pub local_time: String,
    pub count: u64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct HourListRow {
    pub local_time: String,
    pub count: u64,
    pub bar_fraction: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DetailScreen {
    pub status: LoadStatus,
    pub date: NaiveDate,
    pub total: u64,
    pub tier: AccentTier,
    pub color: &'static str,
    pub peak: Option<PeakHour>,
    pub bars: Vec<HourBar>,
    pub rows: Vec<HourListRow>,
}

fn local_time(calendar: &Calendar, instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&calendar.offset())
        .format("%H:%M")
        .to_string()
}

pub fn detail_screen(
    date: NaiveDate,
    state: &FetchState<Vec<Sample>>,
    goal: Goal,
    calendar: &Calendar,
) -> DetailScreen {
    let day = DaySummary::derive(date, state.samples(), goal.get());
    DetailScreen {
        status: state.into(),
        date: day.date,
        total: day.total,
        tier: day.total_tier,
        color: tier_color(day.total_tier),
        peak: day.peak.map(|p| PeakHour {
            count: p.count,
            start: p.timestamp,
            local_time: local_time(calendar, p.timestamp),
        }),
        bars: day
            .bars
            .iter()
            .map(|s| HourBar {
                start: s.timestamp,
                local_time: local_time(calendar, s.timestamp),
                count: s.count,
            })
            .collect(),
        rows: day
            .rows
            .iter()
            .map(|r| HourListRow {
                local_time: local_time(calendar, r.sample.timestamp),
                count: r.sample.count,
                bar_fraction: r.bar_fraction,
            })
            .collect(),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SettingsScreen {
    pub goal: u64,
}

/// Body of the "Save Goal" action: the text as typed.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GoalInput {
    pub goal: String,
}
