//! Pure derivations over a step series and the daily goal.
//!
//! Nothing here performs I/O or keeps state; every screen recomputes these
//! values from the latest series on each render.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::Sample;

/// Rows shown by the weekly list and chart.
pub const WEEK_ROWS: usize = 7;

/// Narrowest hourly bar, as a fraction of the peak-hour bar.
pub const MIN_BAR_FRACTION: f64 = 0.01;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("daily goal must be positive")]
    ZeroGoal,
}

/// Colour band a count falls into relative to the goal.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccentTier {
    /// Placeholder rows; independent of the goal.
    NoData,
    Below,
    AtOrAbove,
}

/// One row of the weekly list.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayRow {
    Recorded(Sample),
    Placeholder { timestamp: DateTime<Utc> },
}

impl DisplayRow {
    pub fn count(&self) -> u64 {
        match self {
            DisplayRow::Recorded(s) => s.count,
            DisplayRow::Placeholder { .. } => 0,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DisplayRow::Recorded(s) => s.timestamp,
            DisplayRow::Placeholder { timestamp } => *timestamp,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, DisplayRow::Placeholder { .. })
    }

    /// Only rows with steps open the day detail.
    pub fn is_navigable(&self) -> bool {
        self.count() > 0
    }
}

/// Pad or truncate `series` to exactly `target` rows.
///
/// A series of `target` or more entries yields its first `target` entries
/// unchanged. A shorter series is followed by placeholders dated
/// `now - i days` for `i` in `len..target`. Those dates count back from
/// `now`, not from the real data, so they may repeat or skip days already
/// present in the series.
pub fn weekly_display_rows(series: &[Sample], target: usize, now: DateTime<Utc>) -> Vec<DisplayRow> {
    if series.len() >= target {
        return series[..target]
            .iter()
            .copied()
            .map(DisplayRow::Recorded)
            .collect();
    }

    let mut rows: Vec<DisplayRow> = series.iter().copied().map(DisplayRow::Recorded).collect();
    for i in series.len()..target {
        rows.push(DisplayRow::Placeholder {
            timestamp: now - Duration::days(i as i64),
        });
    }
    rows
}

/// The up-to-`WEEK_ROWS` most recent entries of an ascending daily series.
pub fn weekly_series(series: &[Sample]) -> &[Sample] {
    let start = series.len().saturating_sub(WEEK_ROWS);
    &series[start..]
}

/// Today's headline figure.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Today {
    pub count: u64,
    /// `None` when there is no data at all.
    pub timestamp: Option<DateTime<Utc>>,
}

/// The last entry of the series, or zero steps with no date.
pub fn today_value(series: &[Sample]) -> Today {
    match series.last() {
        Some(s) => Today {
            count: s.count,
            timestamp: Some(s.timestamp),
        },
        None => Today {
            count: 0,
            timestamp: None,
        },
    }
}

/// `min(count / goal, 1.0)`.
pub fn progress(count: u64, goal: u64) -> Result<f64, AggregationError> {
    if goal == 0 {
        return Err(AggregationError::ZeroGoal);
    }
    Ok((count as f64 / goal as f64).min(1.0))
}

/// Busiest bucket; on ties the earliest one in series order wins.
pub fn peak_hour(series: &[Sample]) -> Option<&Sample> {
    series.iter().fold(None, |best: Option<&Sample>, s| match best {
        Some(b) if b.count >= s.count => Some(b),
        _ => Some(s),
    })
}

pub fn total_steps(series: &[Sample]) -> u64 {
    series.iter().map(|s| s.count).sum()
}

pub fn accent_tier(count: u64, goal: u64) -> AccentTier {
    if count == 0 {
        AccentTier::NoData
    } else if count >= goal {
        AccentTier::AtOrAbove
    } else {
        AccentTier::Below
    }
}

/// Width of an hourly bar relative to the peak hour.
pub fn hour_bar_fraction(count: u64, peak: Option<u64>) -> f64 {
    let peak = match peak {
        Some(p) if p > 0 => p,
        _ => 1,
    };
    (count as f64 / peak as f64).clamp(MIN_BAR_FRACTION, 1.0)
}

/// Everything the home screen shows for one weekly series.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WeekSummary {
    pub today: Today,
    pub goal: u64,
    pub progress: f64,
    pub today_tier: AccentTier,
    pub rows: Vec<DisplayRow>,
}

impl WeekSummary {
    pub fn derive(series: &[Sample], goal: u64, now: DateTime<Utc>) -> Result<Self, AggregationError> {
        let today = today_value(series);
        let progress = progress(today.count, goal)?;
        let rows = weekly_display_rows(weekly_series(series), WEEK_ROWS, now);
        Ok(Self {
            today,
            goal,
            progress,
            today_tier: accent_tier(today.count, goal),
            rows,
        })
    }
}

/// A non-zero hour of the detail list.
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct HourRow {
    pub sample: Sample,
    pub bar_fraction: f64,
}

/// Everything the day detail screen shows for one hourly series.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total: u64,
    pub total_tier: AccentTier,
    pub peak: Option<Sample>,
    pub bars: Vec<Sample>,
    pub rows: Vec<HourRow>,
}

impl DaySummary {
    pub fn derive(date: NaiveDate, hourly: &[Sample], goal: u64) -> Self {
        let total = total_steps(hourly);
        let peak = peak_hour(hourly).copied();
        let peak_count = peak.map(|p| p.count);
        let rows = hourly
            .iter()
            .filter(|s| s.count > 0)
            .map(|s| HourRow {
                sample: *s,
                bar_fraction: hour_bar_fraction(s.count, peak_count),
            })
            .collect();
        Self {
            date,
            total,
            total_tier: accent_tier(total, goal),
            peak,
            bars: hourly.to_vec(),
            rows,
        }
    }
}
