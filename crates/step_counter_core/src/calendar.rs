//! Day and hour bucketing in the device's calendar.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveTime, Offset, Utc,
};

/// Calendar with a fixed UTC offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::local()
    }
}

impl Calendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// The host's current offset.
    pub fn local() -> Self {
        Self::new(Local::now().offset().fix())
    }

    /// Offset given in minutes east of UTC.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Local midnight of `date`, or `None` when it falls outside the
    /// representable range.
    pub fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let midnight = date.and_time(NaiveTime::MIN);
        // A fixed offset has exactly one mapping for every local time.
        Some(midnight.checked_sub_signed(self.offset_duration())?.and_utc())
    }

    /// `[start, end)` of `date`.
    pub fn day_bounds(&self, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start_of_day(date)?;
        Some((start, start.checked_add_signed(Duration::days(1))?))
    }

    /// `[now - days_back days, now]`.
    pub fn weekly_window(
        &self,
        now: DateTime<Utc>,
        days_back: u32,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let back = Duration::try_days(i64::from(days_back))?;
        Some((now.checked_sub_signed(back)?, now))
    }

    /// Start of every local day touched by `[start, end)`, anchored at midnight.
    pub fn day_buckets(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut out = Vec::new();
        let mut cursor = self.start_of_day(self.local_date(start));
        while let Some(bucket) = cursor.filter(|c| *c < end) {
            out.push(bucket);
            cursor = bucket.checked_add_signed(Duration::days(1));
        }
        out
    }

    /// The 24 hour buckets of `date`.
    pub fn hour_buckets(&self, date: NaiveDate) -> Option<Vec<DateTime<Utc>>> {
        // the whole day is representable, so every hour inside it is too
        let (start, _) = self.day_bounds(date)?;
        Some((0..24).map(|h| start + Duration::hours(h)).collect())
    }

    fn offset_duration(&self) -> Duration {
        Duration::seconds(i64::from(self.offset.local_minus_utc()))
    }
}

/// Years a step date may fall in.
pub const DATE_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Parse a calendar date within [`DATE_YEARS`].
///
/// Accepts:
/// - YYYY-MM-DD
/// - RFC3339 datetime (its own local date is used)
/// - Naive datetime YYYY-MM-DDTHH:MM:SS
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    parse_any_date(s.trim()).filter(|d| DATE_YEARS.contains(&d.year()))
}

fn parse_any_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt.date());
    }
    None
}
