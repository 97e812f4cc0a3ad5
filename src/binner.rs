// Time bucketing of detection events

use crate::error::ChartError;
use crate::event::Event;
use chrono::{
    DateTime, Datelike, FixedOffset, Months, NaiveDateTime, NaiveTime, TimeDelta, TimeZone,
    Timelike,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Day and month buckets start this long before the calendar boundary so a
/// whole night of activity lands in a single bucket.
const NIGHT_ANCHOR_HOURS: i64 = 12;

fn night_anchor() -> TimeDelta {
    TimeDelta::hours(NIGHT_ANCHOR_HOURS)
}

/// Width of a time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resolution {
    Hour,
    #[default]
    Day,
    Month,
}

impl Resolution {
    /// Align a timestamp to the start of its bucket, in the timestamp's own offset
    pub fn floor(self, t: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let local = t.naive_local();
        let floored = match self {
            Resolution::Hour => {
                local.date().and_time(NaiveTime::MIN) + TimeDelta::hours(local.hour().into())
            }
            Resolution::Day => {
                let shifted = local + night_anchor();
                shifted.date().and_time(NaiveTime::MIN) - night_anchor()
            }
            Resolution::Month => {
                let shifted = local + night_anchor();
                let first = shifted.date() - TimeDelta::days(shifted.day0().into());
                first.and_time(NaiveTime::MIN) - night_anchor()
            }
        };
        from_local(t.offset(), floored)
    }

    /// Step a bucket start by `n` buckets (negative steps go back in time)
    pub fn offset(
        self,
        start: &DateTime<FixedOffset>,
        n: i32,
    ) -> Result<DateTime<FixedOffset>, ChartError> {
        let overflow = || ChartError::CalendarOverflow(start.to_rfc3339());
        match self {
            Resolution::Hour => start
                .checked_add_signed(TimeDelta::hours(n.into()))
                .ok_or_else(overflow),
            Resolution::Day => start
                .checked_add_signed(TimeDelta::days(n.into()))
                .ok_or_else(overflow),
            Resolution::Month => {
                // Month arithmetic runs on the calendar boundary, then the anchor is re-applied
                let boundary = start.naive_local() + night_anchor();
                let months = Months::new(n.unsigned_abs());
                let moved = if n >= 0 {
                    boundary.checked_add_months(months)
                } else {
                    boundary.checked_sub_months(months)
                }
                .ok_or_else(overflow)?;
                Ok(from_local(start.offset(), moved - night_anchor()))
            }
        }
    }

    /// Number of bucket slots in `[start, end)`, counting partial slots
    pub fn steps_between(
        self,
        start: &DateTime<FixedOffset>,
        end: &DateTime<FixedOffset>,
    ) -> usize {
        if end <= start {
            return 0;
        }
        match self {
            Resolution::Hour | Resolution::Day => {
                let unit = self.nominal_millis() as i64;
                let span = (*end - *start).num_milliseconds();
                ((span + unit - 1) / unit) as usize
            }
            Resolution::Month => {
                let mut count = 0;
                let mut cursor = *start;
                while cursor < *end {
                    count += 1;
                    match self.offset(start, count as i32) {
                        Ok(next) => cursor = next,
                        Err(_) => break,
                    }
                }
                count
            }
        }
    }

    /// Approximate bucket width in milliseconds (months count as 1/12 year)
    pub fn nominal_millis(self) -> f64 {
        match self {
            Resolution::Hour => 3_600_000.0,
            Resolution::Day => 86_400_000.0,
            Resolution::Month => 2_629_746_000.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Hour => "hour",
            Resolution::Day => "day",
            Resolution::Month => "month",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(Resolution::Hour),
            "day" => Ok(Resolution::Day),
            "month" => Ok(Resolution::Month),
            _ => Err(ChartError::UnknownResolution(s.to_string())),
        }
    }
}

fn from_local(offset: &FixedOffset, local: NaiveDateTime) -> DateTime<FixedOffset> {
    let utc = local - TimeDelta::seconds(offset.local_minus_utc().into());
    offset.from_utc_datetime(&utc)
}

/// Per-category detection counts for one time bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub start: DateTime<FixedOffset>,
    pub counts: BTreeMap<String, u32>,
}

impl Bucket {
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn count(&self, category: &str) -> u32 {
        self.counts.get(category).copied().unwrap_or(0)
    }
}

/// Group events into resolution-aligned buckets evaluated in `zone`.
///
/// Buckets come back in chronological order. Time ranges without events
/// produce no bucket at all.
pub fn bin(events: &[Event], resolution: Resolution, zone: FixedOffset) -> Vec<Bucket> {
    let mut grouped: BTreeMap<DateTime<FixedOffset>, BTreeMap<String, u32>> = BTreeMap::new();

    for event in events {
        let key = resolution.floor(&event.timestamp.with_timezone(&zone));
        *grouped
            .entry(key)
            .or_default()
            .entry(event.category.clone())
            .or_insert(0) += 1;
    }

    grouped
        .into_iter()
        .map(|(start, counts)| Bucket { start, counts })
        .collect()
}

/// Deterministic category order: every category seen in any bucket, sorted
pub fn categories(buckets: &[Bucket]) -> Vec<String> {
    let unique: BTreeSet<&String> = buckets.iter().flat_map(|b| b.counts.keys()).collect();
    unique.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::parse_timestamp;
    use chrono::{Offset, Utc};

    fn ts(s: &str) -> DateTime<FixedOffset> {
        parse_timestamp(s).unwrap()
    }

    fn ev(t: &str, c: &str) -> Event {
        Event::new(ts(t), c)
    }

    #[test]
    fn test_floor_hour() {
        let floored = Resolution::Hour.floor(&ts("2024-06-01 23:50:12+0000"));
        assert_eq!(floored, ts("2024-06-01 23:00:00+0000"));
    }

    #[test]
    fn test_floor_day_is_anchored_at_noon() {
        let evening = Resolution::Day.floor(&ts("2024-06-01 23:50:00+0000"));
        let after_midnight = Resolution::Day.floor(&ts("2024-06-02 00:10:00+0000"));
        let before_noon = Resolution::Day.floor(&ts("2024-06-02 11:59:59+0000"));
        let afternoon = Resolution::Day.floor(&ts("2024-06-02 12:00:00+0000"));

        assert_eq!(evening, ts("2024-06-01 12:00:00+0000"));
        assert_eq!(after_midnight, evening);
        assert_eq!(before_noon, evening);
        assert_eq!(afternoon, ts("2024-06-02 12:00:00+0000"));
    }

    #[test]
    fn test_floor_month_is_anchored_half_day_early() {
        let mid_june = Resolution::Month.floor(&ts("2024-06-15 03:00:00+0000"));
        assert_eq!(mid_june, ts("2024-05-31 12:00:00+0000"));

        // The last evening of June already belongs to July
        let june_30_night = Resolution::Month.floor(&ts("2024-06-30 22:00:00+0000"));
        assert_eq!(june_30_night, ts("2024-06-30 12:00:00+0000"));
    }

    #[test]
    fn test_floor_keeps_offset() {
        let floored = Resolution::Day.floor(&ts("2024-06-02 01:30:00+0200"));
        assert_eq!(floored, ts("2024-06-01 12:00:00+0200"));
        assert_eq!(floored.offset().local_minus_utc(), 7200);
    }

    #[test]
    fn test_offset_steps() {
        let start = ts("2024-06-01 12:00:00+0000");
        assert_eq!(Resolution::Day.offset(&start, -1).unwrap(), ts("2024-05-31 12:00:00+0000"));
        assert_eq!(Resolution::Day.offset(&start, 2).unwrap(), ts("2024-06-03 12:00:00+0000"));
        assert_eq!(Resolution::Hour.offset(&start, 3).unwrap(), ts("2024-06-01 15:00:00+0000"));

        let month = ts("2024-01-31 12:00:00+0000");
        assert_eq!(Resolution::Month.offset(&month, 1).unwrap(), ts("2024-02-29 12:00:00+0000"));
        assert_eq!(Resolution::Month.offset(&month, -1).unwrap(), ts("2023-12-31 12:00:00+0000"));
    }

    #[test]
    fn test_steps_between() {
        let a = ts("2024-06-01 12:00:00+0000");
        let b = ts("2024-06-04 12:00:00+0000");
        assert_eq!(Resolution::Day.steps_between(&a, &b), 3);
        assert_eq!(Resolution::Hour.steps_between(&a, &b), 72);
        assert_eq!(Resolution::Day.steps_between(&b, &a), 0);

        let m0 = ts("2023-12-31 12:00:00+0000");
        let m3 = ts("2024-03-31 12:00:00+0000");
        assert_eq!(Resolution::Month.steps_between(&m0, &m3), 3);
    }

    #[test]
    fn test_bin_preserves_event_count() {
        let events = vec![
            ev("2024-06-01 21:00:00+0000", "A"),
            ev("2024-06-01 22:00:00+0000", "B"),
            ev("2024-06-03 02:00:00+0000", "A"),
            ev("2024-05-20 23:00:00+0000", "C"),
            ev("2024-06-01 21:30:00+0000", "A"),
        ];
        for resolution in [Resolution::Hour, Resolution::Day, Resolution::Month] {
            let buckets = bin(&events, resolution, Utc.fix());
            let total: u32 = buckets.iter().map(Bucket::total).sum();
            assert_eq!(total as usize, events.len(), "resolution {}", resolution);
        }
    }

    #[test]
    fn test_bin_is_sparse_and_sorted() {
        let events = vec![
            ev("2024-06-10 22:00:00+0000", "A"),
            ev("2024-06-01 22:00:00+0000", "A"),
        ];
        let buckets = bin(&events, Resolution::Day, Utc.fix());
        assert_eq!(buckets.len(), 2);
        assert!(buckets[0].start < buckets[1].start);
        assert_eq!(buckets[0].start, ts("2024-06-01 12:00:00+0000"));
    }

    #[test]
    fn test_bin_night_scenario() {
        let events = vec![
            ev("2024-06-01 23:50:00+0000", "A"),
            ev("2024-06-02 00:10:00+0000", "A"),
            ev("2024-06-02 13:00:00+0000", "B"),
        ];
        let buckets = bin(&events, Resolution::Day, Utc.fix());
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].count("A"), 2);
        assert_eq!(buckets[0].count("B"), 0);
        assert_eq!(buckets[1].count("B"), 1);
    }

    #[test]
    fn test_bin_in_configured_zone() {
        // 11:30 UTC is 13:30 in +0200, past the local noon boundary
        let events = vec![ev("2024-06-02 11:30:00+0000", "A")];
        let zone = FixedOffset::east_opt(7200).unwrap();
        let buckets = bin(&events, Resolution::Day, zone);
        assert_eq!(buckets[0].start, ts("2024-06-02 12:00:00+0200"));
    }

    #[test]
    fn test_bin_empty() {
        assert!(bin(&[], Resolution::Day, Utc.fix()).is_empty());
    }

    #[test]
    fn test_categories_sorted_and_unique() {
        let events = vec![
            ev("2024-06-01 21:00:00+0000", "Nyctalus"),
            ev("2024-06-05 21:00:00+0000", "Eptesicus"),
            ev("2024-06-05 21:10:00+0000", "Nyctalus"),
        ];
        let buckets = bin(&events, Resolution::Day, Utc.fix());
        assert_eq!(categories(&buckets), vec!["Eptesicus", "Nyctalus"]);
    }

    #[test]
    fn test_resolution_from_str() {
        assert_eq!("HOUR".parse::<Resolution>().unwrap(), Resolution::Hour);
        assert_eq!("month".parse::<Resolution>().unwrap(), Resolution::Month);
        assert!("week".parse::<Resolution>().is_err());
    }
}
