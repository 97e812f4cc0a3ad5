// Axis tick generation for value and time scales

use chrono::{
    DateTime, Datelike, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone, Timelike,
};

/// A tick position in domain units with its label
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

/// Step between nicely rounded ticks (1, 2 or 5 times a power of ten)
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let raw = (stop - start).abs() / count.max(1) as f64;
    if raw == 0.0 || !raw.is_finite() {
        return 0.0;
    }
    let power = raw.log10().floor();
    let magnitude = 10f64.powf(power);
    let error = raw / magnitude;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * magnitude
}

/// Roughly `count` rounded values covering `[start, stop]`, ascending
pub fn linear_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    let (lo, hi) = if start <= stop { (start, stop) } else { (stop, start) };
    if lo == hi {
        return vec![lo];
    }
    let step = tick_step(lo, hi, count);
    if step == 0.0 {
        return Vec::new();
    }
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    // Multiply rather than accumulate so values stay exact
    (first..=last).map(|i| i as f64 * step).collect()
}

/// Labelled value ticks; decimals follow the tick step
pub fn value_ticks(start: f64, stop: f64, count: usize) -> Vec<Tick> {
    let step = tick_step(start, stop, count);
    let decimals = if step > 0.0 && step < 1.0 {
        (-step.log10().floor()) as usize
    } else {
        0
    };
    linear_ticks(start, stop, count)
        .into_iter()
        .map(|value| Tick {
            value,
            label: format!("{:.*}", decimals, value),
        })
        .collect()
}

/// Calendar interval between time ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInterval {
    Minutes(u32),
    Hours(u32),
    Days(u32),
    Week,
    Months(u32),
    Year,
}

impl TimeInterval {
    const LADDER: [TimeInterval; 14] = [
        TimeInterval::Minutes(1),
        TimeInterval::Minutes(5),
        TimeInterval::Minutes(15),
        TimeInterval::Minutes(30),
        TimeInterval::Hours(1),
        TimeInterval::Hours(3),
        TimeInterval::Hours(6),
        TimeInterval::Hours(12),
        TimeInterval::Days(1),
        TimeInterval::Days(2),
        TimeInterval::Week,
        TimeInterval::Months(1),
        TimeInterval::Months(3),
        TimeInterval::Year,
    ];

    pub fn approx_millis(self) -> f64 {
        const MINUTE: f64 = 60_000.0;
        const DAY: f64 = 86_400_000.0;
        match self {
            TimeInterval::Minutes(n) => n as f64 * MINUTE,
            TimeInterval::Hours(n) => n as f64 * 60.0 * MINUTE,
            TimeInterval::Days(n) => n as f64 * DAY,
            TimeInterval::Week => 7.0 * DAY,
            TimeInterval::Months(n) => n as f64 * 30.0 * DAY,
            TimeInterval::Year => 365.0 * DAY,
        }
    }

    /// Interval whose duration is closest to `span / count`
    pub fn for_span(span_millis: f64, count: usize) -> TimeInterval {
        let target = span_millis.abs() / count.max(1) as f64;
        Self::LADDER
            .iter()
            .copied()
            .min_by(|a, b| {
                let da = (a.approx_millis() - target).abs();
                let db = (b.approx_millis() - target).abs();
                da.total_cmp(&db)
            })
            .unwrap_or(TimeInterval::Days(1))
    }

    fn floor(self, local: NaiveDateTime) -> NaiveDateTime {
        let midnight = local.date().and_time(NaiveTime::MIN);
        match self {
            TimeInterval::Minutes(n) => {
                let minutes = local.hour() * 60 + local.minute();
                midnight + TimeDelta::minutes((minutes - minutes % n).into())
            }
            TimeInterval::Hours(n) => {
                midnight + TimeDelta::hours((local.hour() - local.hour() % n).into())
            }
            TimeInterval::Days(n) => {
                let day0 = local.day0();
                midnight - TimeDelta::days((day0 % n).into())
            }
            TimeInterval::Week => {
                midnight - TimeDelta::days(local.weekday().num_days_from_sunday().into())
            }
            TimeInterval::Months(n) => {
                let month0 = local.month0() - local.month0() % n;
                NaiveDate::from_ymd_opt(local.year(), month0 + 1, 1)
                    .unwrap_or(local.date())
                    .and_time(NaiveTime::MIN)
            }
            TimeInterval::Year => NaiveDate::from_ymd_opt(local.year(), 1, 1)
                .unwrap_or(local.date())
                .and_time(NaiveTime::MIN),
        }
    }

    fn step(self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            TimeInterval::Minutes(n) => local.checked_add_signed(TimeDelta::minutes(n.into())),
            TimeInterval::Hours(n) => local.checked_add_signed(TimeDelta::hours(n.into())),
            TimeInterval::Days(n) => {
                let next = local.checked_add_signed(TimeDelta::days(n.into()))?;
                // Day-of-month multiples restart at the first of each month
                if next.month() != local.month() && next.day0() % n != 0 {
                    Some(next - TimeDelta::days((next.day0() % n).into()))
                } else {
                    Some(next)
                }
            }
            TimeInterval::Week => local.checked_add_signed(TimeDelta::days(7)),
            TimeInterval::Months(n) => local.checked_add_months(Months::new(n)),
            TimeInterval::Year => local.checked_add_months(Months::new(12)),
        }
    }

    fn label(self, local: NaiveDateTime) -> String {
        match self {
            TimeInterval::Minutes(_) | TimeInterval::Hours(_) => {
                if local.hour() == 0 && local.minute() == 0 {
                    local.format("%a %d").to_string()
                } else {
                    local.format("%H:%M").to_string()
                }
            }
            TimeInterval::Days(_) | TimeInterval::Week => {
                if local.day() == 1 {
                    local.format("%B").to_string()
                } else {
                    local.format("%b %d").to_string()
                }
            }
            TimeInterval::Months(_) => {
                if local.month() == 1 {
                    local.format("%Y").to_string()
                } else {
                    local.format("%B").to_string()
                }
            }
            TimeInterval::Year => local.format("%Y").to_string(),
        }
    }
}

/// Calendar-aligned ticks over a millisecond span, labelled in `zone`
pub fn time_ticks(start_ms: f64, end_ms: f64, count: usize, zone: &FixedOffset) -> Vec<Tick> {
    let (lo, hi) = if start_ms <= end_ms { (start_ms, end_ms) } else { (end_ms, start_ms) };
    let (Some(lo_dt), Some(hi_dt)) = (to_datetime(lo, zone), to_datetime(hi, zone)) else {
        return Vec::new();
    };

    let interval = TimeInterval::for_span(hi - lo, count);
    let mut cursor = interval.floor(lo_dt.naive_local());
    let end = hi_dt.naive_local();
    let mut ticks = Vec::new();

    while cursor <= end {
        let value = local_millis(cursor, zone);
        if value >= lo {
            ticks.push(Tick {
                value,
                label: interval.label(cursor),
            });
        }
        match interval.step(cursor) {
            Some(next) if next > cursor => cursor = next,
            _ => break,
        }
    }

    ticks
}

fn to_datetime(millis: f64, zone: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    if !millis.is_finite() {
        return None;
    }
    zone.timestamp_millis_opt(millis.round() as i64).single()
}

fn local_millis(local: NaiveDateTime, zone: &FixedOffset) -> f64 {
    let utc = local - TimeDelta::seconds(zone.local_minus_utc().into());
    utc.and_utc().timestamp_millis() as f64
}
