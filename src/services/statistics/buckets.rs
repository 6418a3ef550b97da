use chrono::{DateTime, SecondsFormat, TimeDelta, TimeZone, Utc};

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// Width of a rollup bucket. Keys are always derived from the UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Hourly,
    Daily,
}

impl Resolution {
    fn width_seconds(self) -> i64 {
        match self {
            Resolution::Hourly => SECONDS_PER_HOUR,
            Resolution::Daily => SECONDS_PER_DAY,
        }
    }

    /// Start of the bucket containing `ts`.
    pub fn bucket_start<Tz: TimeZone>(self, ts: &DateTime<Tz>) -> DateTime<Utc> {
        align_down(ts.with_timezone(&Utc), self.width_seconds())
    }

    /// External representation of a bucket key: `2024-01-01T10:00:00Z` for hourly buckets,
    /// `2024-01-01` for daily buckets.
    pub fn format_key(self, bucket_start: DateTime<Utc>) -> String {
        match self {
            Resolution::Hourly => bucket_start.to_rfc3339_opts(SecondsFormat::Secs, true),
            Resolution::Daily => bucket_start.format("%Y-%m-%d").to_string(),
        }
    }
}

// UTC has no leap seconds in epoch arithmetic, so day alignment is the calendar day.
fn align_down(ts: DateTime<Utc>, width_seconds: i64) -> DateTime<Utc> {
    let into_bucket = ts.timestamp().rem_euclid(width_seconds);
    ts - TimeDelta::seconds(into_bucket)
        - TimeDelta::nanoseconds(i64::from(ts.timestamp_subsec_nanos()))
}
