//! Timestamp utilities

use chrono::{DateTime, Duration, Utc};

/// Seconds per tasting de-duplication bucket
pub const TASTING_BUCKET_SECONDS: i64 = 60;

/// True when `ts` is more than `seconds` ahead of `now`
pub fn is_distant_future(ts: DateTime<Utc>, seconds: i64, now: DateTime<Utc>) -> bool {
    ts > now + Duration::seconds(seconds)
}

/// True when `ts` is more than `seconds` behind `now`
pub fn is_distant_past(ts: DateTime<Utc>, seconds: i64, now: DateTime<Utc>) -> bool {
    ts < now - Duration::seconds(seconds)
}

/// Duplicate-detection bucket for a tasting timestamp (whole minutes since epoch)
pub fn tasting_bucket(ts: DateTime<Utc>) -> i64 {
    ts.timestamp().div_euclid(TASTING_BUCKET_SECONDS)
}
