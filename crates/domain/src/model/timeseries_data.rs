use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single observation, keyed by the composite `(timeseries_id, timestamp)`
/// primary key (`spec.md` §3). Append-only except for on-conflict-ignore
/// upserts performed by the Store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesPoint {
    pub timeseries_id: i64,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl TimeseriesPoint {
    pub fn new(timeseries_id: i64, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timeseries_id,
            timestamp,
            value,
        }
    }
}

/// One row of a bucketed aggregation (`Store::query_bucket`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketedPoint {
    pub bucket_start: DateTime<Utc>,
    pub timeseries_id: i64,
    pub value: f64,
}
