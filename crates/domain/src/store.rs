use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::error::DomainError;
use crate::model::{BucketedPoint, TimeseriesPoint};

/// Aggregation function applied within a time bucket (`spec.md` §4.5
/// "at minimum `avg`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Avg,
}

/// Abstraction over the relational + time-partitioned backend
/// (`spec.md` §4.1).
///
/// Implementations live in the infrastructure crate (sea-orm for the simple
/// CRUD paths, raw `sqlx` for `time_bucket`-based aggregation and
/// multi-row bulk inserts, matching the teacher's dual-backend split).
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Create schema; mark `timeseries_data` as time-partitioned on
    /// `timestamp`. Idempotent.
    async fn setup(&self) -> Result<(), DomainError>;

    /// Idempotent by the composite `(timeseries_id, timestamp)` key;
    /// silently succeeds on duplicate.
    async fn insert_point(&self, point: TimeseriesPoint) -> Result<(), DomainError>;

    /// Single multi-row insert with on-conflict-ignore. Partial failure
    /// aborts the whole batch.
    async fn bulk_insert_points(&self, points: &[TimeseriesPoint]) -> Result<(), DomainError>;

    /// Rows with `start <= ts < end`, ordered by `ts`, UTC on the wire.
    async fn query_range(
        &self,
        timeseries_ids: &[i64],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeseriesPoint>, DomainError>;

    /// `(bucket_start_utc, timeseries_id, mean(value))` grouped by
    /// `(bucket, timeseries_id)`, ordered by bucket. Bucket boundaries are
    /// computed in `tz`; a point at `t` contributes to the bucket
    /// `b <= t_in_tz < b + bucket_width`.
    async fn query_bucket(
        &self,
        timeseries_ids: &[i64],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bucket_width: Duration,
        tz: Tz,
        aggregation: Aggregation,
    ) -> Result<Vec<BucketedPoint>, DomainError>;

    /// Resolve a timeseries name (as it appears in a CSV header) to its id.
    async fn resolve_timeseries_id(&self, name: &str) -> Result<Option<i64>, DomainError>;
}
