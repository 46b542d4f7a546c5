use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use domain::error::DomainError;
use domain::model::{BucketedPoint, TimeseriesPoint};
use domain::store::{Aggregation, Store};
use sqlx::PgPool;
use time::OffsetDateTime;

/// Raw-`sqlx` implementation of `Store` (`spec.md` §4.1).
///
/// `setup`/`insert_point`/`bulk_insert_points`/`resolve_timeseries_id` are
/// straightforward upserts and could live on a sea-orm backend instead; they
/// are kept here so `query_bucket`'s `time_bucket(...)` call (no sea-orm
/// query-builder equivalent) shares a connection pool and a single
/// implementation of the OffsetDateTime <-> chrono conversion helpers.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn to_offset(dt: DateTime<Utc>) -> OffsetDateTime {
        let timestamp = dt.timestamp();
        let nanos = dt.timestamp_subsec_nanos();
        OffsetDateTime::from_unix_timestamp_nanos(
            (timestamp as i128) * 1_000_000_000 + (nanos as i128),
        )
        .unwrap()
    }

    fn to_chrono(dt: OffsetDateTime) -> DateTime<Utc> {
        let timestamp = dt.unix_timestamp();
        let nanos = dt.nanosecond();
        DateTime::from_timestamp(timestamp, nanos).unwrap_or_default()
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn setup(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS timeseries_data (
                timeseries_id BIGINT NOT NULL,
                "timestamp" TIMESTAMPTZ NOT NULL,
                value DOUBLE PRECISION NOT NULL,
                PRIMARY KEY (timeseries_id, "timestamp")
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        // Idempotent: a plain Postgres backend has no hypertable concept and
        // `create_hypertable` errors on a non-empty table if called twice
        // without `if_not_exists => TRUE`.
        let _ = sqlx::query(
            r#"SELECT create_hypertable('timeseries_data', 'timestamp', if_not_exists => TRUE)"#,
        )
        .execute(&self.pool)
        .await;

        Ok(())
    }

    async fn insert_point(&self, point: TimeseriesPoint) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO timeseries_data (timeseries_id, "timestamp", value)
            VALUES ($1, $2, $3)
            ON CONFLICT (timeseries_id, "timestamp") DO NOTHING
            "#,
        )
        .bind(point.timeseries_id)
        .bind(Self::to_offset(point.timestamp))
        .bind(point.value)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn bulk_insert_points(&self, points: &[TimeseriesPoint]) -> Result<(), DomainError> {
        if points.is_empty() {
            return Ok(());
        }

        let mut query = String::from(
            r#"INSERT INTO timeseries_data (timeseries_id, "timestamp", value) VALUES "#,
        );
        for (i, _) in points.iter().enumerate() {
            if i > 0 {
                query.push(',');
            }
            let base = i * 3;
            query.push_str(&format!("(${}, ${}, ${})", base + 1, base + 2, base + 3));
        }
        query.push_str(r#" ON CONFLICT (timeseries_id, "timestamp") DO NOTHING"#);

        let mut q = sqlx::query(&query);
        for point in points {
            q = q
                .bind(point.timeseries_id)
                .bind(Self::to_offset(point.timestamp))
                .bind(point.value);
        }
        q.execute(&self.pool)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn query_range(
        &self,
        timeseries_ids: &[i64],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeseriesPoint>, DomainError> {
        let rows = sqlx::query_as::<_, (i64, OffsetDateTime, f64)>(
            r#"
            SELECT timeseries_id, "timestamp", value
            FROM timeseries_data
            WHERE timeseries_id = ANY($1) AND "timestamp" >= $2 AND "timestamp" < $3
            ORDER BY "timestamp"
            "#,
        )
        .bind(timeseries_ids)
        .bind(Self::to_offset(start))
        .bind(Self::to_offset(end))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(timeseries_id, ts, value)| {
                TimeseriesPoint::new(timeseries_id, Self::to_chrono(ts), value)
            })
            .collect())
    }

    async fn query_bucket(
        &self,
        timeseries_ids: &[i64],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bucket_width: Duration,
        tz: Tz,
        aggregation: Aggregation,
    ) -> Result<Vec<BucketedPoint>, DomainError> {
        let agg_fn = match aggregation {
            Aggregation::Avg => "avg",
        };
        let width = format!("{} seconds", bucket_width.num_seconds());
        let tz_name = tz.name();

        let query = format!(
            r#"
            SELECT
                time_bucket($1::interval, "timestamp" AT TIME ZONE $2) AT TIME ZONE $2 AS bucket_start,
                timeseries_id,
                {agg_fn}(value) AS value
            FROM timeseries_data
            WHERE timeseries_id = ANY($3) AND "timestamp" >= $4 AND "timestamp" < $5
            GROUP BY bucket_start, timeseries_id
            ORDER BY bucket_start, timeseries_id
            "#
        );

        let rows = sqlx::query_as::<_, (OffsetDateTime, i64, f64)>(&query)
            .bind(&width)
            .bind(tz_name)
            .bind(timeseries_ids)
            .bind(Self::to_offset(start))
            .bind(Self::to_offset(end))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(bucket_start, timeseries_id, value)| BucketedPoint {
                bucket_start: Self::to_chrono(bucket_start),
                timeseries_id,
                value,
            })
            .collect())
    }

    async fn resolve_timeseries_id(&self, name: &str) -> Result<Option<i64>, DomainError> {
        let row = sqlx::query_as::<_, (i64,)>(r#"SELECT id FROM timeseries WHERE name = $1"#)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(row.map(|(id,)| id))
    }
}
