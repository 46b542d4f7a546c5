//! Timeseries CSV import/export (`spec.md` §4.5).
//!
//! Grounded on `original_source/bemserver/core/csv_io.py`'s
//! `TimeseriesCSVIO.import_csv`/`export_csv`/`export_csv_bucket`. The
//! original pivots with pandas; this pivots with a `BTreeMap` (ordered by
//! timestamp for free, no dataframe dependency needed for the volumes this
//! system handles).

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use domain::error::TimeseriesCSVIOError;
use domain::model::TimeseriesPoint;
use domain::store::{Aggregation, Store};

/// `spec.md` §4.5 Import steps 1-4.
///
/// Header column 0 must be `Datetime`; columns 1..N name existing
/// timeseries. Every data row must carry exactly N+1 columns. All points
/// are staged in memory and written with a single `bulk_insert_points`
/// call (on-conflict-ignore), matching the original's one-statement
/// multi-row insert.
pub async fn import_csv(store: &dyn Store, input: &str) -> Result<usize, TimeseriesCSVIOError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(input.as_bytes());
    let mut records = reader.records();

    let header = records
        .next()
        .ok_or(TimeseriesCSVIOError::MissingHeader)?
        .map_err(|_| TimeseriesCSVIOError::MissingHeader)?;

    if header.get(0) != Some("Datetime") {
        return Err(TimeseriesCSVIOError::BadHeader);
    }

    let mut timeseries_ids = Vec::with_capacity(header.len().saturating_sub(1));
    for cell in header.iter().skip(1) {
        let id = store
            .resolve_timeseries_id(cell)
            .await
            .map_err(|e| TimeseriesCSVIOError::Storage(e.to_string()))?
            .ok_or_else(|| TimeseriesCSVIOError::UnknownId(cell.to_string()))?;
        timeseries_ids.push(id);
    }

    let mut points = Vec::new();
    for result in records {
        let record = result.map_err(|_| TimeseriesCSVIOError::ShortRow)?;
        if record.len() != timeseries_ids.len() + 1 {
            return Err(TimeseriesCSVIOError::ShortRow);
        }

        let raw_ts = record.get(0).ok_or(TimeseriesCSVIOError::ShortRow)?;
        let timestamp = parse_instant(raw_ts)
            .ok_or_else(|| TimeseriesCSVIOError::BadValue(raw_ts.to_string()))?;

        for (i, timeseries_id) in timeseries_ids.iter().enumerate() {
            let raw_value = record.get(i + 1).ok_or(TimeseriesCSVIOError::ShortRow)?;
            let value: f64 = raw_value
                .parse()
                .map_err(|_| TimeseriesCSVIOError::BadValue(raw_value.to_string()))?;
            points.push(TimeseriesPoint::new(*timeseries_id, timestamp, value));
        }
    }

    let inserted = points.len();
    store
        .bulk_insert_points(&points)
        .await
        .map_err(|e| TimeseriesCSVIOError::Storage(e.to_string()))?;
    Ok(inserted)
}

/// `spec.md` §4.5 Export (raw).
pub async fn export_csv(
    store: &dyn Store,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    timeseries_ids: &[i64],
) -> Result<String, TimeseriesCSVIOError> {
    let points = store
        .query_range(timeseries_ids, start, end)
        .await
        .map_err(|e| TimeseriesCSVIOError::Storage(e.to_string()))?;

    let mut pivot: BTreeMap<DateTime<Utc>, HashMap<i64, f64>> = BTreeMap::new();
    for point in points {
        pivot
            .entry(point.timestamp)
            .or_default()
            .insert(point.timeseries_id, point.value);
    }

    write_pivot(timeseries_ids, pivot)
}

/// `spec.md` §4.5 Export (bucketed).
#[allow(clippy::too_many_arguments)]
pub async fn export_csv_bucket(
    store: &dyn Store,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    timeseries_ids: &[i64],
    bucket_width: Duration,
    tz: Tz,
    aggregation: Aggregation,
) -> Result<String, TimeseriesCSVIOError> {
    let points = store
        .query_bucket(timeseries_ids, start, end, bucket_width, tz, aggregation)
        .await
        .map_err(|e| TimeseriesCSVIOError::Storage(e.to_string()))?;

    let mut pivot: BTreeMap<DateTime<Utc>, HashMap<i64, f64>> = BTreeMap::new();
    for point in points {
        pivot
            .entry(point.bucket_start)
            .or_default()
            .insert(point.timeseries_id, point.value);
    }

    write_pivot(timeseries_ids, pivot)
}

/// Pivot `timestamp -> {timeseries_id: value}` into the wire CSV, one
/// column per id in input order; missing cells are empty strings
/// (`spec.md` §4.5 step 2-3 for both export variants).
fn write_pivot(
    timeseries_ids: &[i64],
    pivot: BTreeMap<DateTime<Utc>, HashMap<i64, f64>>,
) -> Result<String, TimeseriesCSVIOError> {
    let mut writer = csv::WriterBuilder::new().from_writer(vec![]);

    let mut header = vec!["Datetime".to_string()];
    header.extend(timeseries_ids.iter().map(i64::to_string));
    writer
        .write_record(&header)
        .map_err(|e| TimeseriesCSVIOError::Storage(e.to_string()))?;

    for (timestamp, row) in pivot {
        let mut record = vec![format_instant(timestamp)];
        for id in timeseries_ids {
            record.push(row.get(id).map(f64::to_string).unwrap_or_default());
        }
        writer
            .write_record(&record)
            .map_err(|e| TimeseriesCSVIOError::Storage(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TimeseriesCSVIOError::Storage(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| TimeseriesCSVIOError::Storage(e.to_string()))
}

/// `YYYY-MM-DDTHH:MM:SS±HHMM` in UTC (`spec.md` §4.5 step 3).
fn format_instant(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%z").to_string()
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = raw.replace('Z', "+00:00");
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::store::MockStore;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_import_rejects_missing_header() {
        let store = MockStore::new();
        let err = import_csv(&store, "").await.unwrap_err();
        assert_eq!(err, TimeseriesCSVIOError::MissingHeader);
    }

    #[tokio::test]
    async fn test_import_rejects_bad_header() {
        let store = MockStore::new();
        let err = import_csv(&store, "Timestamp,1\n").await.unwrap_err();
        assert_eq!(err, TimeseriesCSVIOError::BadHeader);
    }

    #[tokio::test]
    async fn test_import_rejects_unknown_id() {
        let mut store = MockStore::new();
        store
            .expect_resolve_timeseries_id()
            .withf(|name| name == "42")
            .returning(|_| Ok(None));
        let err = import_csv(&store, "Datetime,42\n2024-01-01T00:00:00+00:00,1.0\n")
            .await
            .unwrap_err();
        assert_eq!(err, TimeseriesCSVIOError::UnknownId("42".to_string()));
    }

    #[tokio::test]
    async fn test_import_rejects_short_row() {
        let mut store = MockStore::new();
        store.expect_resolve_timeseries_id().returning(|_| Ok(Some(1)));
        let err = import_csv(&store, "Datetime,1,2\n2024-01-01T00:00:00+00:00,1.0\n")
            .await
            .unwrap_err();
        assert_eq!(err, TimeseriesCSVIOError::ShortRow);
    }

    #[tokio::test]
    async fn test_import_rejects_non_numeric_value() {
        let mut store = MockStore::new();
        store.expect_resolve_timeseries_id().returning(|_| Ok(Some(1)));
        let err = import_csv(&store, "Datetime,1\n2024-01-01T00:00:00+00:00,not-a-number\n")
            .await
            .unwrap_err();
        assert_eq!(err, TimeseriesCSVIOError::BadValue("not-a-number".to_string()));
    }

    #[tokio::test]
    async fn test_import_inserts_flat_row_major_points() {
        let mut store = MockStore::new();
        store.expect_resolve_timeseries_id().returning(|name| {
            Ok(Some(name.parse().unwrap()))
        });
        store
            .expect_bulk_insert_points()
            .withf(|points| points.len() == 4)
            .returning(|_| Ok(()));

        let csv = "Datetime,1,2\n\
                   2024-01-01T00:00:00+00:00,1.0,2.0\n\
                   2024-01-01T01:00:00+00:00,3.0,4.0\n";
        let count = import_csv(&store, csv).await.unwrap();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_export_csv_pivots_with_gaps_as_empty_cells() {
        let mut store = MockStore::new();
        store.expect_query_range().returning(|_, _, _| {
            Ok(vec![
                TimeseriesPoint::new(1, ts(0), 10.0),
                TimeseriesPoint::new(2, ts(3600), 20.0),
            ])
        });

        let csv = export_csv(&store, ts(0), ts(7200), &[1, 2]).await.unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Datetime,1,2"));
        assert!(lines.next().unwrap().ends_with(",10,"));
        assert!(lines.next().unwrap().ends_with(",20"));
    }

    #[tokio::test]
    async fn test_export_csv_bucket_pivots_aggregated_rows() {
        use domain::model::BucketedPoint;

        let mut store = MockStore::new();
        store.expect_query_bucket().returning(|_, _, _, _, _, _| {
            Ok(vec![
                BucketedPoint { bucket_start: ts(0), timeseries_id: 1, value: 11.5 },
                BucketedPoint { bucket_start: ts(86400), timeseries_id: 1, value: 35.5 },
                BucketedPoint { bucket_start: ts(172800), timeseries_id: 1, value: 59.5 },
            ])
        });

        let csv = export_csv_bucket(
            &store,
            ts(0),
            ts(3 * 86400),
            &[1],
            Duration::days(1),
            chrono_tz::UTC,
            Aggregation::Avg,
        )
        .await
        .unwrap();

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Datetime,1"));
        assert_eq!(lines.next(), Some("1970-01-01T00:00:00+0000,11.5"));
        assert_eq!(lines.next(), Some("1970-01-02T00:00:00+0000,35.5"));
        assert_eq!(lines.next(), Some("1970-01-03T00:00:00+0000,59.5"));
    }
}
