//! Integration tests for `PostgresStore`.
//!
//! These tests require a PostgreSQL database.
//! Set DATABASE_URL environment variable to run tests.

use chrono::{DateTime, Duration, Utc};
use domain::model::TimeseriesPoint;
use domain::store::{Aggregation, Store};
use infrastructure::PostgresStore;
use sqlx::PgPool;

async fn create_test_pool() -> PgPool {
    dotenv::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database")
}

async fn seed_timeseries(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar!(
        "INSERT INTO timeseries (name) VALUES ($1) ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
        name
    )
    .fetch_one(pool)
    .await
    .expect("Failed to seed timeseries")
}

async fn cleanup(pool: &PgPool, name: &str) {
    sqlx::query!("DELETE FROM timeseries WHERE name = $1", name)
        .execute(pool)
        .await
        .expect("Failed to clean up timeseries");
}

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

#[tokio::test]
async fn test_resolve_timeseries_id_roundtrip() {
    let pool = create_test_pool().await;
    let store = PostgresStore::new(pool.clone());
    store.setup().await.expect("setup should be idempotent");

    let name = "store_test_resolve";
    let id = seed_timeseries(&pool, name).await;

    let resolved = store.resolve_timeseries_id(name).await.unwrap();
    assert_eq!(resolved, Some(id));

    let missing = store.resolve_timeseries_id("does_not_exist").await.unwrap();
    assert_eq!(missing, None);

    cleanup(&pool, name).await;
}

#[tokio::test]
async fn test_insert_point_is_idempotent_on_conflict() {
    let pool = create_test_pool().await;
    let store = PostgresStore::new(pool.clone());
    store.setup().await.unwrap();

    let name = "store_test_insert_idempotent";
    let id = seed_timeseries(&pool, name).await;

    let point = TimeseriesPoint::new(id, ts(0), 42.0);
    store.insert_point(point).await.unwrap();
    store.insert_point(point).await.unwrap();

    let rows = store.query_range(&[id], ts(0), ts(1)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, 42.0);

    cleanup(&pool, name).await;
}

#[tokio::test]
async fn test_bulk_insert_and_query_range() {
    let pool = create_test_pool().await;
    let store = PostgresStore::new(pool.clone());
    store.setup().await.unwrap();

    let name = "store_test_bulk_range";
    let id = seed_timeseries(&pool, name).await;

    let points: Vec<TimeseriesPoint> = (0..4)
        .map(|i| TimeseriesPoint::new(id, ts(i * 3600), (10 + i) as f64))
        .collect();
    store.bulk_insert_points(&points).await.unwrap();

    let rows = store.query_range(&[id], ts(0), ts(4 * 3600)).await.unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].value, 10.0);
    assert_eq!(rows[3].value, 13.0);

    cleanup(&pool, name).await;
}

#[tokio::test]
async fn test_query_bucket_averages_per_day() {
    let pool = create_test_pool().await;
    let store = PostgresStore::new(pool.clone());
    store.setup().await.unwrap();

    let name = "store_test_bucket";
    let id = seed_timeseries(&pool, name).await;

    let points: Vec<TimeseriesPoint> = (0..48)
        .map(|i| TimeseriesPoint::new(id, ts(i * 3600), i as f64))
        .collect();
    store.bulk_insert_points(&points).await.unwrap();

    let buckets = store
        .query_bucket(
            &[id],
            ts(0),
            ts(48 * 3600),
            Duration::days(1),
            chrono_tz::UTC,
            Aggregation::Avg,
        )
        .await
        .unwrap();

    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].value, 11.5);
    assert_eq!(buckets[1].value, 35.5);

    cleanup(&pool, name).await;
}
