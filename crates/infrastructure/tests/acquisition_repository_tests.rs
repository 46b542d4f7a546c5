//! Integration tests for `SeaOrmAcquisitionRepository`.
//!
//! These tests require a PostgreSQL database.
//! Set DATABASE_URL environment variable to run tests.

use chrono::Utc;
use domain::acquisition_repository::AcquisitionRepository;
use infrastructure::SeaOrmAcquisitionRepository;
use sea_orm::Database;
use sqlx::PgPool;

async fn create_test_pool() -> PgPool {
    dotenv::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database")
}

async fn create_repository() -> (SeaOrmAcquisitionRepository, PgPool) {
    dotenv::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect via sea-orm");
    let pool = create_test_pool().await;
    (SeaOrmAcquisitionRepository::new(db), pool)
}

async fn seed_broker(pool: &PgPool, host: &str) -> i64 {
    sqlx::query_scalar!(
        "INSERT INTO mqtt_broker (host, port, protocol_version, transport, is_auth_required, use_tls)
         VALUES ($1, 1883, '3.1.1', 'tcp', false, false)
         RETURNING id",
        host
    )
    .fetch_one(pool)
    .await
    .expect("Failed to seed broker")
}

async fn seed_subscriber(pool: &PgPool, broker_id: i64, is_enabled: bool) -> i64 {
    sqlx::query_scalar!(
        "INSERT INTO mqtt_subscriber
            (broker_id, is_enabled, keep_alive, use_persistent_session, session_expiry, is_connected)
         VALUES ($1, $2, 60, false, 0, false)
         RETURNING id",
        broker_id,
        is_enabled
    )
    .fetch_one(pool)
    .await
    .expect("Failed to seed subscriber")
}

async fn seed_decoder(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar!(
        "INSERT INTO mqtt_payload_decoder (name, description) VALUES ($1, 'test decoder') RETURNING id",
        name
    )
    .fetch_one(pool)
    .await
    .expect("Failed to seed decoder")
}

async fn seed_topic(pool: &PgPool, name: &str, decoder_id: i64) -> i64 {
    sqlx::query_scalar!(
        "INSERT INTO mqtt_topic (name, qos, payload_decoder_id, is_enabled)
         VALUES ($1, 1, $2, true)
         RETURNING id",
        name,
        decoder_id
    )
    .fetch_one(pool)
    .await
    .expect("Failed to seed topic")
}

async fn link_topic_to_subscriber(pool: &PgPool, topic_id: i64, subscriber_id: i64) {
    sqlx::query!(
        "INSERT INTO mqtt_topic_by_subscriber (topic_id, subscriber_id, is_subscribed, is_enabled)
         VALUES ($1, $2, false, true)",
        topic_id,
        subscriber_id
    )
    .execute(pool)
    .await
    .expect("Failed to link topic to subscriber");
}

async fn cleanup_broker(pool: &PgPool, broker_id: i64) {
    sqlx::query!("DELETE FROM mqtt_broker WHERE id = $1", broker_id)
        .execute(pool)
        .await
        .expect("Failed to clean up broker");
}

async fn cleanup_decoder(pool: &PgPool, decoder_id: i64) {
    sqlx::query!("DELETE FROM mqtt_payload_decoder WHERE id = $1", decoder_id)
        .execute(pool)
        .await
        .expect("Failed to clean up decoder");
}

#[tokio::test]
async fn test_broker_roundtrip() {
    let (repo, pool) = create_repository().await;
    let broker_id = seed_broker(&pool, "acq_test_broker_roundtrip").await;

    let broker = repo.broker(broker_id).await.unwrap();
    assert_eq!(broker.id, Some(broker_id));
    assert_eq!(broker.host, "acq_test_broker_roundtrip");
    assert_eq!(broker.port, 1883);

    cleanup_broker(&pool, broker_id).await;
}

#[tokio::test]
async fn test_broker_missing_is_invalid_config_error() {
    let (repo, _pool) = create_repository().await;
    let err = repo.broker(-1).await.unwrap_err();
    assert!(matches!(err, domain::error::DomainError::InvalidBrokerConfig(_)));
}

#[tokio::test]
async fn test_list_enabled_subscribers_excludes_disabled() {
    let (repo, pool) = create_repository().await;
    let broker_id = seed_broker(&pool, "acq_test_broker_subs").await;
    let enabled_id = seed_subscriber(&pool, broker_id, true).await;
    let disabled_id = seed_subscriber(&pool, broker_id, false).await;

    let subscribers = repo.list_enabled_subscribers().await.unwrap();
    let ids: Vec<i64> = subscribers.iter().filter_map(|s| s.id).collect();
    assert!(ids.contains(&enabled_id));
    assert!(!ids.contains(&disabled_id));

    cleanup_broker(&pool, broker_id).await;
}

#[tokio::test]
async fn test_mark_subscriber_connected_then_disconnected() {
    let (repo, pool) = create_repository().await;
    let broker_id = seed_broker(&pool, "acq_test_broker_connect").await;
    let subscriber_id = seed_subscriber(&pool, broker_id, true).await;

    repo.mark_subscriber_connected(subscriber_id, Utc::now())
        .await
        .unwrap();
    let subscribers = repo.list_enabled_subscribers().await.unwrap();
    let subscriber = subscribers.into_iter().find(|s| s.id == Some(subscriber_id)).unwrap();
    assert!(subscriber.is_connected());

    repo.mark_subscriber_disconnected(subscriber_id).await.unwrap();
    let subscribers = repo.list_enabled_subscribers().await.unwrap();
    let subscriber = subscribers.into_iter().find(|s| s.id == Some(subscriber_id)).unwrap();
    assert!(!subscriber.is_connected());

    cleanup_broker(&pool, broker_id).await;
}

#[tokio::test]
async fn test_topics_for_subscriber_respects_enabled_flags() {
    let (repo, pool) = create_repository().await;
    let broker_id = seed_broker(&pool, "acq_test_broker_topics").await;
    let subscriber_id = seed_subscriber(&pool, broker_id, true).await;
    let decoder_id = seed_decoder(&pool, "acq_test_decoder_topics").await;
    let topic_id = seed_topic(&pool, "acq/test/topics", decoder_id).await;
    link_topic_to_subscriber(&pool, topic_id, subscriber_id).await;

    let topics = repo.topics_for_subscriber(subscriber_id).await.unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0].id, Some(topic_id));
    assert_eq!(topics[0].name, "acq/test/topics");

    cleanup_broker(&pool, broker_id).await;
    cleanup_decoder(&pool, decoder_id).await;
}

#[tokio::test]
async fn test_decoder_for_topic_resolves_through_topic() {
    let (repo, pool) = create_repository().await;
    let decoder_id = seed_decoder(&pool, "acq_test_decoder_resolve").await;
    let topic_id = seed_topic(&pool, "acq/test/decoder", decoder_id).await;

    let decoder = repo.decoder_for_topic(topic_id).await.unwrap();
    assert_eq!(decoder.id, Some(decoder_id));
    assert_eq!(decoder.name, "acq_test_decoder_resolve");

    cleanup_decoder(&pool, decoder_id).await;
}

#[tokio::test]
async fn test_update_subscription_state_persists_asymmetric_timestamp() {
    let (repo, pool) = create_repository().await;
    let broker_id = seed_broker(&pool, "acq_test_broker_sub_state").await;
    let subscriber_id = seed_subscriber(&pool, broker_id, true).await;
    let decoder_id = seed_decoder(&pool, "acq_test_decoder_sub_state").await;
    let topic_id = seed_topic(&pool, "acq/test/sub_state", decoder_id).await;
    link_topic_to_subscriber(&pool, topic_id, subscriber_id).await;

    let subscribed_at = Utc::now();
    repo.update_subscription_state(topic_id, subscriber_id, true, subscribed_at)
        .await
        .unwrap();

    let (is_subscribed, ts): (bool, Option<chrono::DateTime<chrono::FixedOffset>>) = sqlx::query_as(
        "SELECT is_subscribed, timestamp_last_subscription FROM mqtt_topic_by_subscriber
         WHERE topic_id = $1 AND subscriber_id = $2",
    )
    .bind(topic_id)
    .bind(subscriber_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(is_subscribed);
    assert!(ts.is_some());

    repo.update_subscription_state(topic_id, subscriber_id, false, Utc::now())
        .await
        .unwrap();

    let (is_subscribed, ts_after): (bool, Option<chrono::DateTime<chrono::FixedOffset>>) = sqlx::query_as(
        "SELECT is_subscribed, timestamp_last_subscription FROM mqtt_topic_by_subscriber
         WHERE topic_id = $1 AND subscriber_id = $2",
    )
    .bind(topic_id)
    .bind(subscriber_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(!is_subscribed);
    // Unsubscribing must not clear the last-subscription timestamp.
    assert_eq!(ts, ts_after);

    cleanup_broker(&pool, broker_id).await;
    cleanup_decoder(&pool, decoder_id).await;
}

#[tokio::test]
async fn test_ensure_decoder_registered_is_idempotent() {
    let (repo, pool) = create_repository().await;

    repo.ensure_decoder_registered(
        "acq_test_ensure_decoder",
        "built-in test decoder",
        &["value".to_string(), "unit".to_string()],
    )
    .await
    .unwrap();
    // Calling twice must not duplicate the decoder row or its fields.
    repo.ensure_decoder_registered(
        "acq_test_ensure_decoder",
        "built-in test decoder",
        &["value".to_string(), "unit".to_string()],
    )
    .await
    .unwrap();

    let decoder_id: i64 = sqlx::query_scalar!(
        "SELECT id FROM mqtt_payload_decoder WHERE name = $1",
        "acq_test_ensure_decoder"
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let field_count: i64 = sqlx::query_scalar!(
        "SELECT COUNT(*) FROM mqtt_payload_field WHERE payload_decoder_id = $1",
        decoder_id
    )
    .fetch_one(&pool)
    .await
    .unwrap()
    .unwrap_or(0);
    assert_eq!(field_count, 2);

    cleanup_decoder(&pool, decoder_id).await;
}
