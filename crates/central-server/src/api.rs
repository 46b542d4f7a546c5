use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{
        IntoResponse, Json,
        sse::{Event as SseEvent, Sse},
    },
    routing::{get, post},
};
use chrono::{DateTime, Duration, Utc};
use futures::Stream;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;
use std::{sync::Arc, time::Duration as StdDuration};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::{Any, CorsLayer};

use application::{csv_io, events};
use domain::model::{EventState, Timeseries};
use domain::store::Aggregation;
use infrastructure::database::entities::timeseries;

use crate::state::{AppState, EventNotification};

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/timeseries-data/", get(export_raw).post(import_csv))
        .route("/timeseries-data/aggregate", get(export_aggregate))
        .route("/timeseries", get(list_timeseries).post(create_timeseries))
        .route(
            "/timeseries/{id}",
            get(get_timeseries).put(update_timeseries).delete(delete_timeseries),
        )
        .route("/events", get(sse_handler))
        .route("/events/list", get(list_events))
        .layer(cors)
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct RangeQuery {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    /// Comma-separated timeseries ids; the wire contract's repeated
    /// `timeseries=<id>&timeseries=<id>` form needs a query-string crate
    /// this codebase does not otherwise depend on, so the HTTP shim accepts
    /// the equivalent comma-joined list instead.
    timeseries: String,
}

fn parse_ids(raw: &str) -> Result<Vec<i64>, String> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim().parse::<i64>().map_err(|e| e.to_string()))
        .collect()
}

async fn export_raw(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> impl IntoResponse {
    let ids = match parse_ids(&query.timeseries) {
        Ok(ids) => ids,
        Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e).into_response(),
    };

    match csv_io::export_csv(state.store.as_ref(), query.start_time, query.end_time, &ids).await {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=timeseries.csv".to_string(),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

#[derive(serde::Deserialize)]
struct AggregateQuery {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    timeseries: String,
    bucket_width_secs: i64,
    #[serde(default = "default_timezone")]
    timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

async fn export_aggregate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AggregateQuery>,
) -> impl IntoResponse {
    let ids = match parse_ids(&query.timeseries) {
        Ok(ids) => ids,
        Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e).into_response(),
    };
    let tz: chrono_tz::Tz = match query.timezone.parse() {
        Ok(tz) => tz,
        Err(_) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("unknown timezone: {}", query.timezone),
            )
                .into_response();
        }
    };

    match csv_io::export_csv_bucket(
        state.store.as_ref(),
        query.start_time,
        query.end_time,
        &ids,
        Duration::seconds(query.bucket_width_secs),
        tz,
        Aggregation::Avg,
    )
    .await
    {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=timeseries.csv".to_string(),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

async fn import_csv(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("csv_file") {
            continue;
        }
        let body = match field.text().await {
            Ok(body) => body,
            Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
        };

        return match csv_io::import_csv(state.store.as_ref(), &body).await {
            Ok(inserted) => (
                StatusCode::CREATED,
                Json(json!({ "points_inserted": inserted })),
            )
                .into_response(),
            Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
        };
    }

    (
        StatusCode::UNPROCESSABLE_ENTITY,
        "missing csv_file field".to_string(),
    )
        .into_response()
}

async fn list_timeseries(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match timeseries::Entity::find().all(&state.db).await {
        Ok(rows) => Json(json!(rows)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn get_timeseries(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match timeseries::Entity::find_by_id(id).one(&state.db).await {
        Ok(Some(row)) => Json(json!(row)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "timeseries not found".to_string()).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[derive(serde::Deserialize)]
struct TimeseriesPayload {
    name: String,
    description: Option<String>,
    unit: Option<String>,
    min_value: Option<f64>,
    max_value: Option<f64>,
}

async fn create_timeseries(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TimeseriesPayload>,
) -> impl IntoResponse {
    let validated = match Timeseries::new(
        payload.name,
        payload.description,
        payload.unit,
        payload.min_value,
        payload.max_value,
    ) {
        Ok(ts) => ts,
        Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    };

    let active_model = timeseries::ActiveModel {
        id: sea_orm::NotSet,
        name: Set(validated.name),
        description: Set(validated.description),
        unit: Set(validated.unit),
        min_value: Set(validated.min_value),
        max_value: Set(validated.max_value),
    };

    match active_model.insert(&state.db).await {
        Ok(row) => (StatusCode::CREATED, Json(json!(row))).into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

async fn update_timeseries(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TimeseriesPayload>,
) -> impl IntoResponse {
    let existing = match timeseries::Entity::find_by_id(id).one(&state.db).await {
        Ok(Some(row)) => row,
        Ok(None) => return (StatusCode::NOT_FOUND, "timeseries not found".to_string()).into_response(),
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    let validated = match Timeseries::new(
        payload.name,
        payload.description,
        payload.unit,
        payload.min_value,
        payload.max_value,
    ) {
        Ok(ts) => ts,
        Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    };

    let mut active_model: timeseries::ActiveModel = existing.into();
    active_model.name = Set(validated.name);
    active_model.description = Set(validated.description);
    active_model.unit = Set(validated.unit);
    active_model.min_value = Set(validated.min_value);
    active_model.max_value = Set(validated.max_value);

    match active_model.update(&state.db).await {
        Ok(row) => Json(json!(row)).into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

async fn delete_timeseries(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match timeseries::Entity::delete_by_id(id).exec(&state.db).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    }
}

#[derive(serde::Deserialize)]
struct EventListQuery {
    state: Option<String>,
    category: Option<String>,
    source: Option<String>,
    level: Option<String>,
    target_type: Option<String>,
    target_id: Option<i64>,
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventListQuery>,
) -> impl IntoResponse {
    let states: Vec<EventState> = match query.state.as_deref() {
        None => vec![EventState::New, EventState::Ongoing],
        Some(raw) => {
            let mut parsed = Vec::new();
            for part in raw.split(',') {
                match part.trim() {
                    "NEW" => parsed.push(EventState::New),
                    "ONGOING" => parsed.push(EventState::Ongoing),
                    "CLOSED" => parsed.push(EventState::Closed),
                    other => {
                        return (
                            StatusCode::UNPROCESSABLE_ENTITY,
                            format!("unknown state: {other}"),
                        )
                            .into_response();
                    }
                }
            }
            parsed
        }
    };

    match events::list_by_state(
        state.event_repository.as_ref(),
        &states,
        query.category.as_deref(),
        query.source.as_deref(),
        query.level.as_deref(),
        query.target_type.as_deref(),
        query.target_id,
    )
    .await
    {
        Ok(list) => Json(json!(list)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<SseEvent, axum::Error>>> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).map(|msg: Result<EventNotification, _>| match msg {
        Ok(event) => SseEvent::default()
            .json_data(event)
            .map_err(|_| axum::Error::new("serialization error")),
        Err(_) => Ok(SseEvent::default().comment("keep-alive")),
    });

    Sse::new(stream)
        .keep_alive(axum::response::sse::KeepAlive::new().interval(StdDuration::from_secs(15)))
}
