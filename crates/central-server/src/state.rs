use std::sync::Arc;

use domain::event_repository::EventRepository;
use domain::model::Event;
use domain::store::Store;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tokio::sync::broadcast;

/// Broadcast over the SSE stream whenever an `Event` transitions
/// (`spec.md` §6 HTTP surface: "SSE stream of newly opened/closed Events"),
/// repurposing `central-server`'s original tag-telemetry `SystemEvent`
/// broadcast for the new Event lifecycle.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum EventNotification {
    Opened(Event),
    Closed(Event),
}

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub event_repository: Arc<dyn EventRepository>,
    pub db: DatabaseConnection,
    pub event_tx: broadcast::Sender<EventNotification>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        event_repository: Arc<dyn EventRepository>,
        db: DatabaseConnection,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            store,
            event_repository,
            db,
            event_tx,
        }
    }
}
