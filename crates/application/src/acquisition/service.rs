//! Service bootstrap/shutdown (`spec.md` §4.3.2).
//!
//! Grounded on `original_source/bemserver/services/acquisition_mqtt/service.py`'s
//! `Service.__init__/run/stop`: the exact step ordering (register decoders,
//! load enabled subscribers, connect each, flip `is_running`) is preserved;
//! `set_db_url` is not reproduced since this codebase wires its pool at
//! construction, not lazily.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use domain::acquisition_repository::AcquisitionRepository;
use domain::decoder::Decoder;
use domain::error::ServiceError;
use domain::model::{Broker, Subscriber, TopicLink};
use domain::store::Store;
use infrastructure::messaging::{SubscribeSpec, SubscriberClient};

use super::dispatch::on_message;
use crate::decoders::DecoderRegistry;

/// Per-topic routing info cached at connect time so the message loop
/// doesn't need to re-query the repository on every publish.
struct TopicRoute {
    decoder: Arc<dyn Decoder>,
    links: Vec<TopicLink>,
}

struct RunningSubscriber {
    subscriber_id: i64,
    topic_ids: Vec<i64>,
    client: SubscriberClient,
    message_loop: JoinHandle<()>,
}

/// Orchestrates the acquisition engine's bootstrap/shutdown lifecycle
/// across all enabled subscribers (`spec.md` §4.3.2).
pub struct Service {
    repository: Arc<dyn AcquisitionRepository>,
    store: Arc<dyn Store>,
    decoders: DecoderRegistry,
    working_dir: PathBuf,
    running: Vec<RunningSubscriber>,
    is_running: bool,
}

impl Service {
    pub fn new(
        repository: Arc<dyn AcquisitionRepository>,
        store: Arc<dyn Store>,
        decoders: DecoderRegistry,
        working_dir: PathBuf,
    ) -> Self {
        Self {
            repository,
            store,
            decoders,
            working_dir,
            running: Vec::new(),
            is_running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// `spec.md` §4.3.2 `Service.run(client_id)` steps 2-5 (step 1, setting
    /// the backing database URL, is the caller's responsibility at
    /// construction in this codebase).
    pub async fn run(&mut self, client_id: &str) -> Result<(), ServiceError> {
        for decoder in self.decoders.iter() {
            if let Err(e) = self
                .repository
                .ensure_decoder_registered(decoder.name(), decoder.description(), decoder.fields())
                .await
            {
                warn!(decoder = decoder.name(), error = %e, "failed to persist decoder registration");
            }
        }

        let subscribers = self
            .repository
            .list_enabled_subscribers()
            .await
            .map_err(|e| ServiceError::ConfigUnavailable(e.to_string()))?;
        if subscribers.is_empty() {
            return Err(ServiceError::NoEnabledSubscribers);
        }

        for subscriber in subscribers {
            match self.connect_subscriber(&subscriber, client_id).await {
                Ok(running) => self.running.push(running),
                Err(e) => error!(
                    subscriber_id = subscriber.id,
                    error = %e,
                    "failed to connect subscriber, skipping"
                ),
            }
        }

        self.is_running = true;
        Ok(())
    }

    async fn connect_subscriber(
        &self,
        subscriber: &Subscriber,
        client_id: &str,
    ) -> anyhow::Result<RunningSubscriber> {
        let broker = self.repository.broker(subscriber.broker_id).await?;
        let tls_cert_path = if broker.use_tls {
            Some(self.materialize_certificate(&broker)?)
        } else {
            None
        };

        let topics = self
            .repository
            .topics_for_subscriber(subscriber.id.unwrap_or_default())
            .await?;
        let mut routes = HashMap::new();
        let mut subscribe_specs = Vec::new();
        let mut topic_ids = Vec::new();
        for topic in &topics {
            if !topic.is_enabled {
                continue;
            }
            let decoder_row = self.repository.decoder_for_topic(topic.id.unwrap_or_default()).await?;
            let decoder = self.decoders.get(&decoder_row.name)?;
            let links = self.repository.links_for_topic(topic.id.unwrap_or_default()).await?;
            routes.insert(topic.name.clone(), TopicRoute { decoder, links });
            subscribe_specs.push(SubscribeSpec {
                name: topic.name.clone(),
                qos: topic.qos,
            });
            topic_ids.push(topic.id.unwrap_or_default());
        }

        let client = SubscriberClient::connect(
            &broker,
            client_id,
            subscriber.keep_alive,
            subscriber.use_persistent_session,
            subscriber.session_expiry,
            subscriber.username.as_deref(),
            subscriber.password.as_deref(),
            tls_cert_path,
            &subscribe_specs,
        )
        .await?;

        if let Some(id) = subscriber.id {
            self.repository.mark_subscriber_connected(id, Utc::now()).await?;
            for topic_id in &topic_ids {
                if let Err(e) = self
                    .repository
                    .update_subscription_state(*topic_id, id, true, Utc::now())
                    .await
                {
                    warn!(topic_id, subscriber_id = id, error = %e, "failed to persist subscription state");
                }
            }
        }

        let mut messages = client.messages();
        let store = self.store.clone();
        let subscriber_id = subscriber.id.unwrap_or_default();
        let message_loop = tokio::spawn(async move {
            loop {
                match messages.recv().await {
                    Ok(msg) => {
                        let Some(route) = routes.get(&msg.topic) else {
                            continue;
                        };
                        on_message(route.decoder.as_ref(), &route.links, &msg.payload, store.as_ref(), Utc::now())
                            .await;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(subscriber_id, skipped, "message loop lagged behind broadcast channel");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(RunningSubscriber {
            subscriber_id,
            topic_ids,
            client,
            message_loop,
        })
    }

    fn materialize_certificate(&self, broker: &Broker) -> anyhow::Result<PathBuf> {
        let cert = broker
            .tls_certificate
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("broker {} has use_tls but no certificate content", broker.host))?;
        let path = self.working_dir.join(broker.tls_certificate_filename());
        std::fs::write(&path, cert)?;
        Ok(path)
    }

    /// `spec.md` §4.3.2 `Service.stop()`.
    pub async fn stop(&mut self) {
        for running in self.running.drain(..) {
            running.message_loop.abort();
            if let Err(e) = running.client.disconnect().await {
                warn!(subscriber_id = running.subscriber_id, error = %e, "disconnect did not complete cleanly, force-dropping");
            }
            if let Err(e) = self
                .repository
                .mark_subscriber_disconnected(running.subscriber_id)
                .await
            {
                warn!(subscriber_id = running.subscriber_id, error = %e, "failed to persist disconnected state");
            }
            for topic_id in &running.topic_ids {
                if let Err(e) = self
                    .repository
                    .update_subscription_state(*topic_id, running.subscriber_id, false, Utc::now())
                    .await
                {
                    warn!(topic_id, subscriber_id = running.subscriber_id, error = %e, "failed to persist unsubscription state");
                }
            }
        }
        self.is_running = false;
        info!("acquisition service stopped");
    }
}
