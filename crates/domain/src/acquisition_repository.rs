use async_trait::async_trait;

use crate::error::DomainError;
use crate::model::{Broker, PayloadDecoder, Subscriber, Topic, TopicLink};

/// Read access to the acquisition configuration graph
/// (`Subscriber -> Broker`, `Subscriber -> Topic -> PayloadDecoder/TopicLink`)
/// needed by `Service.run` (`spec.md` §4.3.2).
///
/// Split out from `Store` because it is schema/config metadata, not
/// timeseries data: the acquisition engine reads it once at bootstrap,
/// while `Store` is on the per-message hot path.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait AcquisitionRepository: Send + Sync {
    async fn list_enabled_subscribers(&self) -> Result<Vec<Subscriber>, DomainError>;
    async fn broker(&self, broker_id: i64) -> Result<Broker, DomainError>;
    async fn topics_for_subscriber(&self, subscriber_id: i64) -> Result<Vec<Topic>, DomainError>;
    async fn decoder_for_topic(&self, topic_id: i64) -> Result<PayloadDecoder, DomainError>;
    async fn links_for_topic(&self, topic_id: i64) -> Result<Vec<TopicLink>, DomainError>;

    /// `spec.md` §4.2 "A registered decoder may also be persisted": ensures
    /// a `PayloadDecoder` row (and its `PayloadField` rows) exist for every
    /// built-in decoder. Insert-if-missing; never removes.
    async fn ensure_decoder_registered(
        &self,
        name: &str,
        description: &str,
        fields: &[String],
    ) -> Result<(), DomainError>;

    async fn mark_subscriber_connected(
        &self,
        subscriber_id: i64,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), DomainError>;
    async fn mark_subscriber_disconnected(&self, subscriber_id: i64) -> Result<(), DomainError>;

    /// Persists `TopicBySubscriber::update_subscription`'s result
    /// (`spec.md` §8 "subscription state convergence"): called once per
    /// topic on successful subscribe and again on disconnect.
    async fn update_subscription_state(
        &self,
        topic_id: i64,
        subscriber_id: i64,
        is_subscribed: bool,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), DomainError>;
}
