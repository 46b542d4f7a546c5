use crate::database::entities::{
    mqtt_broker, mqtt_payload_decoder, mqtt_payload_field, mqtt_subscriber, mqtt_topic,
    mqtt_topic_by_subscriber, mqtt_topic_link,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use domain::acquisition_repository::AcquisitionRepository;
use domain::error::DomainError;
use domain::model::{
    Broker, PayloadDecoder, ProtocolVersion, Subscriber, TlsVerifyMode, Topic, TopicBySubscriber,
    TopicLink, Transport,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Sea-orm-backed bootstrap-configuration reads (`spec.md` §4.3.2): the
/// `Subscriber`/`Broker`/`Topic`/`PayloadDecoder`/`TopicLink` graph is read
/// once per `Service::run` and is a plain CRUD shape, unlike the `Store`
/// timeseries hot path.
pub struct SeaOrmAcquisitionRepository {
    db: DatabaseConnection,
}

impl SeaOrmAcquisitionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn to_offset(dt: DateTime<Utc>) -> DateTime<FixedOffset> {
        dt.with_timezone(&FixedOffset::east_opt(0).unwrap())
    }

    fn model_to_subscriber(model: mqtt_subscriber::Model) -> Subscriber {
        let mut subscriber = Subscriber::new(
            model.broker_id,
            model.is_enabled,
            model.keep_alive as u16,
            model.use_persistent_session,
            model.session_expiry as u32,
            model.username,
            model.password,
            false,
        )
        .expect("persisted subscriber rows were validated on write");
        subscriber.id = Some(model.id);
        if model.is_connected {
            subscriber.mark_connected(
                model
                    .timestamp_last_connection
                    .map(|ts| ts.with_timezone(&Utc))
                    .unwrap_or_else(Utc::now),
            );
        }
        subscriber
    }

    fn model_to_broker(model: mqtt_broker::Model) -> Result<Broker, DomainError> {
        let protocol_version = match model.protocol_version.as_str() {
            "3.1" => ProtocolVersion::V3_1,
            "3.1.1" => ProtocolVersion::V3_1_1,
            "5" => ProtocolVersion::V5,
            other => {
                return Err(DomainError::InvalidBrokerConfig(format!(
                    "unknown protocol_version: {other}"
                )));
            }
        };
        let transport = match model.transport.as_str() {
            "tcp" => Transport::Tcp,
            "websockets" => Transport::Websockets,
            other => {
                return Err(DomainError::InvalidBrokerConfig(format!(
                    "unknown transport: {other}"
                )));
            }
        };
        let tls_verifymode = match model.tls_verifymode.as_deref() {
            None => None,
            Some("none") => Some(TlsVerifyMode::None),
            Some("optional") => Some(TlsVerifyMode::Optional),
            Some("required") => Some(TlsVerifyMode::Required),
            Some(other) => {
                return Err(DomainError::InvalidBrokerConfig(format!(
                    "unknown tls_verifymode: {other}"
                )));
            }
        };

        let mut broker = Broker::new(
            model.host,
            model.port as u16,
            protocol_version,
            transport,
            model.is_auth_required,
            model.use_tls,
            model.tls_version,
            tls_verifymode,
            model.tls_certificate,
        )?;
        broker.id = Some(model.id);
        Ok(broker)
    }

    fn model_to_topic(model: mqtt_topic::Model) -> Result<Topic, DomainError> {
        let mut topic = Topic::new(
            model.name,
            model.qos as u8,
            model.description,
            model.payload_decoder_id,
            model.is_enabled,
        )?;
        topic.id = Some(model.id);
        Ok(topic)
    }
}

#[async_trait]
impl AcquisitionRepository for SeaOrmAcquisitionRepository {
    async fn list_enabled_subscribers(&self) -> Result<Vec<Subscriber>, DomainError> {
        let models = mqtt_subscriber::Entity::find()
            .filter(mqtt_subscriber::Column::IsEnabled.eq(true))
            .order_by_asc(mqtt_subscriber::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(models.into_iter().map(Self::model_to_subscriber).collect())
    }

    async fn broker(&self, broker_id: i64) -> Result<Broker, DomainError> {
        let model = mqtt_broker::Entity::find_by_id(broker_id)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?
            .ok_or_else(|| DomainError::InvalidBrokerConfig(format!("broker {broker_id} not found")))?;

        Self::model_to_broker(model)
    }

    async fn topics_for_subscriber(&self, subscriber_id: i64) -> Result<Vec<Topic>, DomainError> {
        let models = mqtt_topic::Entity::find()
            .inner_join(mqtt_topic_by_subscriber::Entity)
            .filter(mqtt_topic_by_subscriber::Column::SubscriberId.eq(subscriber_id))
            .filter(mqtt_topic_by_subscriber::Column::IsEnabled.eq(true))
            .filter(mqtt_topic::Column::IsEnabled.eq(true))
            .order_by_asc(mqtt_topic::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        models.into_iter().map(Self::model_to_topic).collect()
    }

    async fn decoder_for_topic(&self, topic_id: i64) -> Result<PayloadDecoder, DomainError> {
        let topic = mqtt_topic::Entity::find_by_id(topic_id)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?
            .ok_or_else(|| DomainError::InvalidTopicConfig(format!("topic {topic_id} not found")))?;

        let model = mqtt_payload_decoder::Entity::find_by_id(topic.payload_decoder_id)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?
            .ok_or_else(|| {
                DomainError::InvalidPayloadDecoder(format!(
                    "decoder {} not found",
                    topic.payload_decoder_id
                ))
            })?;

        let mut decoder = PayloadDecoder::new(model.name, model.description)?;
        decoder.id = Some(model.id);
        Ok(decoder)
    }

    async fn links_for_topic(&self, topic_id: i64) -> Result<Vec<TopicLink>, DomainError> {
        let models = mqtt_topic_link::Entity::find()
            .filter(mqtt_topic_link::Column::TopicId.eq(topic_id))
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(models
            .into_iter()
            .map(|m| TopicLink {
                topic_id: m.topic_id,
                payload_field_id: m.payload_field_id,
                timeseries_id: m.timeseries_id,
            })
            .collect())
    }

    async fn ensure_decoder_registered(
        &self,
        name: &str,
        description: &str,
        fields: &[String],
    ) -> Result<(), DomainError> {
        let existing = mqtt_payload_decoder::Entity::find()
            .filter(mqtt_payload_decoder::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        let decoder_id = match existing {
            Some(model) => model.id,
            None => {
                let active_model = mqtt_payload_decoder::ActiveModel {
                    id: sea_orm::NotSet,
                    name: Set(name.to_string()),
                    description: Set(Some(description.to_string())),
                };
                mqtt_payload_decoder::Entity::insert(active_model)
                    .exec(&self.db)
                    .await
                    .map_err(|e| DomainError::Storage(e.to_string()))?
                    .last_insert_id
            }
        };

        let existing_fields = mqtt_payload_field::Entity::find()
            .filter(mqtt_payload_field::Column::PayloadDecoderId.eq(decoder_id))
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        let existing_names: std::collections::HashSet<String> =
            existing_fields.into_iter().map(|f| f.name).collect();

        for field in fields {
            if existing_names.contains(field) {
                continue;
            }
            let active_model = mqtt_payload_field::ActiveModel {
                id: sea_orm::NotSet,
                payload_decoder_id: Set(decoder_id),
                name: Set(field.clone()),
            };
            mqtt_payload_field::Entity::insert(active_model)
                .exec(&self.db)
                .await
                .map_err(|e| DomainError::Storage(e.to_string()))?;
        }

        Ok(())
    }

    async fn mark_subscriber_connected(
        &self,
        subscriber_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let model = mqtt_subscriber::Entity::find_by_id(subscriber_id)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?
            .ok_or_else(|| {
                DomainError::InvalidSubscriberConfig(format!("subscriber {subscriber_id} not found"))
            })?;

        let mut active_model: mqtt_subscriber::ActiveModel = model.into();
        active_model.is_connected = Set(true);
        active_model.timestamp_last_connection = Set(Some(Self::to_offset(at)));
        active_model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn mark_subscriber_disconnected(&self, subscriber_id: i64) -> Result<(), DomainError> {
        let model = mqtt_subscriber::Entity::find_by_id(subscriber_id)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?
            .ok_or_else(|| {
                DomainError::InvalidSubscriberConfig(format!("subscriber {subscriber_id} not found"))
            })?;

        let mut active_model: mqtt_subscriber::ActiveModel = model.into();
        active_model.is_connected = Set(false);
        active_model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn update_subscription_state(
        &self,
        topic_id: i64,
        subscriber_id: i64,
        is_subscribed: bool,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let model = mqtt_topic_by_subscriber::Entity::find_by_id((topic_id, subscriber_id))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?
            .ok_or_else(|| {
                DomainError::InvalidTopicConfig(format!(
                    "topic {topic_id} is not linked to subscriber {subscriber_id}"
                ))
            })?;

        let mut link = TopicBySubscriber {
            topic_id: model.topic_id,
            subscriber_id: model.subscriber_id,
            is_subscribed: model.is_subscribed,
            timestamp_last_subscription: model
                .timestamp_last_subscription
                .map(|ts| ts.with_timezone(&Utc)),
            is_enabled: model.is_enabled,
        };
        link.update_subscription(is_subscribed, at);

        let mut active_model: mqtt_topic_by_subscriber::ActiveModel = model.into();
        active_model.is_subscribed = Set(link.is_subscribed);
        active_model.timestamp_last_subscription =
            Set(link.timestamp_last_subscription.map(Self::to_offset));
        active_model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(())
    }
}
