use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// An MQTT subject string bound to a decoder (`spec.md` §3).
///
/// Owns its `TopicLink`s and its broker/subscriber associations (cascade
/// delete at the storage layer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: Option<i64>,
    pub name: String,
    pub qos: u8,
    pub description: Option<String>,
    pub payload_decoder_id: i64,
    pub is_enabled: bool,
}

impl Topic {
    pub fn new(
        name: impl Into<String>,
        qos: u8,
        description: Option<String>,
        payload_decoder_id: i64,
        is_enabled: bool,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::InvalidTopicConfig(
                "name cannot be empty".to_string(),
            ));
        }
        if !matches!(qos, 0 | 1 | 2) {
            return Err(DomainError::InvalidTopicConfig(format!(
                "invalid QoS level: {qos}"
            )));
        }
        Ok(Self {
            id: None,
            name,
            qos,
            description,
            payload_decoder_id,
            is_enabled,
        })
    }
}

/// Binds a `Topic`, a named decoder-output field, and a target `Timeseries`
/// (`spec.md` §3, GLOSSARY). Composite primary key; unique per
/// `(topic, field)` and per `(topic, timeseries)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicLink {
    pub topic_id: i64,
    pub payload_field_id: i64,
    pub timeseries_id: i64,
}

/// One row per `(topic, broker)` pair (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicByBroker {
    pub topic_id: i64,
    pub broker_id: i64,
    pub is_enabled: bool,
}

/// One row per `(topic, subscriber)` pair (`spec.md` §3).
///
/// `timestamp_last_subscription` is only bumped on a transition *into*
/// `is_subscribed = true` (matches
/// `original_source/.../model/topic.py::update_subscription`), which is load
/// bearing for the "subscription state convergence" testable property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopicBySubscriber {
    pub topic_id: i64,
    pub subscriber_id: i64,
    pub is_subscribed: bool,
    pub timestamp_last_subscription: Option<DateTime<Utc>>,
    pub is_enabled: bool,
}

impl TopicBySubscriber {
    pub fn new(topic_id: i64, subscriber_id: i64) -> Self {
        Self {
            topic_id,
            subscriber_id,
            is_subscribed: false,
            timestamp_last_subscription: None,
            is_enabled: true,
        }
    }

    /// Update subscription status. Only records a new
    /// `timestamp_last_subscription` when `is_subscribed` transitions to
    /// `true`; unsubscribing clears the flag but leaves the timestamp.
    pub fn update_subscription(&mut self, is_subscribed: bool, at: DateTime<Utc>) {
        self.is_subscribed = is_subscribed;
        if is_subscribed {
            self.timestamp_last_subscription = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_new_valid() {
        let t = Topic::new("sensors/temp/1", 1, None, 42, true).unwrap();
        assert_eq!(t.qos, 1);
    }

    #[test]
    fn test_topic_invalid_qos() {
        assert!(Topic::new("sensors/temp/1", 9, None, 42, true).is_err());
    }

    #[test]
    fn test_topic_empty_name() {
        assert!(Topic::new("", 1, None, 42, true).is_err());
    }

    #[test]
    fn test_update_subscription_sets_timestamp_on_subscribe() {
        let mut link = TopicBySubscriber::new(1, 2);
        let t0 = Utc::now();
        link.update_subscription(true, t0);
        assert!(link.is_subscribed);
        assert_eq!(link.timestamp_last_subscription, Some(t0));
    }

    #[test]
    fn test_update_subscription_keeps_timestamp_on_unsubscribe() {
        let mut link = TopicBySubscriber::new(1, 2);
        let t0 = Utc::now();
        link.update_subscription(true, t0);
        link.update_subscription(false, Utc::now());
        assert!(!link.is_subscribed);
        // Unsubscribing does not clear the last-subscription timestamp.
        assert_eq!(link.timestamp_last_subscription, Some(t0));
    }
}
