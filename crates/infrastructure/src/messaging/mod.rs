pub mod subscriber_client;

pub use subscriber_client::{MqttMessage, SubscribeSpec, SubscriberClient};
