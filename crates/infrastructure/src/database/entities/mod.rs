pub mod event;
pub mod event_category;
pub mod event_level;
pub mod event_state;
pub mod event_target;
pub mod mqtt_broker;
pub mod mqtt_payload_decoder;
pub mod mqtt_payload_field;
pub mod mqtt_subscriber;
pub mod mqtt_topic;
pub mod mqtt_topic_by_broker;
pub mod mqtt_topic_by_subscriber;
pub mod mqtt_topic_link;
pub mod timeseries;
pub mod timeseries_data;
