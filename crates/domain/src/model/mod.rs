//! Persistent entities for the acquisition and timeseries I/O engines
//! (`spec.md` §3).

mod broker;
mod event;
mod payload_decoder;
mod subscriber;
mod timeseries;
mod timeseries_data;
mod topic;

pub use broker::{Broker, ProtocolVersion, Transport, TlsVerifyMode};
pub use event::{Event, EventState};
pub use payload_decoder::{PayloadDecoder, PayloadField};
pub use subscriber::{SessionState, Subscriber};
pub use timeseries::Timeseries;
pub use timeseries_data::{BucketedPoint, TimeseriesPoint};
pub use topic::{Topic, TopicByBroker, TopicBySubscriber, TopicLink};
