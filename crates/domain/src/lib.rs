//! Domain layer - Pure business logic with no external dependencies
//!
//! This crate contains:
//! - Entities (`Broker`, `Subscriber`, `Topic`, `Timeseries`, `Event`)
//! - Repository interfaces (traits)
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Business rules enforced at domain level
//! - Rich domain models with behavior
//! - Testable in isolation

pub mod acquisition_repository;
pub mod decoder;
pub mod error;
pub mod event_repository;
pub mod model;
pub mod store;

// Re-export commonly used types
pub use acquisition_repository::AcquisitionRepository;
pub use decoder::{DecodedMessage, Decoder};
pub use error::DomainError;
pub use event_repository::EventRepository;
pub use model::{
    Broker, Event, EventState, PayloadDecoder, PayloadField, ProtocolVersion, SessionState,
    Subscriber, Timeseries, TlsVerifyMode, Topic, TopicByBroker, TopicBySubscriber, TopicLink,
    Transport,
};
pub use store::{Aggregation, Store};
