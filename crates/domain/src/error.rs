use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid timeseries name: {0}")]
    InvalidTimeseriesName(String),

    #[error("Invalid broker configuration: {0}")]
    InvalidBrokerConfig(String),

    #[error("Invalid subscriber configuration: {0}")]
    InvalidSubscriberConfig(String),

    #[error("Invalid topic configuration: {0}")]
    InvalidTopicConfig(String),

    #[error("Invalid payload decoder: {0}")]
    InvalidPayloadDecoder(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

/// Acquisition service errors (`spec.md` §7 `ServiceError`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("no enabled subscribers available to run MQTT acquisition")]
    NoEnabledSubscribers,

    #[error("invalid working directory: {0}")]
    InvalidWorkingDir(String),

    #[error("acquisition configuration could not be loaded: {0}")]
    ConfigUnavailable(String),
}

/// Payload decoder errors (`spec.md` §7).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadDecoderError {
    #[error("payload could not be decoded: {0}")]
    DecodeFailed(String),

    #[error("no topic bound to this decoder instance")]
    NoTopicBound,

    #[error("payload decoder not found: {0}")]
    NotFound(String),

    #[error("payload decoder registration failed: {0}")]
    RegistrationFailed(String),
}

/// Event lifecycle errors (`spec.md` §4.4, §7).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    #[error("a closed event cannot be extended")]
    ExtendClosed,

    #[error("missing `state` filter for list_by_state")]
    MissingStateFilter,
}

/// CSV import/export errors (`spec.md` §4.5, §7, REDESIGN FLAGS §9).
///
/// One variant per failure cause, matching the "early-return error values
/// with a single variant tagging the cause" redesign guidance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeseriesCSVIOError {
    #[error("missing headers line")]
    MissingHeader,

    #[error("first column must be \"Datetime\"")]
    BadHeader,

    #[error("unknown timeseries id: {0}")]
    UnknownId(String),

    #[error("row has fewer columns than the header")]
    ShortRow,

    #[error("non-numeric value: {0}")]
    BadValue(String),

    #[error("storage error: {0}")]
    Storage(String),
}
