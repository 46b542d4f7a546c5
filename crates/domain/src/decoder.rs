use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::PayloadDecoderError;

/// A decoded message: the extracted receive timestamp and a
/// field-name-to-numeric-value map (`spec.md` §4.2, GLOSSARY).
pub type DecodedMessage = (DateTime<Utc>, HashMap<String, f64>);

/// The pluggable payload decoder contract (`spec.md` §4.2).
///
/// Per REDESIGN FLAGS §9, `on_message` is deliberately **not** part of this
/// trait: it is common behavior owned by the acquisition engine, which takes
/// a `&dyn Decoder` as a parameter rather than letting decoders override the
/// dispatch routine themselves.
pub trait Decoder: Send + Sync {
    /// Unique, stable decoder name (used as the `PayloadDecoder.name` key).
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Ordered list of output field names this decoder produces.
    fn fields(&self) -> &[String];

    /// Decode a raw MQTT payload into `(timestamp, {field: value})`.
    fn decode(&self, raw: &[u8]) -> Result<DecodedMessage, PayloadDecoderError>;
}
