//! Decoder Registry (`spec.md` §4.2).
//!
//! Process-wide, name-keyed map of registered decoders, built once at
//! service construction (REDESIGN FLAGS §9: "the decoder registry becomes an
//! immutable map built at service construction; no late registration").

pub mod bemserver;
pub mod chirpstack;

use std::collections::HashMap;
use std::sync::Arc;

use domain::error::PayloadDecoderError;
use domain::Decoder;

use bemserver::BemServerDecoder;
use chirpstack::ChirpstackEm300ThDecoder;

/// Immutable registry of decoders keyed by `Decoder::name()`.
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: Arc<HashMap<String, Arc<dyn Decoder>>>,
}

impl DecoderRegistry {
    /// Builds the registry with the spec's required built-ins: the
    /// `bemserver` JSON decoder and the Chirpstack vendor-JSON family
    /// (`spec.md` §4.2).
    pub fn with_builtins() -> Self {
        let mut builder = RegistryBuilder::new();
        builder.register(Arc::new(BemServerDecoder::new()));
        builder.register(Arc::new(ChirpstackEm300ThDecoder::new()));
        builder.build()
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Decoder>, PayloadDecoderError> {
        self.decoders
            .get(name)
            .cloned()
            .ok_or_else(|| PayloadDecoderError::NotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Decoder>> {
        self.decoders.values()
    }
}

/// Builder used only at construction time; registration is idempotent
/// (registering the same name twice keeps the last one).
pub struct RegistryBuilder {
    decoders: HashMap<String, Arc<dyn Decoder>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    pub fn register(&mut self, decoder: Arc<dyn Decoder>) -> &mut Self {
        self.decoders.insert(decoder.name().to_string(), decoder);
        self
    }

    pub fn build(self) -> DecoderRegistry {
        DecoderRegistry {
            decoders: Arc::new(self.decoders),
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = DecoderRegistry::with_builtins();
        assert!(registry.get("bemserver").is_ok());
        assert!(registry.get("chirpstack_EM300-TH-868").is_ok());
    }

    #[test]
    fn test_unknown_decoder_not_found() {
        let registry = DecoderRegistry::with_builtins();
        let err = registry.get("does-not-exist").unwrap_err();
        assert_eq!(err, PayloadDecoderError::NotFound("does-not-exist".to_string()));
    }

    #[test]
    fn test_registration_idempotent_keeps_last() {
        let mut builder = RegistryBuilder::new();
        builder.register(Arc::new(BemServerDecoder::new()));
        builder.register(Arc::new(BemServerDecoder::new()));
        let registry = builder.build();
        assert_eq!(registry.iter().count(), 1);
    }
}
