use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// A persisted, named field produced by a `PayloadDecoder`
/// (`spec.md` §3). Unique per decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadField {
    pub id: Option<i64>,
    pub payload_decoder_id: i64,
    pub name: String,
}

/// A registered decoder's persisted metadata (`spec.md` §3, §4.2).
///
/// This is the storage-side counterpart of the `Decoder` trait contract
/// (`crate::decoder::Decoder`): registration copies `name`/`description`
/// and one `PayloadField` row per declared field. Owns its fields
/// (cascade delete); deletion is refused while any `Topic` references it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadDecoder {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
}

impl PayloadDecoder {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::InvalidPayloadDecoder(
                "name cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id: None,
            name,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let d = PayloadDecoder::new("bemserver", Some("default JSON decoder".into())).unwrap();
        assert_eq!(d.name, "bemserver");
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(PayloadDecoder::new("", None).is_err());
    }
}
