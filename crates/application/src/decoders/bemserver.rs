use domain::{DecodedMessage, Decoder};
use domain::error::PayloadDecoderError;

/// Default payload decoder: `{"ts": "<ISO-8601>", "value": <number>}`
/// (`spec.md` §4.2, §6, grounded on
/// `original_source/.../decoders/bemserver.py`).
pub struct BemServerDecoder {
    fields: Vec<String>,
}

impl BemServerDecoder {
    pub fn new() -> Self {
        Self {
            fields: vec!["value".to_string()],
        }
    }
}

impl Default for BemServerDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BemServerDecoder {
    fn name(&self) -> &str {
        "bemserver"
    }

    fn description(&self) -> &str {
        "Default BEMServer JSON payload decoder"
    }

    fn fields(&self) -> &[String] {
        &self.fields
    }

    fn decode(&self, raw: &[u8]) -> Result<DecodedMessage, PayloadDecoderError> {
        let payload: serde_json::Value = serde_json::from_slice(raw)
            .map_err(|e| PayloadDecoderError::DecodeFailed(e.to_string()))?;

        let ts_str = payload
            .get("ts")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PayloadDecoderError::DecodeFailed("missing \"ts\" field".to_string()))?;
        let ts_str = ts_str.replace('Z', "+00:00");
        let timestamp = chrono::DateTime::parse_from_rfc3339(&ts_str)
            .map_err(|e| PayloadDecoderError::DecodeFailed(e.to_string()))?
            .with_timezone(&chrono::Utc);

        let value = payload
            .get("value")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| {
                PayloadDecoderError::DecodeFailed("missing or non-numeric \"value\" field".to_string())
            })?;

        let mut values = std::collections::HashMap::new();
        values.insert("value".to_string(), value);
        Ok((timestamp, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_offset() {
        let d = BemServerDecoder::new();
        let (ts, values) = d
            .decode(br#"{"ts":"2021-04-27T16:05:11+00:00","value":42}"#)
            .unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-04-27T16:05:11+00:00");
        assert_eq!(values.get("value"), Some(&42.0));
    }

    #[test]
    fn test_decode_with_z_suffix() {
        let d = BemServerDecoder::new();
        let (_, values) = d
            .decode(br#"{"ts":"2021-04-16T14:03:13Z","value":3.5}"#)
            .unwrap();
        assert_eq!(values.get("value"), Some(&3.5));
    }

    #[test]
    fn test_decode_invalid_json_fails() {
        let d = BemServerDecoder::new();
        assert!(d.decode(b"not json").is_err());
    }

    #[test]
    fn test_decode_missing_value_fails() {
        let d = BemServerDecoder::new();
        assert!(d.decode(br#"{"ts":"2021-04-27T16:05:11Z"}"#).is_err());
    }

    #[test]
    fn test_fields_and_name() {
        let d = BemServerDecoder::new();
        assert_eq!(d.name(), "bemserver");
        assert_eq!(d.fields(), &["value".to_string()]);
    }
}
