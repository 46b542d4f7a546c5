use std::collections::HashMap;

use domain::error::PayloadDecoderError;
use domain::{DecodedMessage, Decoder};

/// Generic vendor-JSON decoder family: extracts a receive timestamp from a
/// nested `rxInfo[0].time` path and delegates value extraction to a closure
/// (`spec.md` §4.2 "generic vendor JSON family"; grounded on
/// `original_source/.../decoders/chirpstack.py`).
///
/// Concrete decoders in the original source are examples of the contract;
/// this implementation keeps one representative family member
/// (temperature/humidity) rather than enumerating every vendor model.
pub struct ChirpstackEm300ThDecoder {
    fields: Vec<String>,
}

impl ChirpstackEm300ThDecoder {
    pub fn new() -> Self {
        Self {
            fields: vec!["temperature".to_string(), "humidity".to_string()],
        }
    }

    fn decode_values(json_payload: &serde_json::Value) -> Result<HashMap<String, f64>, PayloadDecoderError> {
        let object = json_payload.get("objectJSON").ok_or_else(|| {
            PayloadDecoderError::DecodeFailed("missing \"objectJSON\" field".to_string())
        })?;
        let temperature = object
            .get("temperature")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| PayloadDecoderError::DecodeFailed("missing \"temperature\"".to_string()))?;
        let humidity = object
            .get("humidity")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| PayloadDecoderError::DecodeFailed("missing \"humidity\"".to_string()))?;

        let mut values = HashMap::new();
        values.insert("temperature".to_string(), temperature);
        values.insert("humidity".to_string(), humidity);
        Ok(values)
    }
}

impl Default for ChirpstackEm300ThDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChirpstackEm300ThDecoder {
    fn name(&self) -> &str {
        "chirpstack_EM300-TH-868"
    }

    fn description(&self) -> &str {
        "Chirpstack payload decoder for EM300-TH-868 devices"
    }

    fn fields(&self) -> &[String] {
        &self.fields
    }

    fn decode(&self, raw: &[u8]) -> Result<DecodedMessage, PayloadDecoderError> {
        let payload: serde_json::Value = serde_json::from_slice(raw)
            .map_err(|e| PayloadDecoderError::DecodeFailed(e.to_string()))?;

        // example: 2021-04-16T14:03:13.432986Z
        let raw_time = payload
            .get("rxInfo")
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .and_then(|rx| rx.get("time"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PayloadDecoderError::DecodeFailed("missing \"rxInfo[0].time\"".to_string())
            })?;
        let raw_time = raw_time.replace('Z', "+00:00");
        let timestamp = chrono::DateTime::parse_from_rfc3339(&raw_time)
            .map_err(|e| PayloadDecoderError::DecodeFailed(e.to_string()))?
            .with_timezone(&chrono::Utc);

        let values = Self::decode_values(&payload)?;
        Ok((timestamp, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = br#"{
        "rxInfo": [{"time": "2021-04-16T14:03:13.432986Z"}],
        "objectJSON": {"temperature": 21.5, "humidity": 48.0}
    }"#;

    #[test]
    fn test_decode_extracts_nested_receive_time() {
        let d = ChirpstackEm300ThDecoder::new();
        let (ts, values) = d.decode(PAYLOAD).unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-04-16T14:03:13.432986+00:00");
        assert_eq!(values.get("temperature"), Some(&21.5));
        assert_eq!(values.get("humidity"), Some(&48.0));
    }

    #[test]
    fn test_decode_missing_rx_info_fails() {
        let d = ChirpstackEm300ThDecoder::new();
        assert!(d.decode(br#"{"objectJSON": {"temperature": 1, "humidity": 2}}"#).is_err());
    }

    #[test]
    fn test_fields() {
        let d = ChirpstackEm300ThDecoder::new();
        assert_eq!(
            d.fields(),
            &["temperature".to_string(), "humidity".to_string()]
        );
    }
}
