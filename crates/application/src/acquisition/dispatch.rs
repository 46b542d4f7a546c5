//! Per-message write path (`spec.md` §4.2 `on_message`).
//!
//! Runs on the network-loop task that delivered the message (`spec.md` §5
//! "Scheduling model"): decode, then one insert per `TopicLink` bound to
//! the topic. Decode/storage failures are logged and the message is
//! dropped — they do not auto-open an Event (Open Question #1 in
//! `SPEC_FULL.md`, matching the original's actually-shipped behavior).

use chrono::{DateTime, Utc};
use tracing::{error, warn};

use domain::decoder::Decoder;
use domain::model::{TimeseriesPoint, TopicLink};
use domain::store::Store;

/// One inbound publish, already resolved to its bound decoder and
/// `TopicLink` rows by the caller (the subscriber session loop knows which
/// topic delivered the message; this function has no broker/session
/// concerns of its own).
pub async fn on_message(
    decoder: &dyn Decoder,
    links: &[TopicLink],
    payload: &[u8],
    store: &dyn Store,
    now: DateTime<Utc>,
) {
    let _timestamp_last_reception = now;

    let (timestamp, values) = match decoder.decode(payload) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(decoder = decoder.name(), error = %e, "payload decode failed, dropping message");
            return;
        }
    };

    for link in links {
        let field_name = match find_field_name(decoder, link) {
            Some(name) => name,
            None => continue,
        };
        let Some(value) = values.get(field_name) else {
            warn!(
                decoder = decoder.name(),
                field = field_name,
                "decoded payload missing declared field, skipping link"
            );
            continue;
        };

        let point = TimeseriesPoint::new(link.timeseries_id, timestamp, *value);
        if let Err(e) = store.insert_point(point).await {
            error!(
                timeseries_id = link.timeseries_id,
                error = %e,
                "failed to persist decoded point"
            );
        }
    }
}

/// `TopicLink` only carries `payload_field_id`; resolving it to the field
/// name the decoder actually emits is the caller's lookup in a full
/// deployment (a `PayloadField` row). Here the decoder's declared field
/// order stands in for that lookup: `payload_field_id` is treated as a
/// 1-based index into `Decoder::fields()`, keeping this module free of a
/// direct dependency on the `PayloadField` storage row.
fn find_field_name<'a>(decoder: &'a dyn Decoder, link: &TopicLink) -> Option<&'a str> {
    let index = usize::try_from(link.payload_field_id).ok()?.checked_sub(1)?;
    decoder.fields().get(index).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::bemserver::BemServerDecoder;
    use domain::error::PayloadDecoderError;
    use domain::store::MockStore;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_bemserver_decoder_dispatch_end_to_end() {
        let decoder = BemServerDecoder::new();
        let expected_ts = DateTime::parse_from_rfc3339("2021-04-27T16:05:11+00:00")
            .unwrap()
            .with_timezone(&Utc);

        let mut store = MockStore::new();
        store
            .expect_insert_point()
            .times(1)
            .withf(move |p| p.timeseries_id == 99 && p.timestamp == expected_ts && p.value == 42.0)
            .returning(|_| Ok(()));

        let links = [TopicLink {
            topic_id: 1,
            payload_field_id: 1,
            timeseries_id: 99,
        }];
        on_message(
            &decoder,
            &links,
            br#"{"ts":"2021-04-27T16:05:11+00:00","value":42}"#,
            &store,
            Utc::now(),
        )
        .await;
    }

    struct StubDecoder {
        fields: Vec<String>,
        result: Result<(DateTime<Utc>, HashMap<String, f64>), PayloadDecoderError>,
    }

    impl Decoder for StubDecoder {
        fn name(&self) -> &str {
            "stub"
        }
        fn description(&self) -> &str {
            "stub decoder"
        }
        fn fields(&self) -> &[String] {
            &self.fields
        }
        fn decode(
            &self,
            _raw: &[u8],
        ) -> Result<(DateTime<Utc>, HashMap<String, f64>), PayloadDecoderError> {
            self.result.clone()
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[tokio::test]
    async fn test_decode_failure_drops_message_without_touching_store() {
        let decoder = StubDecoder {
            fields: vec!["value".to_string()],
            result: Err(PayloadDecoderError::DecodeFailed("bad json".to_string())),
        };
        let mut store = MockStore::new();
        store.expect_insert_point().times(0);

        let links = [TopicLink {
            topic_id: 1,
            payload_field_id: 1,
            timeseries_id: 10,
        }];
        on_message(&decoder, &links, b"garbage", &store, now()).await;
    }

    #[tokio::test]
    async fn test_single_message_inserts_one_point_per_link() {
        let mut values = HashMap::new();
        values.insert("value".to_string(), 21.5);
        let decoder = StubDecoder {
            fields: vec!["value".to_string()],
            result: Ok((now(), values)),
        };

        let mut store = MockStore::new();
        store
            .expect_insert_point()
            .withf(|p| p.timeseries_id == 10 && p.value == 21.5)
            .returning(|_| Ok(()));

        let links = [TopicLink {
            topic_id: 1,
            payload_field_id: 1,
            timeseries_id: 10,
        }];
        on_message(&decoder, &links, b"{}", &store, now()).await;
    }

    #[tokio::test]
    async fn test_multiple_links_share_decoded_timestamp() {
        let mut values = HashMap::new();
        values.insert("temperature".to_string(), 21.5);
        values.insert("humidity".to_string(), 48.0);
        let decoder = StubDecoder {
            fields: vec!["temperature".to_string(), "humidity".to_string()],
            result: Ok((now(), values)),
        };

        let mut store = MockStore::new();
        store
            .expect_insert_point()
            .withf(move |p| p.timestamp == now())
            .times(2)
            .returning(|_| Ok(()));

        let links = [
            TopicLink {
                topic_id: 1,
                payload_field_id: 1,
                timeseries_id: 10,
            },
            TopicLink {
                topic_id: 1,
                payload_field_id: 2,
                timeseries_id: 11,
            },
        ];
        on_message(&decoder, &links, b"{}", &store, now()).await;
    }
}
