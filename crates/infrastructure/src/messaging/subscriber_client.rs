use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use domain::{Broker, Transport};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, TlsConfiguration, Transport as RumqttcTransport};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

/// A decoded wire publish, handed to the acquisition engine's dispatch path.
#[derive(Debug, Clone)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub pkid: u16,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_POLL: Duration = Duration::from_millis(50);
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn qos_from(qos: u8) -> QoS {
    match qos {
        0 => QoS::AtMostOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

/// One MQTT client session per `Subscriber` (`spec.md` §4.3.1), unlike the
/// teacher's single shared `MqttClient`. The session lifecycle
/// (`connect`/`disconnect`) follows the step ordering in
/// `original_source/.../model/subscriber.py`: all topics are subscribed
/// before the network loop begins polling, so that a persistent session's
/// retained messages are delivered on the very first poll.
pub struct SubscriberClient {
    client: AsyncClient,
    tx: broadcast::Sender<MqttMessage>,
    connected: Arc<AtomicBool>,
    loop_handle: Option<JoinHandle<()>>,
}

/// A topic to subscribe at connect time; plain data, not the domain `Topic`
/// entity, so this module stays independent of how topics are loaded.
pub struct SubscribeSpec {
    pub name: String,
    pub qos: u8,
}

impl SubscriberClient {
    /// `spec.md` §4.3.1 `connect(client_id?)` steps 1-6. Step 7 (block until
    /// connected, persist state) is the caller's responsibility since it
    /// touches the `Subscriber` aggregate, not the wire client.
    pub async fn connect(
        broker: &Broker,
        client_id: &str,
        keep_alive_secs: u16,
        use_persistent_session: bool,
        session_expiry_secs: u32,
        username: Option<&str>,
        password: Option<&str>,
        tls_cert_path: Option<PathBuf>,
        topics: &[SubscribeSpec],
    ) -> Result<Self> {
        let mut opts = MqttOptions::new(client_id, broker.host.clone(), broker.port);
        opts.set_keep_alive(Duration::from_secs(keep_alive_secs as u64));

        if broker.is_auth_required {
            let user = username.ok_or_else(|| anyhow!("broker requires authentication"))?;
            opts.set_credentials(user, password.unwrap_or_default());
        }

        // `spec.md` §4.3.1 step 4: for protocol 5, clean_start/
        // SessionExpiryInterval; for 3.x, clean_session. rumqttc's base
        // client speaks 3.1/3.1.1 wire format; full v5 property support
        // (SessionExpiryInterval as a CONNECT property) needs the separate
        // `rumqttc::v5` client and is a known simplification here (see
        // DESIGN.md) — `session_expiry_secs` is accepted and threaded
        // through for a v5 client swap later, but is not yet sent on the
        // wire.
        let _ = (broker.protocol_version, session_expiry_secs);
        opts.set_clean_session(!use_persistent_session);

        if broker.use_tls {
            let cert_path = tls_cert_path
                .ok_or_else(|| anyhow!("use_tls requires a materialized certificate path"))?;
            let ca = std::fs::read(&cert_path)
                .map_err(|e| anyhow!("failed to read TLS certificate {:?}: {e}", cert_path))?;
            let tls_transport = match broker.transport {
                Transport::Tcp => RumqttcTransport::Tls(TlsConfiguration::Simple {
                    ca,
                    alpn: None,
                    client_auth: None,
                }),
                Transport::Websockets => RumqttcTransport::Wss(TlsConfiguration::Simple {
                    ca,
                    alpn: None,
                    client_auth: None,
                }),
            };
            opts.set_transport(tls_transport);
        } else if matches!(broker.transport, Transport::Websockets) {
            opts.set_transport(RumqttcTransport::Ws);
        }

        let (client, mut eventloop) = AsyncClient::new(opts, 100);

        // Step 5: subscribe to all enabled topics *before* the network loop
        // starts polling, so retained messages for a persistent session are
        // delivered on the first poll.
        for topic in topics {
            client
                .subscribe(&topic.name, qos_from(topic.qos))
                .await
                .map_err(|e| anyhow!("failed to subscribe to {}: {e}", topic.name))?;
        }

        let (tx, _) = broadcast::channel(512);
        let tx_clone = tx.clone();
        let connected = Arc::new(AtomicBool::new(false));
        let connected_clone = connected.clone();

        // Step 6: start the network loop on a background task.
        let loop_handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let msg = MqttMessage {
                            topic: publish.topic,
                            payload: publish.payload.to_vec(),
                            pkid: publish.pkid,
                        };
                        let _ = tx_clone.send(msg);
                    }
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        info!(session_present = ack.session_present, "subscriber connected");
                        connected_clone.store(true, Ordering::Relaxed);
                    }
                    Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => {
                        connected_clone.store(false, Ordering::Relaxed);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "subscriber network loop error");
                        connected_clone.store(false, Ordering::Relaxed);
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                }
            }
        });

        let session = Self {
            client,
            tx,
            connected,
            loop_handle: Some(loop_handle),
        };

        // Step 7: block until the client reports connected (bounded wait).
        session.wait_until_connected().await?;
        Ok(session)
    }

    pub fn messages(&self) -> broadcast::Receiver<MqttMessage> {
        self.tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn wait_until_connected(&self) -> Result<()> {
        wait_until(|| self.is_connected(), CONNECT_TIMEOUT, CONNECT_POLL).await
    }

    /// `spec.md` §4.3.1 `disconnect()` steps 2-3 (step 1, marking
    /// `TopicBySubscriber.is_subscribed = false`, is the caller's
    /// responsibility since it is a storage operation).
    pub async fn disconnect(mut self) -> Result<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| anyhow!("failed to disconnect: {e}"))?;
        wait_until(
            || !self.is_connected(),
            DISCONNECT_TIMEOUT,
            CONNECT_POLL,
        )
        .await?;
        if let Some(handle) = self.loop_handle.take() {
            handle.abort();
        }
        Ok(())
    }
}

/// Bounded wait: a hard cap plus periodic poll, never an unbounded spin
/// (`spec.md` §5).
async fn wait_until<F: Fn() -> bool>(pred: F, timeout: Duration, poll: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        if pred() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(anyhow!("timed out waiting for subscriber state change"));
        }
        tokio::time::sleep(poll).await;
    }
}
