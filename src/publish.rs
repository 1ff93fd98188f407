//! Snapshot publishing.
//!
//! The [`MessageSink`] trait is the boundary to the message bus; the
//! production implementation wraps `rumqttc`. Topic fan-out lives here too:
//! one topic per present probe, one for the battery, one for the heating
//! element when the family has it. Absent probes are never published.

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, TlsConfiguration, Transport};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::MqttSettings;
use crate::device::profile::SensorSnapshot;
use crate::error::{Error, Result};

/// Accepts readings bound for the message bus.
#[async_trait::async_trait]
pub trait MessageSink: Send + Sync {
    /// Publish one payload to one topic.
    async fn publish(&self, topic: &str, payload: &str) -> Result<()>;
}

/// Fan a snapshot out to its per-sensor topics.
///
/// Topics are `{base_topic}/{device_name}/probe{N}` for each present probe,
/// `.../battery`, and `.../heating_element` when a reading is present.
/// Payloads are the raw readings as decimal strings.
pub async fn publish_snapshot(
    sink: &dyn MessageSink,
    base_topic: &str,
    device_name: &str,
    snapshot: &SensorSnapshot,
) -> Result<()> {
    for (probe, reading) in snapshot.present_probes() {
        sink.publish(
            &format!("{base_topic}/{device_name}/probe{probe}"),
            &reading.to_string(),
        )
        .await?;
    }

    sink.publish(
        &format!("{base_topic}/{device_name}/battery"),
        &snapshot.battery().to_string(),
    )
    .await?;

    if let Some(heat) = snapshot.heating_element() {
        sink.publish(
            &format!("{base_topic}/{device_name}/heating_element"),
            &heat.to_string(),
        )
        .await?;
    }

    Ok(())
}

/// [`MessageSink`] implementation on a `rumqttc` async client.
///
/// The client's event loop runs on a background task for the life of the
/// process; connection drops are retried by `rumqttc` itself and logged
/// here, matching the supervisor's own log-and-carry-on posture.
pub struct MqttSink {
    client: AsyncClient,
}

impl MqttSink {
    /// Build the client from settings and start its event-loop driver.
    pub async fn connect(settings: &MqttSettings) -> Result<Self> {
        let mut options = MqttOptions::new(
            settings.client_id.as_str(),
            settings.host.as_str(),
            settings.port,
        );
        options.set_keep_alive(Duration::from_secs(settings.keepalive));

        if let Some(auth) = &settings.auth {
            options.set_credentials(
                auth.username.as_str(),
                auth.password.as_deref().unwrap_or(""),
            );
        }

        if let Some(tls) = &settings.tls {
            let ca = match &tls.ca_certs {
                Some(path) => std::fs::read(path).map_err(|e| {
                    Error::Config(format!("mqtt tls ca_certs {}: {e}", path.display()))
                })?,
                None => Vec::new(),
            };

            options.set_transport(Transport::Tls(TlsConfiguration::Simple {
                ca,
                alpn: None,
                client_auth: None,
            }));
        }

        let (client, mut event_loop) = AsyncClient::new(options, 32);

        tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        debug!("mqtt broker connection established");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("mqtt connection error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl MessageSink for MqttSink {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes())
            .await
            .map_err(|e| Error::Publish {
                reason: format!("{topic}: {e}"),
            })
    }
}
