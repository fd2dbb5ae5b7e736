//! MQTT transport for Bambu Lab printers
//!
//! Printers run an MQTT broker on port 8883 (TLS, self-signed certificate).
//! The monitor logs in as `bblp` with the LAN access code, subscribes to
//! `device/{serial}/report` and publishes requests on `device/{serial}/request`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS,
    TlsConfiguration, Transport as MqttLink,
};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use printwatch_core::constants::{topics, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MQTT_PORT, MQTT_USERNAME};

use crate::{error::*, Transport};

/// Full status pushes are far larger than rumqttc's 10 KiB default
const MAX_PACKET_SIZE: usize = 1024 * 1024;

/// MQTT transport for one printer
pub struct MqttTransport {
    host: String,
    port: u16,
    serial: String,
    access_code: String,
    client: Option<AsyncClient>,
    eventloop: Option<EventLoop>,
    connect_timeout: Duration,
    keep_alive: Duration,
}

impl MqttTransport {
    /// Create new MQTT transport
    pub fn new(
        host: impl Into<String>,
        serial: impl Into<String>,
        access_code: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_MQTT_PORT,
            serial: serial.into(),
            access_code: access_code.into(),
            client: None,
            eventloop: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            keep_alive: Duration::from_secs(30),
        }
    }

    /// Set broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set MQTT keep-alive interval
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    fn options(&self) -> MqttOptions {
        let client_id = format!("printwatch_{}_{}", self.serial, std::process::id());

        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options.set_credentials(MQTT_USERNAME, self.access_code.clone());
        options.set_keep_alive(self.keep_alive);
        options.set_max_packet_size(MAX_PACKET_SIZE, MAX_PACKET_SIZE);
        options.set_transport(MqttLink::tls_with_config(TlsConfiguration::Rustls(Arc::new(
            tls_config(),
        ))));

        options
    }
}

/// Printers present a self-signed certificate issued for their serial number
fn tls_config() -> ClientConfig {
    ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptPrinterCert))
        .with_no_client_auth()
}

#[derive(Debug)]
struct AcceptPrinterCert;

impl ServerCertVerifier for AcceptPrinterCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        debug!("Connecting to {}...", self.remote_addr());

        let (client, mut eventloop) = AsyncClient::new(self.options(), 16);

        let ack = timeout(self.connect_timeout, async {
            loop {
                if let Event::Incoming(Packet::ConnAck(ack)) = eventloop.poll().await? {
                    return Ok::<_, Error>(ack);
                }
            }
        })
        .await
        .map_err(|_| Error::ConnectionTimeout)??;

        if ack.code != ConnectReturnCode::Success {
            return Err(Error::Mqtt(format!("connection refused: {:?}", ack.code)));
        }

        client.try_subscribe(topics::report(&self.serial), QoS::AtMostOnce)?;

        debug!("Connected to {}", self.remote_addr());

        self.client = Some(client);
        self.eventloop = Some(eventloop);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            debug!("Disconnecting from {}...", self.remote_addr());

            // Flush the DISCONNECT packet; the broker may already be gone
            if client.try_disconnect().is_ok() {
                if let Some(eventloop) = self.eventloop.as_mut() {
                    let _ = timeout(Duration::from_millis(500), eventloop.poll()).await;
                }
            }
        }

        self.eventloop = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let client = self.client.as_ref().ok_or(Error::NotConnected)?;

        trace!("Publishing {} bytes to {}", data.len(), topics::request(&self.serial));

        // Never block: the event loop is only driven from `receive`
        client.try_publish(topics::request(&self.serial), QoS::AtMostOnce, false, data.to_vec())?;

        Ok(())
    }

    async fn receive(&mut self) -> Result<Bytes> {
        let eventloop = self.eventloop.as_mut().ok_or(Error::NotConnected)?;

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    trace!("Received {} bytes on {}", publish.payload.len(), publish.topic);
                    return Ok(publish.payload);
                }
                Ok(Event::Incoming(Packet::Disconnect)) => {
                    self.client = None;
                    return Err(Error::ConnectionClosed);
                }
                Ok(event) => trace!("MQTT event: {:?}", event),
                Err(e) => {
                    self.client = None;
                    return Err(e.into());
                }
            }
        }
    }

    fn remote_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("MQTT transport dropped while still connected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mqtt_transport_create() {
        let transport = MqttTransport::new("192.168.1.50", "01P00A000000000", "12345678");
        assert!(!transport.is_connected());
        assert_eq!(transport.remote_addr(), "192.168.1.50:8883");
    }

    #[test]
    fn test_options() {
        let transport = MqttTransport::new("192.168.1.50", "01P00A000000000", "12345678")
            .with_port(1883)
            .with_keep_alive(Duration::from_secs(15));

        let options = transport.options();

        assert_eq!(options.broker_address(), ("192.168.1.50".to_string(), 1883));
        assert_eq!(options.keep_alive(), Duration::from_secs(15));
        assert!(options.client_id().starts_with("printwatch_01P00A000000000_"));
        assert!(matches!(
            options.transport(),
            MqttLink::Tls(TlsConfiguration::Rustls(_))
        ));
    }

    #[test]
    fn test_tls_accepts_self_signed() {
        let verifier = AcceptPrinterCert;

        assert!(!verifier.supported_verify_schemes().is_empty());
        assert!(verifier
            .verify_server_cert(
                &CertificateDer::from(vec![0u8; 8]),
                &[],
                &ServerName::try_from("01P00A000000000").unwrap(),
                &[],
                UnixTime::now(),
            )
            .is_ok());
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let mut transport = MqttTransport::new("192.168.1.50", "SN", "code");

        let result = transport.send(b"{}").await;
        assert!(matches!(result, Err(Error::NotConnected)));

        let result = transport.receive().await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Nothing listens on the discard port
        let mut transport = MqttTransport::new("127.0.0.1", "SN", "code")
            .with_port(9)
            .with_connect_timeout(Duration::from_millis(500));

        let result = transport.connect().await;
        assert!(result.is_err());
        assert!(!transport.is_connected());
    }
}
