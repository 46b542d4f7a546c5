use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// MQTT protocol version negotiated with a broker (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolVersion {
    #[serde(rename = "3.1")]
    V3_1,
    #[serde(rename = "3.1.1")]
    V3_1_1,
    #[serde(rename = "5")]
    V5,
}

impl ProtocolVersion {
    pub fn is_v5(&self) -> bool {
        matches!(self, Self::V5)
    }
}

/// Wire transport used to reach the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Tcp,
    Websockets,
}

/// TLS peer-verification strictness, mirrored from
/// `original_source/.../model/broker.py`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsVerifyMode {
    None,
    Optional,
    Required,
}

/// A connection endpoint shared by one or more `Subscriber`s (`spec.md` §3).
///
/// `Broker` owns nothing; deletion is refused at the storage layer while any
/// `Subscriber` still references it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broker {
    pub id: Option<i64>,
    pub host: String,
    pub port: u16,
    pub protocol_version: ProtocolVersion,
    pub transport: Transport,
    pub is_auth_required: bool,
    pub use_tls: bool,
    pub tls_version: Option<String>,
    pub tls_verifymode: Option<TlsVerifyMode>,
    /// PEM certificate content. Materialized to disk by the acquisition
    /// engine at connect time (`tls_certificate_dirpath/<host>.crt`); the
    /// domain only carries the content, never a path.
    pub tls_certificate: Option<String>,
}

impl Broker {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        protocol_version: ProtocolVersion,
        transport: Transport,
        is_auth_required: bool,
        use_tls: bool,
        tls_version: Option<String>,
        tls_verifymode: Option<TlsVerifyMode>,
        tls_certificate: Option<String>,
    ) -> Result<Self> {
        let broker = Self {
            id: None,
            host: host.into(),
            port,
            protocol_version,
            transport,
            is_auth_required,
            use_tls,
            tls_version,
            tls_verifymode,
            tls_certificate,
        };
        broker.verify_consistency()?;
        Ok(broker)
    }

    /// Mirrors `Broker._verify_consistency` in the original source.
    fn verify_consistency(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(DomainError::InvalidBrokerConfig(
                "host cannot be empty".to_string(),
            ));
        }
        if self.use_tls {
            if self.tls_certificate.is_none() {
                return Err(DomainError::InvalidBrokerConfig(
                    "use_tls requires a tls_certificate".to_string(),
                ));
            }
            if self.tls_version.as_deref().unwrap_or("").is_empty() {
                return Err(DomainError::InvalidBrokerConfig(
                    "use_tls requires a tls_version".to_string(),
                ));
            }
            if self.tls_verifymode.is_none() {
                return Err(DomainError::InvalidBrokerConfig(
                    "use_tls requires a tls_verifymode".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// File name used when materializing the certificate under a working
    /// directory, matching `<tls_certificate_dirpath>/<host>.crt`.
    pub fn tls_certificate_filename(&self) -> String {
        format!("{}.crt", self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_tls_args() -> (Option<String>, Option<TlsVerifyMode>, Option<String>) {
        (
            Some("1.2".to_string()),
            Some(TlsVerifyMode::Required),
            Some("-----BEGIN CERTIFICATE-----\n...".to_string()),
        )
    }

    #[test]
    fn test_plain_broker_ok() {
        let b = Broker::new(
            "mqtt.example.com",
            1883,
            ProtocolVersion::V3_1_1,
            Transport::Tcp,
            false,
            false,
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(b.host, "mqtt.example.com");
    }

    #[test]
    fn test_tls_without_cert_rejected() {
        let result = Broker::new(
            "mqtt.example.com",
            8883,
            ProtocolVersion::V5,
            Transport::Tcp,
            false,
            true,
            Some("1.2".into()),
            Some(TlsVerifyMode::Required),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_tls_with_full_config_ok() {
        let (tls_version, verifymode, cert) = valid_tls_args();
        let b = Broker::new(
            "mqtt.example.com",
            8883,
            ProtocolVersion::V5,
            Transport::Tcp,
            false,
            true,
            tls_version,
            verifymode,
            cert,
        )
        .unwrap();
        assert!(b.use_tls);
    }

    #[test]
    fn test_empty_host_rejected() {
        assert!(Broker::new(
            "",
            1883,
            ProtocolVersion::V3_1_1,
            Transport::Tcp,
            false,
            false,
            None,
            None,
            None,
        )
        .is_err());
    }

    #[test]
    fn test_cert_filename() {
        let b = Broker::new(
            "broker.local",
            1883,
            ProtocolVersion::V3_1_1,
            Transport::Tcp,
            false,
            false,
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(b.tls_certificate_filename(), "broker.local.crt");
    }
}
