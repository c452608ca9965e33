/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: Apache-2.0 OR MIT
 */

use lettre::{
    address::Envelope,
    message::Mailbox,
    transport::smtp::{authentication::Credentials, extension::ClientId},
    Address, SmtpTransport, Transport,
};
use serde::{Deserialize, Serialize};

use crate::{report::ArfReport, Error};

/// SMTP relay used to deliver reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Option<SmtpCredentials>,
    pub hello_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

pub struct SmtpSender {
    config: SmtpConfig,
    transport: SmtpTransport,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 25,
            credentials: None,
            hello_name: None,
        }
    }
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        SmtpConfig {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Authentication is only enabled when both a username and a password
    /// are available.
    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.credentials = match (username, password) {
            (Some(username), Some(password)) => SmtpCredentials { username, password }.into(),
            _ => None,
        };
        self
    }

    pub fn with_hello_name(mut self, hello_name: impl Into<String>) -> Self {
        self.hello_name = Some(hello_name.into());
        self
    }
}

impl SmtpSender {
    pub fn new(config: SmtpConfig) -> Self {
        let mut builder = SmtpTransport::builder_dangerous(&config.host).port(config.port);
        if let Some(credentials) = &config.credentials {
            builder = builder.credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.clone(),
            ));
        }
        if let Some(hello_name) = &config.hello_name {
            builder = builder.hello_name(ClientId::Domain(hello_name.clone()));
        }

        SmtpSender {
            transport: builder.build(),
            config,
        }
    }

    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    /// Serializes the report and submits it to the relay, using the report's
    /// `From` and `To` addresses as the envelope.
    pub fn send(&self, report: &ArfReport<'_>) -> crate::Result<()> {
        let envelope = envelope(report.from(), report.to())?;
        let message = report.to_rfc5322_bytes()?;
        self.deliver(&envelope, &message)
    }

    /// Submits an already serialized message.
    pub fn send_raw(&self, from: &str, to: &str, message: &[u8]) -> crate::Result<()> {
        self.deliver(&envelope(from, to)?, message)
    }

    fn deliver(&self, envelope: &Envelope, message: &[u8]) -> crate::Result<()> {
        log::debug!(
            "Sending message from {:?} to {:?} through {}:{} ({} bytes).",
            envelope.from(),
            envelope.to(),
            self.config.host,
            self.config.port,
            message.len()
        );

        let response = self
            .transport
            .send_raw(envelope, message)
            .map_err(|err| Error::Transport(err.to_string()))?;

        log::debug!(
            "Relay {} accepted the message with code {}.",
            self.config.host,
            response.code()
        );

        Ok(())
    }
}

fn envelope(from: &str, to: &str) -> crate::Result<Envelope> {
    Envelope::new(Some(envelope_address(from)?), vec![envelope_address(to)?])
        .map_err(|err| Error::Transport(err.to_string()))
}

/// Accepts bare addresses as well as `Name <address>` mailboxes.
fn envelope_address(address: &str) -> crate::Result<Address> {
    let address = address.trim();
    address
        .parse::<Address>()
        .or_else(|_| address.parse::<Mailbox>().map(|mailbox| mailbox.email))
        .map_err(|err| Error::Transport(format!("Invalid address {:?}: {}", address, err)))
}

#[cfg(test)]
mod test {
    use super::{envelope, envelope_address, SmtpConfig, SmtpCredentials, SmtpSender};
    use crate::{report::ArfReportBuilder, Error};

    #[test]
    fn smtp_config() {
        let config = SmtpConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 25);
        assert_eq!(config.credentials, None);

        let config = SmtpConfig::new("mx.example.org", 587)
            .with_credentials(Some("john".to_string()), Some("secret".to_string()))
            .with_hello_name("reporter.example.org");
        assert_eq!(
            config.credentials,
            Some(SmtpCredentials {
                username: "john".to_string(),
                password: "secret".to_string()
            })
        );
        assert_eq!(config.hello_name.as_deref(), Some("reporter.example.org"));

        assert_eq!(
            SmtpConfig::default()
                .with_credentials(Some("john".to_string()), None)
                .credentials,
            None
        );

        let config: SmtpConfig =
            serde_json::from_str(r#"{"host": "relay.example.org", "port": 2525}"#).unwrap();
        assert_eq!(config, SmtpConfig::new("relay.example.org", 2525));

        let sender = SmtpSender::new(config.clone());
        assert_eq!(sender.config(), &config);
    }

    #[test]
    fn smtp_envelope() {
        assert_eq!(
            envelope_address("Victim <victim@example.com>")
                .unwrap()
                .to_string(),
            "victim@example.com"
        );
        assert_eq!(
            envelope_address(" abuse@example.net ").unwrap().to_string(),
            "abuse@example.net"
        );
        assert!(matches!(
            envelope_address("not an address"),
            Err(Error::Transport(_))
        ));

        let envelope = envelope("victim@example.com", "abuse@example.net").unwrap();
        assert_eq!(
            envelope.from().map(|addr| addr.to_string()).as_deref(),
            Some("victim@example.com")
        );
        assert_eq!(envelope.to().len(), 1);

        let report = ArfReportBuilder::new("victim@example.com", "abuse@").build(b"\r\n");
        let sender = SmtpSender::new(SmtpConfig::default());
        assert!(matches!(sender.send(&report), Err(Error::Transport(_))));
        assert!(matches!(
            sender.send_raw("", "abuse@example.net", b"\r\n"),
            Err(Error::Transport(_))
        ));
    }
}
