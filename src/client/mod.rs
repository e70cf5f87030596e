use std::net::Ipv6Addr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::secret::SecretString;
#[cfg(any(feature = "blocking", feature = "async"))]
use crate::transport::HttpSettings;

#[cfg(feature = "blocking")]
pub(crate) mod blocking;

pub(crate) mod core;

#[cfg(feature = "async")]
pub(crate) mod tokio;

/// Default HTTPS port of the controller.
pub const DEFAULT_PORT: u16 = 443;
/// Default WS-Man endpoint path.
pub const DEFAULT_PATH: &str = "/wsman";
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a controller.
///
/// Build a blocking client with `build()` / `build_wsman()` (feature `blocking`) or an
/// async one with `build_async()` / `build_async_wsman()` (feature `async`).
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    host: String,
    port: u16,
    path: String,
    protocol: String,
    username: Option<String>,
    password: Option<SecretString>,
    verify_tls: bool,
    ca_certificate: Option<Vec<u8>>,
    timeout: Duration,
}

impl ClientBuilder {
    /// Create a builder for the controller at `host` (name or IP address).
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_owned(),
            protocol: "https".to_owned(),
            username: None,
            password: None,
            verify_tls: true,
            ca_certificate: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the TCP port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the endpoint path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the URL scheme, `https` or `http`.
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Set the username for HTTP basic authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password for HTTP basic authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password));
        self
    }

    /// Verify the controller's TLS certificate (on by default).
    ///
    /// Controllers usually ship self-signed certificates; prefer
    /// [`Self::ca_certificate_pem`] over turning verification off.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Trust an additional PEM-encoded CA certificate.
    pub fn ca_certificate_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.ca_certificate = Some(pem.into());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint URL, e.g. `https://10.0.0.1:443/wsman`.
    pub fn url(&self) -> Result<String> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(Error::invalid("host is required"));
        }
        if self.protocol != "https" && self.protocol != "http" {
            return Err(Error::invalid(format!(
                "unsupported protocol {:?}; expected https or http",
                self.protocol
            )));
        }

        let host = if host.parse::<Ipv6Addr>().is_ok() {
            format!("[{host}]")
        } else if host.contains(':') && !host.starts_with('[') {
            return Err(Error::invalid(format!(
                "host {host:?} must not include a port; set it with port()"
            )));
        } else {
            host.to_owned()
        };
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        let url = format!("{}://{host}:{}{path}", self.protocol, self.port);
        reqwest::Url::parse(&url).map_err(|e| Error::invalid(format!("invalid endpoint URL {url}: {e}")))?;
        Ok(url)
    }

    #[cfg(any(feature = "blocking", feature = "async"))]
    pub(crate) fn settings(self) -> Result<HttpSettings> {
        let url = self.url()?;
        let username = self
            .username
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::invalid("username is required"))?;
        let password = self
            .password
            .ok_or_else(|| Error::invalid("password is required"))?;
        let ca_certificates = match self.ca_certificate {
            Some(pem) => {
                let certs = reqwest::Certificate::from_pem_bundle(&pem)
                    .map_err(|e| Error::invalid(format!("invalid CA certificate: {e}")))?;
                if certs.is_empty() {
                    return Err(Error::invalid("CA certificate PEM contains no certificate"));
                }
                certs
            }
            None => Vec::new(),
        };

        Ok(HttpSettings {
            url,
            username,
            password,
            verify_tls: self.verify_tls,
            ca_certificates,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_defaults_and_overrides() {
        assert_eq!(
            ClientBuilder::new("1.2.3.4").url().expect("url"),
            "https://1.2.3.4:443/wsman"
        );
        assert_eq!(
            ClientBuilder::new("fe80::1")
                .protocol("http")
                .port(8080)
                .path("wsman")
                .url()
                .expect("url"),
            "http://[fe80::1]:8080/wsman"
        );
        assert_eq!(
            ClientBuilder::new("[fe80::1]").url().expect("url"),
            "https://[fe80::1]:443/wsman"
        );
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(matches!(
            ClientBuilder::new(" ").url(),
            Err(Error::InvalidParameterValue(_))
        ));
        assert!(matches!(
            ClientBuilder::new("host").protocol("ftp").url(),
            Err(Error::InvalidParameterValue(_))
        ));
        assert!(matches!(
            ClientBuilder::new("1.2.3.4:443").url(),
            Err(Error::InvalidParameterValue(ref m)) if m.contains("port()")
        ));
    }

    #[cfg(any(feature = "blocking", feature = "async"))]
    #[test]
    fn settings_require_credentials_and_valid_pem() {
        let err = ClientBuilder::new("host").password("calvin").settings().expect_err("no user");
        assert!(matches!(err, Error::InvalidParameterValue(ref m) if m.contains("username")));

        let err = ClientBuilder::new("host")
            .username("root")
            .password("calvin")
            .ca_certificate_pem("not a certificate")
            .settings()
            .expect_err("bad pem");
        assert!(matches!(err, Error::InvalidParameterValue(_)));

        let settings = ClientBuilder::new("host")
            .username("root")
            .password("calvin")
            .settings()
            .expect("settings");
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        assert!(settings.verify_tls);
    }
}
