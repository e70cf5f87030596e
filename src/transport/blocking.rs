use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{Error, Result};
use crate::transport::{HttpSettings, SOAP_CONTENT_TYPE, Transport, status_error};

/// Blocking HTTPS transport for WS-Man.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    settings: HttpSettings,
}

impl HttpTransport {
    pub(crate) fn new(settings: HttpSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_tls);
        for cert in &settings.ca_certificates {
            builder = builder.add_root_certificate(cert.clone());
        }
        let client = builder.build().map_err(Error::from_http)?;
        Ok(Self { client, settings })
    }
}

impl Transport for HttpTransport {
    fn url(&self) -> &str {
        &self.settings.url
    }

    fn post(&self, body: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.settings.url)
            .basic_auth(&self.settings.username, Some(self.settings.password.expose()))
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(body.to_owned())
            .send()
            .map_err(Error::from_http)?;

        let status = response.status();
        let text = response.text().map_err(Error::from_http)?;
        if !status.is_success() {
            return Err(status_error(status, &text));
        }
        Ok(text)
    }
}
