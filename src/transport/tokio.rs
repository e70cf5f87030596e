use core::future::Future;
use core::pin::Pin;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::{Error, Result};
use crate::transport::{AsyncTransport, HttpSettings, SOAP_CONTENT_TYPE, status_error};

/// Tokio HTTPS transport for WS-Man.
#[derive(Debug)]
pub struct AsyncHttpTransport {
    client: Client,
    settings: HttpSettings,
}

impl AsyncHttpTransport {
    pub(crate) fn new(settings: HttpSettings) -> Result<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(!settings.verify_tls);
        for cert in &settings.ca_certificates {
            builder = builder.add_root_certificate(cert.clone());
        }
        let client = builder.build().map_err(Error::from_http)?;
        Ok(Self { client, settings })
    }

    async fn post_impl(&self, body: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.settings.url)
            .basic_auth(&self.settings.username, Some(self.settings.password.expose()))
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(body.to_owned())
            .send()
            .await
            .map_err(Error::from_http)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::from_http)?;
        if !status.is_success() {
            return Err(status_error(status, &text));
        }
        Ok(text)
    }
}

impl AsyncTransport for AsyncHttpTransport {
    fn url(&self) -> &str {
        &self.settings.url
    }

    fn post<'a>(
        &'a self,
        body: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            match tokio::time::timeout(self.settings.timeout, self.post_impl(body)).await {
                Ok(result) => result,
                Err(_elapsed) => Err(Error::Timeout),
            }
        })
    }
}
