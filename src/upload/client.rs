use super::{Transport, UploadForm};
use crate::error::describe_chain;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

/// reqwest-backed transport. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// `timeout` bounds connecting and each wait for response data. There is
    /// no deadline on the request as a whole, so a slow but steady upload of a
    /// large photo still completes.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

fn is_timeout(e: &reqwest::Error) -> bool {
    if e.is_timeout() {
        return true;
    }
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = std::error::Error::source(cause);
    }
    false
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    let kind = if is_timeout(e) {
        "request timed out"
    } else if e.is_connect() {
        "connection failed"
    } else if e.is_body() || e.is_request() {
        "request failed"
    } else {
        "transport error"
    };
    format!("{}: {}", kind, describe_chain(e))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(&self, url: &Url, form: UploadForm) -> Result<u16> {
        let multipart = form.into_multipart()?;

        let response = self
            .client
            .post(url.clone())
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| {
                let description = describe_transport_error(&e);
                tracing::error!("Failed to send upload to {}: {}", url, description);
                Error::Transport(description)
            })?;

        let status = response.status();
        tracing::debug!("Upload to {} answered with status {}", url, status);
        Ok(status.as_u16())
    }
}
