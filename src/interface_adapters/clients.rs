use async_trait::async_trait;
use reqwest::{Client, Response, header::CONTENT_TYPE};
use std::time::Duration;

use crate::domain::{Transport, TransportError, TransportKind, VisitRecord};
use crate::interface_adapters::protocol::{FORM_CONTENT_TYPE, encode_form};

// Largest payload a beacon will queue, matching what browsers accept.
pub const BEACON_MAX_PAYLOAD_BYTES: usize = 64 * 1024;

fn map_send_error(err: reqwest::Error) -> TransportError {
    TransportError::Network(err.to_string())
}

fn check_status(res: Response) -> Result<(), TransportError> {
    let status = res.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(TransportError::Upstream {
            status: status.as_u16(),
        })
    }
}

// Ordinary GET with the record in the query string; used while the page is alive.
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    pub endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn send(&self, record: &VisitRecord) -> Result<(), TransportError> {
        // Append to any query the endpoint already carries.
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        let url = format!("{}{}{}", self.endpoint, separator, encode_form(record));
        let res = self.http.get(url).send().await.map_err(map_send_error)?;
        check_status(res)
    }
}

// POST awaited with a short timeout; the fallback when a beacon cannot be queued.
#[derive(Clone)]
pub struct KeepAliveTransport {
    http: Client,
    pub endpoint: String,
}

impl KeepAliveTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Transport for KeepAliveTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::KeepAlive
    }

    async fn send(&self, record: &VisitRecord) -> Result<(), TransportError> {
        let res = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(encode_form(record))
            .send()
            .await
            .map_err(map_send_error)?;
        check_status(res)
    }
}

/// Fire-and-forget POST queued on a detached task.
///
/// Like a browser beacon it only reports whether the payload was accepted
/// for sending; the request outlives the caller and its outcome is logged.
#[derive(Clone)]
pub struct BeaconTransport {
    http: Client,
    pub endpoint: String,
}

impl BeaconTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Transport for BeaconTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Beacon
    }

    async fn send(&self, record: &VisitRecord) -> Result<(), TransportError> {
        let body = encode_form(record);
        if body.len() > BEACON_MAX_PAYLOAD_BYTES {
            return Err(TransportError::Rejected(format!(
                "payload of {} bytes exceeds beacon limit",
                body.len()
            )));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| TransportError::Rejected(format!("no async runtime: {err}")))?;

        let request = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);
        runtime.spawn(async move {
            match request.send().await.map_err(map_send_error).and_then(check_status) {
                Ok(()) => tracing::debug!("beacon delivered."),
                Err(error) => tracing::warn!(%error, "beacon request failed after queueing."),
            }
        });
        Ok(())
    }
}
