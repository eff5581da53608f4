use std::sync::Arc;

use crate::domain::{DeliveryError, Transport, TransportKind, VisitRecord};

/// Transport that accepted the record, or every attempt that failed.
pub type DeliveryReport = Result<TransportKind, DeliveryError>;

/// Ordered list of transports tried until one accepts the record.
#[derive(Clone, Default)]
pub struct DeliveryChain {
    transports: Vec<Arc<dyn Transport>>,
}

impl DeliveryChain {
    pub fn new(transports: Vec<Arc<dyn Transport>>) -> Self {
        Self { transports }
    }

    pub fn kinds(&self) -> Vec<TransportKind> {
        self.transports.iter().map(|transport| transport.kind()).collect()
    }

    /// Sends the same record through each transport in turn and stops at the
    /// first success. Failures are logged here and collected in the error.
    pub async fn deliver(&self, record: &VisitRecord) -> DeliveryReport {
        let mut attempts = Vec::new();

        for transport in &self.transports {
            let kind = transport.kind();
            match transport.send(record).await {
                Ok(()) => {
                    tracing::debug!(transport = %kind, url = %record.url, "visit record delivered.");
                    return Ok(kind);
                }
                Err(error) => {
                    tracing::warn!(transport = %kind, %error, "transport failed, trying next.");
                    attempts.push((kind, error));
                }
            }
        }

        Err(DeliveryError { attempts })
    }
}
