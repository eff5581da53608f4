use std::fmt;

use crate::domain::ports::TransportKind;

// Failure of a single transport attempt.
#[derive(Debug)]
pub enum TransportError {
    // Request never produced a response (connect, timeout, DNS).
    Network(String),
    // Collector answered with a non-success status.
    Upstream { status: u16 },
    // Transport refused to take the payload at all.
    Rejected(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(message) => write!(f, "network error: {message}"),
            TransportError::Upstream { status } => write!(f, "collector returned status {status}"),
            TransportError::Rejected(reason) => write!(f, "payload rejected: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

// Every transport in a chain failed; attempts are kept in order.
#[derive(Debug)]
pub struct DeliveryError {
    pub attempts: Vec<(TransportKind, TransportError)>,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return write!(f, "no transport configured");
        }
        write!(f, "all {} transports failed", self.attempts.len())?;
        for (kind, error) in &self.attempts {
            write!(f, "; {kind}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DeliveryError {}
