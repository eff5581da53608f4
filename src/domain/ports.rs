use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::domain::errors::TransportError;
use crate::domain::page::PageSnapshot;
use crate::domain::visit::VisitRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Http,
    Beacon,
    KeepAlive,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportKind::Http => "http",
            TransportKind::Beacon => "beacon",
            TransportKind::KeepAlive => "keepalive",
        };
        f.write_str(name)
    }
}

// Port for sending a visit record to the collection endpoint.
// The recorder depends on this trait, not on the reqwest adapters.
#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;
    async fn send(&self, record: &VisitRecord) -> Result<(), TransportError>;
}

// Port for durable per-origin key/value storage.
pub trait IdentityStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, String>;
    fn set(&self, key: &str, value: &str) -> Result<(), String>;
}

// Port for reading the host page's current navigation state.
pub trait PageEnvironment: Send + Sync {
    fn snapshot(&self) -> PageSnapshot;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
