use rand::Rng;
use std::sync::Arc;

use crate::domain::{IdentityStore, VisitorIdentity, VisitorKind};

pub const VISITOR_ID_KEY: &str = "visitorId";
pub const IS_OWNER_KEY: &str = "isOwner";

/// Inclusive range new visitor ids are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    min: u32,
    max: u32,
}

impl IdRange {
    /// Builds a range from two bounds in either order.
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn contains(&self, id: u32) -> bool {
        (self.min..=self.max).contains(&id)
    }

    fn sample(&self) -> u32 {
        rand::rng().random_range(self.min..=self.max)
    }
}

impl Default for IdRange {
    fn default() -> Self {
        Self::new(1000, 2000)
    }
}

// Reads, creates and updates the persisted visitor identity.
pub struct IdentityService {
    pub store: Arc<dyn IdentityStore>,
    pub id_range: IdRange,
}

impl IdentityService {
    /// Returns the stored identity, creating and persisting an id on first use.
    ///
    /// Storage failures never escape: an unreadable store yields a fresh id
    /// and an unreadable owner flag classifies the visit as an ordinary visitor.
    pub fn resolve(&self) -> VisitorIdentity {
        let visitor_id = match self.store.get(VISITOR_ID_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<u32>() {
                Ok(id) => id,
                Err(_) => {
                    tracing::warn!(stored = %raw, "stored visitor id is not an integer, replacing it.");
                    self.create_visitor_id()
                }
            },
            Ok(None) => self.create_visitor_id(),
            Err(error) => {
                tracing::warn!(%error, "identity storage unavailable, using a fresh visitor id.");
                self.create_visitor_id()
            }
        };

        let is_owner = match self.store.get(IS_OWNER_KEY) {
            Ok(flag) => flag.is_some_and(|value| value.trim() == "true"),
            Err(error) => {
                tracing::warn!(%error, "failed to read owner flag.");
                false
            }
        };

        VisitorIdentity {
            visitor_id,
            kind: VisitorKind::from_owner_flag(is_owner),
        }
    }

    /// Persists the owner flag used to tag maintainers' own visits.
    pub fn set_owner(&self, is_owner: bool) -> Result<(), String> {
        let value = if is_owner { "true" } else { "false" };
        self.store.set(IS_OWNER_KEY, value)
    }

    fn create_visitor_id(&self) -> u32 {
        let id = self.id_range.sample();
        if let Err(error) = self.store.set(VISITOR_ID_KEY, &id.to_string()) {
            tracing::warn!(%error, visitor_id = id, "failed to persist visitor id.");
        } else {
            tracing::debug!(visitor_id = id, "created visitor id.");
        }
        id
    }
}
