// Use cases layer: identity resolution, delivery and the visit lifecycle.

pub mod delivery;
pub mod identity;
pub mod recorder;

#[cfg(test)]
pub(crate) mod test_support;

pub use delivery::{DeliveryChain, DeliveryReport};
pub use identity::{IS_OWNER_KEY, IdRange, IdentityService, VISITOR_ID_KEY};
pub use recorder::{RecorderParts, StartOutcome, VisitRecorder};
