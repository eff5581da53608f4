// Domain layer: visit records, derived page values and ports.

pub mod errors;
pub mod page;
pub mod ports;
pub mod visit;

pub use errors::{DeliveryError, TransportError};
pub use page::{
    PageSnapshot, ScreenSize, browser_name, platform_name, resolve_referrer, same_origin,
    user_agent_label,
};
pub use ports::{Clock, IdentityStore, PageEnvironment, Transport, TransportKind};
pub use visit::{
    FinalizeTrigger, LifecycleEvent, Visibility, VisitRecord, VisitorIdentity, VisitorKind,
    time_on_page_seconds,
};
