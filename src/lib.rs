pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use domain::{
    LifecycleEvent, PageSnapshot, ScreenSize, Visibility, VisitRecord, VisitorIdentity,
    VisitorKind,
};
pub use frameworks::bootstrap::{
    BeaconSettings, BootstrapError, build_recorder, build_recorder_from_env, init_tracing,
};
pub use use_cases::{DeliveryReport, StartOutcome, VisitRecorder};
