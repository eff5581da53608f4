// Framework bootstrap: tracing, configuration and recorder wiring.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{IdentityStore, PageEnvironment, Transport};
use crate::frameworks::config;
use crate::interface_adapters::{
    BeaconTransport, FileIdentityStore, HttpTransport, KeepAliveTransport, SystemClock,
};
use crate::use_cases::{DeliveryChain, IdRange, IdentityService, RecorderParts, VisitRecorder};

/// Installs the global tracing subscriber. Safe to call more than once; only
/// the first call takes effect.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    let installed = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
    };
    if installed.is_err() {
        return;
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

#[derive(Debug)]
pub enum BootstrapError {
    HttpClient(reqwest::Error),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::HttpClient(err) => write!(f, "failed to build http client: {err}"),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<reqwest::Error> for BootstrapError {
    fn from(err: reqwest::Error) -> Self {
        BootstrapError::HttpClient(err)
    }
}

/// Everything the recorder needs besides the host page and storage.
#[derive(Debug, Clone)]
pub struct BeaconSettings {
    pub endpoint: String,
    pub id_range: IdRange,
    pub request_timeout: Duration,
    pub keepalive_timeout: Duration,
    pub storage_path: PathBuf,
}

impl BeaconSettings {
    /// Reads settings from the process environment, loading `.env` first.
    pub fn from_env() -> Self {
        // Load .env locally; safe to ignore when not present.
        let _ = dotenvy::dotenv();
        Self {
            endpoint: config::endpoint(),
            id_range: config::id_range(),
            request_timeout: config::request_timeout(),
            keepalive_timeout: config::keepalive_timeout(),
            storage_path: config::storage_path(),
        }
    }
}

/// Wires the reqwest transports, identity and clock into a recorder.
///
/// The active chain is a plain GET; the teardown chain is beacon first with
/// a keep-alive POST fallback.
pub fn build_recorder(
    environment: Arc<dyn PageEnvironment>,
    store: Arc<dyn IdentityStore>,
    settings: &BeaconSettings,
) -> Result<VisitRecorder, BootstrapError> {
    let http: Arc<dyn Transport> = Arc::new(HttpTransport::new(
        settings.endpoint.clone(),
        settings.request_timeout,
    )?);
    let beacon: Arc<dyn Transport> = Arc::new(BeaconTransport::new(
        settings.endpoint.clone(),
        settings.request_timeout,
    )?);
    let keepalive: Arc<dyn Transport> = Arc::new(KeepAliveTransport::new(
        settings.endpoint.clone(),
        settings.keepalive_timeout,
    )?);

    let active = DeliveryChain::new(vec![http]);
    let teardown = DeliveryChain::new(vec![beacon, keepalive]);
    tracing::debug!(
        endpoint = %settings.endpoint,
        active = ?active.kinds(),
        teardown = ?teardown.kinds(),
        "delivery chains configured."
    );

    let identity = IdentityService {
        store,
        id_range: settings.id_range,
    }
    .resolve();
    let debug = config::is_development_host(&environment.snapshot().url);

    Ok(VisitRecorder::new(RecorderParts {
        environment,
        clock: Arc::new(SystemClock),
        identity,
        active,
        teardown,
        debug,
    }))
}

/// Builds a recorder from environment settings with a file-backed identity.
pub fn build_recorder_from_env(
    environment: Arc<dyn PageEnvironment>,
) -> Result<VisitRecorder, BootstrapError> {
    let settings = BeaconSettings::from_env();
    let store = FileIdentityStore::new(settings.storage_path.clone());
    tracing::debug!(path = %store.path().display(), "identity store configured.");
    build_recorder(environment, Arc::new(store), &settings)
}
