// Fake collection endpoint shared by the delivery integration tests.
use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use visit_beacon::BeaconSettings;
use visit_beacon::use_cases::IdRange;

// One request as seen by the collector.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: &'static str,
    pub fields: HashMap<String, String>,
}

#[derive(Clone)]
struct CollectorState {
    hits: Arc<Mutex<Vec<Hit>>>,
    status: StatusCode,
}

pub struct Collector {
    pub endpoint: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl Collector {
    // Start a collector on an ephemeral port that answers every request with `status`.
    pub async fn start(status: StatusCode) -> Self {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let state = CollectorState {
            hits: Arc::clone(&hits),
            status,
        };
        let app = Router::new()
            .route("/collect", get(collect_get).post(collect_post))
            .with_state(state);

        // Bind to an ephemeral port to avoid collisions with local services.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral test port");
        let addr = listener.local_addr().expect("get local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("collector failed");
        });

        Self {
            endpoint: format!("http://{addr}/collect"),
            hits,
        }
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().expect("hits mutex poisoned").clone()
    }

    // Poll until at least `count` requests arrived; detached beacons land later.
    pub async fn wait_for_hits(&self, count: usize) -> Vec<Hit> {
        for _ in 0..200 {
            let hits = self.hits();
            if hits.len() >= count {
                return hits;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("collector saw {} hits, expected {count}", self.hits().len());
    }

    pub fn settings(&self) -> BeaconSettings {
        settings_for(&self.endpoint)
    }
}

pub fn settings_for(endpoint: &str) -> BeaconSettings {
    BeaconSettings {
        endpoint: endpoint.to_string(),
        id_range: IdRange::new(1000, 2000),
        request_timeout: Duration::from_secs(2),
        keepalive_timeout: Duration::from_secs(1),
        storage_path: PathBuf::from("unused.json"),
    }
}

// Address nothing listens on: bind, read the port, then drop the listener.
pub async fn closed_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    drop(listener);
    format!("http://{addr}/collect")
}

async fn collect_get(
    State(state): State<CollectorState>,
    Query(fields): Query<HashMap<String, String>>,
) -> StatusCode {
    record(&state, "GET", fields)
}

async fn collect_post(
    State(state): State<CollectorState>,
    Form(fields): Form<HashMap<String, String>>,
) -> StatusCode {
    record(&state, "POST", fields)
}

fn record(state: &CollectorState, method: &'static str, fields: HashMap<String, String>) -> StatusCode {
    state
        .hits
        .lock()
        .expect("hits mutex poisoned")
        .push(Hit { method, fields });
    state.status
}
