use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::{
    Clock, IdentityStore, PageEnvironment, PageSnapshot, ScreenSize, Transport, TransportError,
    TransportKind, VisitRecord, VisitorIdentity, VisitorKind,
};

pub(crate) fn start_instant() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn sample_record() -> VisitRecord {
    VisitRecord::open(
        VisitorIdentity {
            visitor_id: 1500,
            kind: VisitorKind::Visitor,
        },
        "https://site.example/pricing".to_string(),
        "direct".to_string(),
        "Windows, Chrome".to_string(),
        "1920x1080".to_string(),
        start_instant(),
    )
}

// Manually advanced time source so durations are deterministic.
#[derive(Clone)]
pub(crate) struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(start_instant())),
        }
    }

    pub(crate) fn advance_millis(&self, millis: i64) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard += Duration::milliseconds(millis);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

// Host page whose URL and referrer tests can change between events.
#[derive(Clone)]
pub(crate) struct FakePage {
    snapshot: Arc<Mutex<PageSnapshot>>,
}

impl FakePage {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(PageSnapshot {
                url: url.to_string(),
                referrer: Some("https://search.example/q".to_string()),
                user_agent: "Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0".to_string(),
                screen: ScreenSize {
                    width: 1280,
                    height: 720,
                },
            })),
        }
    }

    pub(crate) fn navigate(&self, url: &str) {
        let mut guard = self.snapshot.lock().expect("page mutex poisoned");
        guard.url = url.to_string();
    }
}

impl PageEnvironment for FakePage {
    fn snapshot(&self) -> PageSnapshot {
        self.snapshot.lock().expect("page mutex poisoned").clone()
    }
}

// Transport that records every payload; optionally rejects all of them.
#[derive(Clone)]
pub(crate) struct RecordingTransport {
    kind: TransportKind,
    sent: Arc<Mutex<Vec<VisitRecord>>>,
    should_fail: bool,
}

impl RecordingTransport {
    pub(crate) fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            sent: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
        }
    }

    pub(crate) fn failing(kind: TransportKind) -> Self {
        Self {
            should_fail: true,
            ..Self::new(kind)
        }
    }

    pub(crate) fn sent(&self) -> Vec<VisitRecord> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn send(&self, record: &VisitRecord) -> Result<(), TransportError> {
        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push(record.clone());
        if self.should_fail {
            return Err(TransportError::Rejected("simulated failure".to_string()));
        }
        Ok(())
    }
}

// Transport whose sends never complete; flags when a pending send is dropped.
#[derive(Clone, Default)]
pub(crate) struct StalledTransport {
    started: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

struct CancelFlag(Arc<AtomicBool>);

impl Drop for CancelFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl StalledTransport {
    pub(crate) fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StalledTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn send(&self, _record: &VisitRecord) -> Result<(), TransportError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let _flag = CancelFlag(self.cancelled.clone());
        std::future::pending::<()>().await;
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub(crate) fn with_values(values: &[(&str, &str)]) -> Self {
        let store = Self::default();
        {
            let mut guard = store.values.lock().expect("store mutex poisoned");
            for (key, value) in values {
                guard.insert(key.to_string(), value.to_string());
            }
        }
        store
    }

    pub(crate) fn value(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
    }
}

impl IdentityStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        let mut guard = self.values.lock().expect("store mutex poisoned");
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// Storage that is never available, like a browser with storage disabled.
pub(crate) struct FailingStore;

impl IdentityStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, String> {
        Err("storage unavailable".to_string())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), String> {
        Err("storage unavailable".to_string())
    }
}
