// Visit lifecycle: open a record per navigation, finalize it once, deliver it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

use crate::domain::{
    Clock, FinalizeTrigger, LifecycleEvent, PageEnvironment, ScreenSize, Visibility, VisitRecord,
    VisitorIdentity, resolve_referrer, same_origin, user_agent_label,
};
use crate::use_cases::delivery::{DeliveryChain, DeliveryReport};

/// Collaborators the recorder is built from.
pub struct RecorderParts {
    pub environment: Arc<dyn PageEnvironment>,
    pub clock: Arc<dyn Clock>,
    pub identity: VisitorIdentity,
    /// Chain used while the page is alive (initial sends, in-page navigation).
    pub active: DeliveryChain,
    /// Chain used while the page is being torn down.
    pub teardown: DeliveryChain,
    /// Log every delivered record at info level.
    pub debug: bool,
}

/// Result of asking the recorder to open a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Opened,
    AlreadyOpen,
    Disposed,
}

#[derive(Default)]
struct RecorderState {
    visit: Option<VisitRecord>,
    is_tracking: bool,
    initial_delivery: Option<JoinHandle<DeliveryReport>>,
    disposed: bool,
}

pub struct VisitRecorder {
    environment: Arc<dyn PageEnvironment>,
    clock: Arc<dyn Clock>,
    identity: VisitorIdentity,
    active: Arc<DeliveryChain>,
    teardown: DeliveryChain,
    debug: bool,
    state: Mutex<RecorderState>,
}

impl VisitRecorder {
    pub fn new(parts: RecorderParts) -> Self {
        Self {
            environment: parts.environment,
            clock: parts.clock,
            identity: parts.identity,
            active: Arc::new(parts.active),
            teardown: parts.teardown,
            debug: parts.debug,
            state: Mutex::new(RecorderState::default()),
        }
    }

    pub fn identity(&self) -> VisitorIdentity {
        self.identity
    }

    /// Latest record, open or finalized.
    pub fn current_visit(&self) -> Option<VisitRecord> {
        self.lock_state().visit.clone()
    }

    pub fn is_tracking(&self) -> bool {
        self.lock_state().is_tracking
    }

    /// Opens a visit for the current page and sends the initial record.
    ///
    /// A visit already open for the same URL is left untouched. The initial
    /// send runs in the background; any earlier one still in flight is aborted.
    #[tracing::instrument(name = "start_visit", skip_all)]
    pub fn start_visit(&self) -> StartOutcome {
        let snapshot = self.environment.snapshot();

        let mut state = self.lock_state();
        if state.disposed {
            return StartOutcome::Disposed;
        }
        if state.is_tracking
            && state
                .visit
                .as_ref()
                .is_some_and(|visit| visit.url == snapshot.url)
        {
            tracing::debug!(url = %snapshot.url, "visit already open.");
            return StartOutcome::AlreadyOpen;
        }
        abort_initial_delivery(&mut state);
        if state.is_tracking {
            // Close the visit being replaced so its finalized record still goes out.
            let now = self.clock.now();
            if let Some(visit) = state.visit.as_mut() {
                visit.finalize(now);
                tracing::info!(
                    url = %visit.url,
                    time_on_page = visit.time_on_page_seconds,
                    "visit finalized before replacement."
                );
                let finalized = visit.clone();
                // Detached: nothing cancels a finalized send.
                drop(self.spawn_delivery(finalized, "replaced"));
            }
            state.is_tracking = false;
        }

        let record = VisitRecord::open(
            self.identity,
            snapshot.url.clone(),
            resolve_referrer(snapshot.referrer.as_deref(), &snapshot.url),
            user_agent_label(&snapshot.user_agent),
            snapshot.screen.to_string(),
            self.clock.now(),
        );
        tracing::info!(
            url = %record.url,
            referrer = %record.referrer,
            visitor_id = record.visitor_id,
            "visit started."
        );

        state.initial_delivery = self.spawn_delivery(record.clone(), "initial");
        state.visit = Some(record);
        state.is_tracking = true;
        StartOutcome::Opened
    }

    /// Closes the open visit and delivers the finalized record.
    ///
    /// Only the first call after a visit opened does anything; later calls
    /// return `None`. Teardown triggers go through the beacon chain.
    #[tracing::instrument(name = "finalize_visit", skip_all, fields(trigger = trigger.as_str()))]
    pub async fn finalize_visit(&self, trigger: FinalizeTrigger) -> Option<DeliveryReport> {
        let record = {
            let mut state = self.lock_state();
            if !state.is_tracking {
                return None;
            }
            state.is_tracking = false;
            let now = self.clock.now();
            let visit = state.visit.as_mut()?;
            visit.finalize(now);
            visit.clone()
        };
        tracing::info!(
            url = %record.url,
            time_on_page = record.time_on_page_seconds,
            "visit finalized."
        );

        let chain = if trigger.is_teardown() {
            &self.teardown
        } else {
            self.active.as_ref()
        };
        let report = chain.deliver(&record).await;
        log_report(&report, &record, trigger.as_str(), self.debug);
        Some(report)
    }

    /// Entry point for the host routing layer after an in-page route change.
    ///
    /// Finalizes the visit being left before the next one opens, and drops a
    /// stale initial send so it cannot race the new visit.
    #[tracing::instrument(name = "on_navigation", skip_all)]
    pub async fn on_navigation(&self) -> StartOutcome {
        let url = self.environment.snapshot().url;
        {
            let mut state = self.lock_state();
            if state.disposed {
                return StartOutcome::Disposed;
            }
            if state.is_tracking && state.visit.as_ref().is_some_and(|visit| visit.url == url) {
                return StartOutcome::AlreadyOpen;
            }
            abort_initial_delivery(&mut state);
        }

        self.finalize_visit(FinalizeTrigger::Navigation).await;
        self.start_visit()
    }

    /// Finalizes on a click to a same-origin link; other links are ignored.
    pub async fn on_link_click(&self, href: &str) -> Option<DeliveryReport> {
        let is_internal = {
            let state = self.lock_state();
            state.is_tracking
                && state
                    .visit
                    .as_ref()
                    .is_some_and(|visit| same_origin(&visit.url, href))
        };
        if !is_internal {
            tracing::debug!(%href, "ignoring link click.");
            return None;
        }
        self.finalize_visit(FinalizeTrigger::LinkClick).await
    }

    /// Hidden finalizes the visit; visible again reopens one for the current URL.
    pub async fn on_visibility_change(&self, visibility: Visibility) {
        match visibility {
            Visibility::Hidden => {
                self.finalize_visit(FinalizeTrigger::Hidden).await;
            }
            Visibility::Visible => {
                if !self.is_tracking() {
                    self.start_visit();
                }
            }
        }
    }

    /// Refreshes the screen size of the open visit.
    pub fn refresh_screen_size(&self, screen: ScreenSize) {
        let mut state = self.lock_state();
        if !state.is_tracking {
            return;
        }
        if let Some(visit) = state.visit.as_mut() {
            visit.screen_size = screen.to_string();
        }
    }

    /// Dispatches a host lifecycle signal.
    pub async fn handle(&self, event: LifecycleEvent) {
        tracing::debug!(?event, "lifecycle event.");
        match event {
            LifecycleEvent::BeforeUnload => {
                self.finalize_visit(FinalizeTrigger::BeforeUnload).await;
            }
            LifecycleEvent::PageHide => {
                self.finalize_visit(FinalizeTrigger::PageHide).await;
            }
            LifecycleEvent::VisibilityChanged(visibility) => {
                self.on_visibility_change(visibility).await;
            }
            LifecycleEvent::Navigated => {
                self.on_navigation().await;
            }
            LifecycleEvent::LinkClicked { href } => {
                self.on_link_click(&href).await;
            }
            LifecycleEvent::Resized { width, height } => {
                self.refresh_screen_size(ScreenSize { width, height });
            }
        }
    }

    /// Waits for the pending initial send, if any.
    pub async fn flush(&self) -> Option<DeliveryReport> {
        let handle = self.lock_state().initial_delivery.take()?;
        match handle.await {
            Ok(report) => Some(report),
            Err(error) => {
                tracing::debug!(%error, "initial delivery did not complete.");
                None
            }
        }
    }

    /// Finalizes the open visit and turns every later call into a no-op.
    #[tracing::instrument(name = "dispose", skip_all)]
    pub async fn dispose(&self) -> Option<DeliveryReport> {
        {
            let mut state = self.lock_state();
            if state.disposed {
                return None;
            }
            state.disposed = true;
            // Detach rather than abort: the initial send may still land.
            state.initial_delivery.take();
        }
        self.finalize_visit(FinalizeTrigger::Dispose).await
    }

    // Sends on the active chain in the background.
    fn spawn_delivery(
        &self,
        record: VisitRecord,
        phase: &'static str,
    ) -> Option<JoinHandle<DeliveryReport>> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(error) => {
                tracing::warn!(phase, %error, "no async runtime, visit record not sent.");
                return None;
            }
        };

        let chain = Arc::clone(&self.active);
        let debug = self.debug;
        Some(runtime.spawn(async move {
            let report = chain.deliver(&record).await;
            log_report(&report, &record, phase, debug);
            report
        }))
    }

    fn lock_state(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn abort_initial_delivery(state: &mut RecorderState) {
    if let Some(handle) = state.initial_delivery.take() {
        if !handle.is_finished() {
            tracing::debug!("aborting stale initial delivery.");
        }
        handle.abort();
    }
}

fn log_report(report: &DeliveryReport, record: &VisitRecord, phase: &str, debug: bool) {
    match report {
        Ok(transport) => {
            if debug {
                let payload = serde_json::to_string(record).unwrap_or_default();
                tracing::info!(phase, %transport, %payload, "visit record sent.");
            }
        }
        Err(error) => {
            tracing::error!(phase, url = %record.url, %error, "visit record could not be delivered.");
        }
    }
}
