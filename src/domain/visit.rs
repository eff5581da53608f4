use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Classification used to filter site maintainers out of the analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitorKind {
    Owner,
    Visitor,
}

impl VisitorKind {
    pub fn from_owner_flag(is_owner: bool) -> Self {
        if is_owner {
            VisitorKind::Owner
        } else {
            VisitorKind::Visitor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisitorKind::Owner => "owner",
            VisitorKind::Visitor => "visitor",
        }
    }
}

impl fmt::Display for VisitorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity persisted in local storage across page loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitorIdentity {
    pub visitor_id: u32,
    pub kind: VisitorKind,
}

// One record per open visit; transmitted, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub visitor_id: u32,
    pub visitor_kind: VisitorKind,
    pub url: String,
    pub referrer: String,
    pub user_agent: String,
    pub screen_size: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub time_on_page_seconds: u64,
}

impl VisitRecord {
    /// Opens a record at `now`; end time equals start time until finalized.
    pub fn open(
        identity: VisitorIdentity,
        url: String,
        referrer: String,
        user_agent: String,
        screen_size: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            visitor_id: identity.visitor_id,
            visitor_kind: identity.kind,
            url,
            referrer,
            user_agent,
            screen_size,
            start_time: now,
            end_time: now,
            time_on_page_seconds: 0,
        }
    }

    /// Stamps the end of the visit. A clock that went backwards is clamped
    /// to the start time so `end_time >= start_time` always holds.
    pub fn finalize(&mut self, now: DateTime<Utc>) {
        self.end_time = now.max(self.start_time);
        self.time_on_page_seconds = time_on_page_seconds(self.start_time, self.end_time);
    }
}

/// Elapsed seconds rounded half-up, so 2500 ms becomes 3.
pub fn time_on_page_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    let millis = (end - start).num_milliseconds().max(0) as u64;
    (millis + 500) / 1000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Signals a host page forwards to the recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    BeforeUnload,
    PageHide,
    VisibilityChanged(Visibility),
    /// In-page route change reported by the host routing layer.
    Navigated,
    LinkClicked { href: String },
    Resized { width: u32, height: u32 },
}

/// Why a visit is being finalized; decides which transport chain is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeTrigger {
    BeforeUnload,
    PageHide,
    Hidden,
    LinkClick,
    Navigation,
    Dispose,
}

impl FinalizeTrigger {
    /// Teardown triggers may lose ordinary requests, so they go through the beacon.
    pub fn is_teardown(&self) -> bool {
        !matches!(self, FinalizeTrigger::Navigation)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FinalizeTrigger::BeforeUnload => "beforeunload",
            FinalizeTrigger::PageHide => "pagehide",
            FinalizeTrigger::Hidden => "visibility_hidden",
            FinalizeTrigger::LinkClick => "link_click",
            FinalizeTrigger::Navigation => "navigation",
            FinalizeTrigger::Dispose => "dispose",
        }
    }
}
