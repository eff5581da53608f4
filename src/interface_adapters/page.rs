use std::sync::{PoisonError, RwLock};

use crate::domain::{PageEnvironment, PageSnapshot, ScreenSize};

/// Page state pushed in by the host shell (webview, wasm glue, test driver).
///
/// The host updates the URL before telling the recorder about a navigation,
/// and the recorder reads it back through `PageEnvironment`.
pub struct HostPage {
    snapshot: RwLock<PageSnapshot>,
}

impl HostPage {
    pub fn new(
        url: impl Into<String>,
        referrer: Option<String>,
        user_agent: impl Into<String>,
        screen: ScreenSize,
    ) -> Self {
        Self {
            snapshot: RwLock::new(PageSnapshot {
                url: url.into(),
                referrer,
                user_agent: user_agent.into(),
                screen,
            }),
        }
    }

    pub fn set_url(&self, url: impl Into<String>) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.url = url.into();
    }

    pub fn set_screen(&self, screen: ScreenSize) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.screen = screen;
    }
}

impl PageEnvironment for HostPage {
    fn snapshot(&self) -> PageSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
