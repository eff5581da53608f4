use chrono::{DateTime, Utc};

use crate::domain::Clock;

// System clock adapter used by the recorder.
#[derive(Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
