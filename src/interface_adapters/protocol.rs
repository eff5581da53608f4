use chrono::{DateTime, SecondsFormat, Utc};
use url::form_urlencoded;

use crate::domain::VisitRecord;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// Wire field names sent to the collector.
pub const FIELD_VISITOR_ID: &str = "visitorId";
pub const FIELD_VISITOR_KIND: &str = "visitorKind";
pub const FIELD_URL: &str = "url";
pub const FIELD_REFERRER: &str = "referrer";
pub const FIELD_USER_AGENT: &str = "userAgent";
pub const FIELD_SCREEN_SIZE: &str = "screenSize";
pub const FIELD_START_TIME: &str = "startTime";
pub const FIELD_END_TIME: &str = "endTime";
pub const FIELD_TIME_ON_PAGE: &str = "timeOnPage";

/// Field/value pairs in wire order.
pub fn form_fields(record: &VisitRecord) -> Vec<(&'static str, String)> {
    vec![
        (FIELD_VISITOR_ID, record.visitor_id.to_string()),
        (FIELD_VISITOR_KIND, record.visitor_kind.to_string()),
        (FIELD_URL, record.url.clone()),
        (FIELD_REFERRER, record.referrer.clone()),
        (FIELD_USER_AGENT, record.user_agent.clone()),
        (FIELD_SCREEN_SIZE, record.screen_size.clone()),
        (FIELD_START_TIME, format_timestamp(record.start_time)),
        (FIELD_END_TIME, format_timestamp(record.end_time)),
        (FIELD_TIME_ON_PAGE, record.time_on_page_seconds.to_string()),
    ]
}

/// URL-encoded form body, also used as the GET query string.
pub fn encode_form(record: &VisitRecord) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_fields(record) {
        serializer.append_pair(key, &value);
    }
    serializer.finish()
}

// RFC 3339 with millisecond precision and a `Z` suffix.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
