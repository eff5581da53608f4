use std::fmt;
use url::Url;

// Ordered: the first name found in the user-agent string wins.
const PLATFORMS: [&str; 5] = ["Windows", "Mac", "Linux", "Android", "iOS"];
const BROWSERS: [&str; 4] = ["Chrome", "Firefox", "Safari", "Edge"];

const UNKNOWN_PLATFORM: &str = "Unknown OS";
const UNKNOWN_BROWSER: &str = "Unknown Browser";
const DIRECT_REFERRER: &str = "direct";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Navigation and environment state read when a visit opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    /// Full URL of the current page, including the query string.
    pub url: String,
    /// Raw referrer reported by the host; empty or `None` when there is none.
    pub referrer: Option<String>,
    pub user_agent: String,
    pub screen: ScreenSize,
}

pub fn platform_name(user_agent: &str) -> &'static str {
    PLATFORMS
        .iter()
        .copied()
        .find(|name| user_agent.contains(name))
        .unwrap_or(UNKNOWN_PLATFORM)
}

pub fn browser_name(user_agent: &str) -> &'static str {
    BROWSERS
        .iter()
        .copied()
        .find(|name| user_agent.contains(name))
        .unwrap_or(UNKNOWN_BROWSER)
}

/// "<platform>, <browser>" label sent in place of the raw user-agent string.
pub fn user_agent_label(user_agent: &str) -> String {
    format!("{}, {}", platform_name(user_agent), browser_name(user_agent))
}

/// Referrer hostname, else the `utm_source` of the page URL, else "direct".
///
/// A referrer that is present but cannot be parsed resolves to "direct"
/// without consulting the query string.
pub fn resolve_referrer(referrer: Option<&str>, page_url: &str) -> String {
    if let Some(raw) = referrer.map(str::trim).filter(|raw| !raw.is_empty()) {
        return match Url::parse(raw) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) if !host.is_empty() => host.to_string(),
                _ => DIRECT_REFERRER.to_string(),
            },
            Err(error) => {
                tracing::debug!(referrer = %raw, %error, "unparseable referrer.");
                DIRECT_REFERRER.to_string()
            }
        };
    }

    utm_source(page_url).unwrap_or_else(|| DIRECT_REFERRER.to_string())
}

fn utm_source(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "utm_source")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// True when `href`, resolved against `base`, shares its scheme, host and port.
pub fn same_origin(base: &str, href: &str) -> bool {
    let Ok(base) = Url::parse(base) else {
        return false;
    };
    match base.join(href) {
        Ok(target) => target.origin() == base.origin(),
        Err(_) => false,
    }
}
