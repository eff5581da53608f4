use std::{env, path::PathBuf, time::Duration};

use crate::use_cases::IdRange;

// Runtime constants for the beacon; every value can be overridden from the environment.

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/collect";
pub const DEFAULT_ID_MIN: u32 = 1000;
pub const DEFAULT_ID_MAX: u32 = 2000;
pub const DEFAULT_STORAGE_PATH: &str = ".visit_beacon/identity.json";

// Hosts where every delivered record is logged.
const DEVELOPMENT_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];
const DEVELOPMENT_DOMAIN_SUFFIX: &str = "webflow.io";

pub fn endpoint() -> String {
    env::var("BEACON_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string())
}

pub fn id_range() -> IdRange {
    let min = parse_or(env::var("BEACON_ID_MIN").ok(), DEFAULT_ID_MIN);
    let max = parse_or(env::var("BEACON_ID_MAX").ok(), DEFAULT_ID_MAX);
    IdRange::new(min, max)
}

pub fn request_timeout() -> Duration {
    Duration::from_millis(parse_or(env::var("BEACON_REQUEST_TIMEOUT_MS").ok(), 5000))
}

pub fn keepalive_timeout() -> Duration {
    Duration::from_millis(parse_or(env::var("BEACON_KEEPALIVE_TIMEOUT_MS").ok(), 1500))
}

pub fn storage_path() -> PathBuf {
    env::var("BEACON_STORAGE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_PATH))
}

/// True for local and staging hosts where deliveries are logged verbosely.
pub fn is_development_host(page_url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(page_url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    DEVELOPMENT_HOSTS.contains(&host)
        || host == DEVELOPMENT_DOMAIN_SUFFIX
        || host.ends_with(&format!(".{DEVELOPMENT_DOMAIN_SUFFIX}"))
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
