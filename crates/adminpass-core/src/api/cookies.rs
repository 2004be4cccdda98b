use std::sync::Arc;

use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;
use tracing::{debug, warn};

use crate::storage::CookieJar;

/// Exposes one cookie from a `CookieJar` to reqwest.
///
/// The cookie is read from the jar on every request, so a cleared or
/// expired mirror stops being sent immediately. It is only sent to the
/// admin server's origin. Cookies set by the server are not persisted.
pub struct CookieMirror {
    jar: Arc<dyn CookieJar>,
    origin: Origin,
    name: String,
}

impl CookieMirror {
    pub fn new(jar: Arc<dyn CookieJar>, base_url: &Url, name: &str) -> Self {
        Self {
            jar,
            origin: Origin::of(base_url),
            name: name.to_string(),
        }
    }
}

impl CookieStore for CookieMirror {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let count = cookie_headers.count();
        if count > 0 {
            debug!(count, url = %url, "Ignoring cookies set by server");
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        if Origin::of(url) != self.origin {
            return None;
        }

        let cookie = match self.jar.get_cookie(&self.name) {
            Ok(cookie) => cookie?,
            Err(e) => {
                warn!(error = %e, "Failed to read cookie mirror");
                return None;
            }
        };

        if !cookie.matches_path(url.path()) {
            return None;
        }
        HeaderValue::from_str(&cookie.pair()).ok()
    }
}

/// Scheme, host and port of a URL.
#[derive(Debug, PartialEq, Eq)]
struct Origin {
    scheme: String,
    host: Option<String>,
    port: Option<u16>,
}

impl Origin {
    fn of(url: &Url) -> Self {
        Self {
            scheme: url.scheme().to_string(),
            host: url.host_str().map(|h| h.to_ascii_lowercase()),
            port: url.port_or_known_default(),
        }
    }
}
