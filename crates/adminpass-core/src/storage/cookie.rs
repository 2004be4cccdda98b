use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime of the credential cookie mirror.
pub const MIRROR_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub expires: DateTime<Utc>,
    pub same_site: SameSite,
}

impl StoredCookie {
    /// Cookie mirroring a credential: path "/", SameSite=Lax, 7-day expiry.
    pub fn mirror(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            expires: Utc::now() + Duration::days(MIRROR_TTL_DAYS),
            same_site: SameSite::Lax,
        }
    }

    /// An empty cookie dated at the epoch. Writing it removes `name`.
    pub fn expired(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: String::new(),
            path: "/".to_string(),
            expires: Utc.timestamp_opt(0, 0).single().unwrap_or_default(),
            same_site: SameSite::Lax,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires <= Utc::now()
    }

    /// Whether the cookie applies to a request path (RFC 6265 path-match).
    pub fn matches_path(&self, request_path: &str) -> bool {
        if request_path == self.path {
            return true;
        }
        if !request_path.starts_with(&self.path) {
            return false;
        }
        self.path.ends_with('/') || request_path[self.path.len()..].starts_with('/')
    }

    /// `name=value` pair as sent in a `Cookie` request header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Replace any cookie with the same name, then drop everything expired.
pub(crate) fn upsert(cookies: &mut Vec<StoredCookie>, cookie: StoredCookie) {
    cookies.retain(|c| c.name != cookie.name);
    cookies.push(cookie);
    cookies.retain(|c| !c.is_expired());
}

pub(crate) fn find_live(cookies: &[StoredCookie], name: &str) -> Option<StoredCookie> {
    cookies
        .iter()
        .find(|c| c.name == name && !c.is_expired())
        .cloned()
}
