use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::utils::token_preview;

/// What authorization did to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// A bearer header was added from the stored token.
    Injected,
    /// The caller already set an `Authorization` header; it was left alone.
    Preserved,
    /// No usable token; the request goes out unauthorized.
    Missing,
}

/// Adds `Authorization: Bearer <token>` to requests that lack one.
#[derive(Clone)]
pub struct RequestAuthorizer {
    tokens: TokenStore,
}

impl RequestAuthorizer {
    pub fn new(tokens: TokenStore) -> Self {
        Self { tokens }
    }

    pub fn authorize(&self, headers: &mut HeaderMap) -> Authorization {
        if headers.contains_key(AUTHORIZATION) {
            debug!("Authorization header already present");
            return Authorization::Preserved;
        }

        let Some(token) = self.tokens.get() else {
            warn!("No stored token, sending request without authorization");
            return Authorization::Missing;
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
                debug!(token = %token_preview(&token), "Token added to request");
                Authorization::Injected
            }
            Err(e) => {
                warn!(error = %e, "Stored token is not a valid header value");
                Authorization::Missing
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{MemoryCookieJar, MemoryStore};

    fn authorizer_with(token: Option<&str>) -> RequestAuthorizer {
        let tokens = TokenStore::new(Arc::new(MemoryStore::new()), Arc::new(MemoryCookieJar::new()));
        if let Some(token) = token {
            tokens.set(token);
        }
        RequestAuthorizer::new(tokens)
    }

    #[test]
    fn test_injects_bearer_header() {
        let authorizer = authorizer_with(Some("aaa.bbb.ccc"));
        let mut headers = HeaderMap::new();

        assert_eq!(authorizer.authorize(&mut headers), Authorization::Injected);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer aaa.bbb.ccc");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn test_existing_header_wins() {
        let authorizer = authorizer_with(Some("aaa.bbb.ccc"));
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("X"));

        assert_eq!(authorizer.authorize(&mut headers), Authorization::Preserved);
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "X");
    }

    #[test]
    fn test_no_token_leaves_request_unauthorized() {
        let authorizer = authorizer_with(None);
        let mut headers = HeaderMap::new();

        assert_eq!(authorizer.authorize(&mut headers), Authorization::Missing);
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_token_with_control_characters_is_skipped() {
        let authorizer = authorizer_with(Some("aaa.bbb.c\ncc"));
        let mut headers = HeaderMap::new();

        assert_eq!(authorizer.authorize(&mut headers), Authorization::Missing);
        assert!(headers.is_empty());
    }
}
