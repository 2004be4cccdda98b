use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::storage::{CookieJar, KeyValueStore, StoredCookie};
use crate::utils::token_preview;

use super::TOKEN_KEY;

/// Number of `.`-separated segments a credential must have.
const TOKEN_SEGMENTS: usize = 3;

/// Structural sanity check: the token splits into exactly three segments on
/// `.`. Signatures are not checked here; the server verifies the token.
pub fn is_well_formed(token: &str) -> bool {
    token.split('.').count() == TOKEN_SEGMENTS
}

/// The admin bearer credential.
///
/// Writes go to the primary store and then, independently, to an expiring
/// cookie. Neither write is rolled back if the other fails. Clone is cheap;
/// clones share the same backends.
#[derive(Clone)]
pub struct TokenStore {
    primary: Arc<dyn KeyValueStore>,
    mirror: Arc<dyn CookieJar>,
}

impl TokenStore {
    pub fn new(primary: Arc<dyn KeyValueStore>, mirror: Arc<dyn CookieJar>) -> Self {
        Self { primary, mirror }
    }

    /// Store a credential in both backends. Failures are logged, not returned.
    pub fn set(&self, token: &str) {
        if token.is_empty() {
            warn!("Refusing to store an empty token");
            return;
        }

        match self.primary.set(TOKEN_KEY, token) {
            Ok(()) => debug!(token = %token_preview(token), "Token saved to primary store"),
            Err(e) => error!(error = %e, "Failed to save token to primary store"),
        }

        match self.mirror.set_cookie(StoredCookie::mirror(TOKEN_KEY, token)) {
            Ok(()) => debug!("Token mirrored to cookie"),
            Err(e) => error!(error = %e, "Failed to mirror token to cookie"),
        }
    }

    /// Current credential, if one is stored and looks valid.
    ///
    /// A stored value of the wrong shape is cleared from both backends.
    pub fn get(&self) -> Option<String> {
        let token = match self.primary.get(TOKEN_KEY) {
            Ok(token) => token?,
            Err(e) => {
                error!(error = %e, "Failed to read token");
                return None;
            }
        };

        if token.trim().is_empty() {
            return None;
        }

        if !is_well_formed(&token) {
            warn!("Stored token has an invalid format, clearing it");
            self.clear();
            return None;
        }

        Some(token)
    }

    /// Remove the credential from both backends, each independently.
    pub fn clear(&self) {
        if let Err(e) = self.primary.remove(TOKEN_KEY) {
            error!(error = %e, "Failed to remove token from primary store");
        }
        if let Err(e) = self.mirror.set_cookie(StoredCookie::expired(TOKEN_KEY)) {
            error!(error = %e, "Failed to clear token cookie");
        }
        debug!("Token cleared");
    }

    pub fn is_logged_in(&self) -> bool {
        self.get().map(|t| !t.trim().is_empty()).unwrap_or(false)
    }

    /// Full `Authorization` header value for the current credential.
    pub fn authorization_header_value(&self) -> Option<String> {
        self.get().map(|token| format!("Bearer {}", token))
    }

    /// The live cookie mirror, if any.
    pub fn mirrored_cookie(&self) -> Option<StoredCookie> {
        match self.mirror.get_cookie(TOKEN_KEY) {
            Ok(cookie) => cookie,
            Err(e) => {
                error!(error = %e, "Failed to read token cookie");
                None
            }
        }
    }

    pub(crate) fn cookie_jar(&self) -> Arc<dyn CookieJar> {
        Arc::clone(&self.mirror)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryCookieJar, MemoryStore, StorageError};

    /// Store that fails every operation, like disabled browser storage.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }
    }

    fn memory_tokens() -> (TokenStore, Arc<MemoryStore>, Arc<MemoryCookieJar>) {
        let primary = Arc::new(MemoryStore::new());
        let jar = Arc::new(MemoryCookieJar::new());
        let tokens = TokenStore::new(primary.clone(), jar.clone());
        (tokens, primary, jar)
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("aaa.bbb.ccc"));
        assert!(is_well_formed("eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJhZG1pbiJ9.sig"));
        assert!(is_well_formed(".."));
        assert!(!is_well_formed("aaa.bbb"));
        assert!(!is_well_formed("aaa.bbb.ccc.ddd"));
        assert!(!is_well_formed("opaque"));
    }

    #[test]
    fn test_set_then_get() {
        let (tokens, _, jar) = memory_tokens();
        for token in ["aaa.bbb.ccc", "x.y.z", "header.payload.signature"] {
            tokens.set(token);
            assert_eq!(tokens.get().as_deref(), Some(token));
            assert_eq!(
                jar.get_cookie(TOKEN_KEY).unwrap().map(|c| c.value).as_deref(),
                Some(token)
            );
        }
    }

    #[test]
    fn test_set_empty_is_ignored() {
        let (tokens, primary, _) = memory_tokens();
        tokens.set("");
        assert_eq!(primary.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_malformed_token_self_heals() {
        let (tokens, primary, jar) = memory_tokens();
        for bad in ["not-a-token", "aaa.bbb", "a.b.c.d"] {
            primary.set(TOKEN_KEY, bad).unwrap();
            jar.set_cookie(StoredCookie::mirror(TOKEN_KEY, bad)).unwrap();

            assert_eq!(tokens.get(), None);
            assert_eq!(primary.get(TOKEN_KEY).unwrap(), None);
            assert!(jar.get_cookie(TOKEN_KEY).unwrap().is_none());
        }
    }

    #[test]
    fn test_blank_token_is_absent_but_not_cleared() {
        let (tokens, primary, _) = memory_tokens();
        primary.set(TOKEN_KEY, "   ").unwrap();
        assert_eq!(tokens.get(), None);
        assert!(!tokens.is_logged_in());
        assert_eq!(primary.get(TOKEN_KEY).unwrap().as_deref(), Some("   "));
    }

    #[test]
    fn test_clear() {
        let (tokens, _, _) = memory_tokens();
        tokens.set("aaa.bbb.ccc");
        assert!(tokens.is_logged_in());

        tokens.clear();
        assert_eq!(tokens.get(), None);
        assert!(!tokens.is_logged_in());
        assert!(tokens.mirrored_cookie().is_none());
    }

    #[test]
    fn test_authorization_header_value() {
        let (tokens, _, _) = memory_tokens();
        assert_eq!(tokens.authorization_header_value(), None);
        tokens.set("aaa.bbb.ccc");
        assert_eq!(
            tokens.authorization_header_value().as_deref(),
            Some("Bearer aaa.bbb.ccc")
        );
    }

    #[test]
    fn test_broken_primary_degrades_to_logged_out() {
        let jar = Arc::new(MemoryCookieJar::new());
        let tokens = TokenStore::new(Arc::new(BrokenStore), jar.clone());

        tokens.set("aaa.bbb.ccc");
        assert_eq!(tokens.get(), None);
        assert!(!tokens.is_logged_in());
        tokens.clear();

        // The mirror write is independent of the failed primary write
        tokens.set("aaa.bbb.ccc");
        assert!(jar.get_cookie(TOKEN_KEY).unwrap().is_some());
    }
}
