use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::presenter::{Navigation, Navigator, NoticeLevel, Presenter};

use super::{messages, TokenStore, GUARD_REDIRECT_DELAY, GUARD_SETTLE_DELAY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The page does not require a session (login page, public pages).
    Exempt,
    /// A session is present.
    Authorized,
    /// No session; the user should be sent to the login page.
    Unauthenticated(Navigation),
}

/// Client-side gate for pages in the authenticated section.
///
/// Advisory only: the server still authorizes every API call.
pub struct SessionGuard {
    tokens: TokenStore,
    protected_prefix: String,
    login_page: String,
    settle_delay: Duration,
}

impl SessionGuard {
    pub fn new(tokens: TokenStore, protected_prefix: &str, login_page: &str) -> Self {
        Self {
            tokens,
            protected_prefix: protected_prefix.to_string(),
            login_page: login_page.to_string(),
            settle_delay: GUARD_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Decide what to do for a page, without side effects.
    pub async fn check(&self, page: &str) -> GuardOutcome {
        if page == self.login_page || !page.starts_with(&self.protected_prefix) {
            return GuardOutcome::Exempt;
        }

        // Let the rest of page setup run first
        tokio::time::sleep(self.settle_delay).await;

        if self.tokens.is_logged_in() {
            debug!(page, "Session present");
            GuardOutcome::Authorized
        } else {
            GuardOutcome::Unauthenticated(Navigation::after(&self.login_page, GUARD_REDIRECT_DELAY))
        }
    }

    /// Check a page and act on the result through the presentation layer.
    pub async fn enforce(
        &self,
        page: &str,
        presenter: &Arc<dyn Presenter>,
        navigator: &Arc<dyn Navigator>,
    ) -> GuardOutcome {
        let outcome = self.check(page).await;
        match &outcome {
            GuardOutcome::Unauthenticated(navigation) => {
                warn!(page, "No session, redirecting to login");
                presenter.notify(NoticeLevel::Warning, messages::PLEASE_LOG_IN);
                navigator.navigate(navigation.clone());
            }
            GuardOutcome::Authorized => info!(page, "Session check passed"),
            GuardOutcome::Exempt => {}
        }
        outcome
    }
}
