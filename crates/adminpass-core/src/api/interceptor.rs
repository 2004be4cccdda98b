use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reqwest::{Request, StatusCode};
use tracing::{debug, warn};

use crate::auth::{messages, TokenStore, EXPIRED_REDIRECT_DELAY};
use crate::presenter::{Navigation, Navigator, NoticeLevel, Presenter};
use crate::storage::lock;

use super::authorizer::RequestAuthorizer;
use super::client::{Middleware, RequestInfo};

/// Collapses a burst of 401s into a single redirect.
///
/// The first trip arms the gate for the redirect delay; trips while it is
/// armed are ignored. Once the delay has passed the gate re-arms itself.
pub struct ExpiryGate {
    login_page: String,
    delay: Duration,
    pending_until: Mutex<Option<Instant>>,
}

impl ExpiryGate {
    pub fn new(login_page: &str, delay: Duration) -> Self {
        Self {
            login_page: login_page.to_string(),
            delay,
            pending_until: Mutex::new(None),
        }
    }

    /// Returns `None` if a redirect is already pending. Otherwise the
    /// navigation to perform, which is itself `None` on the login page.
    ///
    /// `current_path` is the page at the time of the 401, not when the
    /// delayed navigation later runs.
    pub fn trip(&self, current_path: &str) -> Option<Option<Navigation>> {
        let now = Instant::now();
        let mut pending = lock(&self.pending_until);
        if matches!(*pending, Some(until) if now < until) {
            return None;
        }
        *pending = Some(now + self.delay);

        if current_path == self.login_page {
            Some(None)
        } else {
            Some(Some(Navigation::after(&self.login_page, self.delay)))
        }
    }
}

/// Authorizes outgoing requests and ends the session on 401.
///
/// Requests to the login endpoint are sent without a token. Every 401,
/// including one from the login endpoint, ends the stored session.
pub struct AuthInterceptor {
    authorizer: RequestAuthorizer,
    tokens: TokenStore,
    gate: ExpiryGate,
    login_endpoint: String,
    presenter: Arc<dyn Presenter>,
    navigator: Arc<dyn Navigator>,
}

impl AuthInterceptor {
    pub fn new(
        tokens: TokenStore,
        login_endpoint: &str,
        login_page: &str,
        presenter: Arc<dyn Presenter>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            authorizer: RequestAuthorizer::new(tokens.clone()),
            tokens,
            gate: ExpiryGate::new(login_page, EXPIRED_REDIRECT_DELAY),
            login_endpoint: login_endpoint.to_string(),
            presenter,
            navigator,
        }
    }

    fn is_login_request(&self, path: &str) -> bool {
        path == self.login_endpoint
    }
}

impl Middleware for AuthInterceptor {
    fn before_send(&self, request: &mut Request) {
        if self.is_login_request(request.url().path()) {
            return;
        }
        let outcome = self.authorizer.authorize(request.headers_mut());
        debug!(?outcome, url = %request.url(), "Request authorization");
    }

    fn after_response(&self, request: &RequestInfo, status: Option<StatusCode>) {
        if status != Some(StatusCode::UNAUTHORIZED) {
            return;
        }

        warn!(url = %request.url, "401 Unauthorized, clearing token");
        self.tokens.clear();

        let Some(navigation) = self.gate.trip(&self.navigator.current_path()) else {
            debug!("Redirect to login already pending");
            return;
        };
        self.presenter
            .notify(NoticeLevel::Warning, messages::SESSION_EXPIRED);
        if let Some(navigation) = navigation {
            self.navigator.navigate(navigation);
        }
    }
}

/// Shows the loading indicator while a request is in flight.
pub struct LoadingOverlay {
    presenter: Arc<dyn Presenter>,
}

impl LoadingOverlay {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self { presenter }
    }
}

impl Middleware for LoadingOverlay {
    fn before_send(&self, _request: &mut Request) {
        self.presenter.show_loading();
    }

    fn after_response(&self, _request: &RequestInfo, _status: Option<StatusCode>) {
        self.presenter.hide_loading();
    }
}
