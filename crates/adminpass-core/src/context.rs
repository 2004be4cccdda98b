//! Wiring of the admin session components.
//!
//! `AdminContext` is built once at startup from a `Config` and the front
//! end's presentation layer. It owns the token store and the HTTP client
//! with its middleware list, and hands out session guards and login flows
//! that share them.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::api::{AdminClient, AuthInterceptor, LoadingOverlay};
use crate::auth::{LoginFlow, SessionGuard, TokenStore, TOKEN_KEY};
use crate::config::Config;
use crate::presenter::{Navigator, Presenter};
use crate::storage::{self, CookieJar, KeyValueStore};

pub struct AdminContext {
    pub config: Config,
    pub tokens: TokenStore,
    pub client: AdminClient,
    pub presenter: Arc<dyn Presenter>,
    pub navigator: Arc<dyn Navigator>,
}

impl AdminContext {
    /// Open the configured storage backends and build the client.
    pub fn new(
        config: Config,
        presenter: Arc<dyn Presenter>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let (primary, mirror) = storage::open(&config).context("Failed to open token storage")?;
        Self::with_storage(config, primary, mirror, presenter, navigator)
    }

    pub fn with_storage(
        config: Config,
        primary: Arc<dyn KeyValueStore>,
        mirror: Arc<dyn CookieJar>,
        presenter: Arc<dyn Presenter>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let tokens = TokenStore::new(primary, mirror);

        let interceptor = AuthInterceptor::new(
            tokens.clone(),
            &config.login_endpoint,
            &config.login_page,
            Arc::clone(&presenter),
            Arc::clone(&navigator),
        );
        let client = AdminClient::builder(&config.base_url)
            .timeout(config.request_timeout())
            .cookie_mirror(tokens.cookie_jar(), TOKEN_KEY)
            .middleware(Arc::new(LoadingOverlay::new(Arc::clone(&presenter))))
            .middleware(Arc::new(interceptor))
            .build()
            .context("Failed to build admin API client")?;
        debug!(base_url = %config.base_url, storage = ?config.storage, "Admin context ready");

        Ok(Self {
            config,
            tokens,
            client,
            presenter,
            navigator,
        })
    }

    pub fn session_guard(&self) -> SessionGuard {
        SessionGuard::new(
            self.tokens.clone(),
            &self.config.protected_prefix,
            &self.config.login_page,
        )
    }

    pub fn login_flow(&self) -> LoginFlow {
        LoginFlow::new(
            self.client.clone(),
            self.tokens.clone(),
            Arc::clone(&self.presenter),
            Arc::clone(&self.navigator),
        )
        .with_paths(
            &self.config.login_endpoint,
            &self.config.login_page,
            &self.config.landing_page,
        )
    }
}
