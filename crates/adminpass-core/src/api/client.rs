//! HTTP client for the admin API.
//!
//! `AdminClient` wraps a `reqwest::Client` with an ordered middleware list
//! fixed at construction time. Every request runs each middleware's
//! `before_send` in order before it leaves the process, and each
//! `after_response` in reverse order once the response head (or a transport
//! failure) is back.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Request, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::storage::CookieJar;

use super::cookies::CookieMirror;
use super::ApiError;

/// HTTP request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Method and target of a request that has been sent.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub url: Url,
}

/// Hook run around every request made through an `AdminClient`.
pub trait Middleware: Send + Sync {
    fn before_send(&self, _request: &mut Request) {}

    /// `status` is `None` when the request failed before any response.
    fn after_response(&self, _request: &RequestInfo, _status: Option<StatusCode>) {}
}

pub struct AdminClientBuilder {
    base_url: String,
    timeout: Duration,
    cookie_mirror: Option<(Arc<dyn CookieJar>, String)>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl AdminClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send the named cookie from `jar` on requests to the base origin.
    pub fn cookie_mirror(mut self, jar: Arc<dyn CookieJar>, name: &str) -> Self {
        self.cookie_mirror = Some((jar, name.to_string()));
        self
    }

    /// Append a middleware; earlier entries see requests first.
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn build(self) -> Result<AdminClient, ApiError> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("bad base URL {}: {}", self.base_url, e)))?;

        let mut builder = Client::builder().timeout(self.timeout);
        if let Some((jar, name)) = self.cookie_mirror {
            builder = builder.cookie_provider(Arc::new(CookieMirror::new(jar, &base_url, &name)));
        }

        Ok(AdminClient {
            client: builder.build()?,
            base_url,
            middleware: Arc::new(self.middleware),
        })
    }
}

/// API client for the admin server.
/// Clone is cheap - the connection pool and middleware list are shared.
#[derive(Clone)]
pub struct AdminClient {
    client: Client,
    base_url: Url,
    middleware: Arc<Vec<Arc<dyn Middleware>>>,
}

impl AdminClient {
    pub fn builder(base_url: &str) -> AdminClientBuilder {
        AdminClientBuilder {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cookie_mirror: None,
            middleware: Vec::new(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("bad path {}: {}", path, e)))
    }

    /// Start a request the caller can add headers or a body to before
    /// passing it to `send_request`.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self.client.request(method, self.url(path)?))
    }

    /// Send a request built with `request` through the middleware.
    pub async fn send_request(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        self.execute(builder).await
    }

    /// Send a request without a body.
    pub async fn send(&self, method: Method, path: &str) -> Result<Response, ApiError> {
        let url = self.url(path)?;
        self.execute(self.client.request(method, url)).await
    }

    /// Send a request with a JSON body.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        let url = self.url(path)?;
        self.execute(self.client.request(method, url).json(body)).await
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let mut request = builder.build()?;
        for middleware in self.middleware.iter() {
            middleware.before_send(&mut request);
        }

        let info = RequestInfo {
            method: request.method().clone(),
            url: request.url().clone(),
        };
        debug!(method = %info.method, url = %info.url, "Sending request");

        let result = self.client.execute(request).await;
        let status = result.as_ref().ok().map(|r| r.status());
        for middleware in self.middleware.iter().rev() {
            middleware.after_response(&info, status);
        }

        Ok(result?)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = Self::check_response(response).await?;
        let url = response.url().clone();
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Self::parse(self.send(Method::GET, path).await?).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        Self::parse(self.send_json(Method::POST, path, body).await?).await
    }

    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        Self::parse(self.send_json(Method::PUT, path, body).await?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        Self::check_response(self.send(Method::DELETE, path).await?).await?;
        Ok(())
    }
}
