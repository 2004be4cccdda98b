//! Login and logout.
//!
//! `LoginFlow::login` validates the form, posts the credentials to the login
//! endpoint, and on success stores the returned token and points the user at
//! the landing page. Whatever happens, the submit control is handed back
//! enabled and with its original label.

use std::sync::Arc;

use reqwest::{Method, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::{AdminClient, ApiError};
use crate::presenter::{Navigation, Navigator, NoticeLevel, Presenter};

use super::{messages, TokenStore, LOGIN_REDIRECT_DELAY};

/// Application-level success code in the login response envelope
const SUCCESS_CODE: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Idle,
    Submitting,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// A required field was empty; nothing was sent.
    Invalid(Field),
    /// Token stored; navigate to the landing page.
    Success(Navigation),
    /// The server accepted the login but sent no token.
    MissingToken,
    /// Rejected or unreachable, with the message shown to the user.
    Failed(String),
}

/// The button (or equivalent) that submits the login form.
pub trait SubmitControl: Send {
    fn label(&self) -> String;
    fn set_label(&mut self, label: &str);
    fn set_enabled(&mut self, enabled: bool);
}

/// Disables a control for the duration of a submission and restores it on drop.
struct PendingSubmit<'a> {
    control: &'a mut dyn SubmitControl,
    original_label: String,
}

impl<'a> PendingSubmit<'a> {
    fn begin(control: &'a mut dyn SubmitControl) -> Self {
        let original_label = control.label();
        control.set_enabled(false);
        control.set_label(messages::LOGIN_PENDING);
        Self {
            control,
            original_label,
        }
    }
}

impl Drop for PendingSubmit<'_> {
    fn drop(&mut self) {
        self.control.set_enabled(true);
        self.control.set_label(&self.original_label);
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// `{code, msg, data: {token}}` envelope returned by the server.
#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    code: Option<i64>,
    msg: Option<String>,
    data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: Option<String>,
}

pub struct LoginFlow {
    client: AdminClient,
    tokens: TokenStore,
    presenter: Arc<dyn Presenter>,
    navigator: Arc<dyn Navigator>,
    login_endpoint: String,
    login_page: String,
    landing_page: String,
    state: LoginState,
}

impl LoginFlow {
    pub fn new(
        client: AdminClient,
        tokens: TokenStore,
        presenter: Arc<dyn Presenter>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            client,
            tokens,
            presenter,
            navigator,
            login_endpoint: "/login".to_string(),
            login_page: "/admin/login".to_string(),
            landing_page: "/admin/dashboard".to_string(),
            state: LoginState::Idle,
        }
    }

    pub fn with_paths(mut self, login_endpoint: &str, login_page: &str, landing_page: &str) -> Self {
        self.login_endpoint = login_endpoint.to_string();
        self.login_page = login_page.to_string();
        self.landing_page = landing_page.to_string();
        self
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        control: &mut dyn SubmitControl,
    ) -> LoginOutcome {
        let username = username.trim();
        let password = password.trim();

        if username.is_empty() {
            self.presenter
                .notify(NoticeLevel::Warning, messages::ENTER_USERNAME);
            return LoginOutcome::Invalid(Field::Username);
        }
        if password.is_empty() {
            self.presenter
                .notify(NoticeLevel::Warning, messages::ENTER_PASSWORD);
            return LoginOutcome::Invalid(Field::Password);
        }

        self.state = LoginState::Submitting;
        let outcome = {
            let _pending = PendingSubmit::begin(control);
            let result = self
                .client
                .send_json(
                    Method::POST,
                    &self.login_endpoint,
                    &LoginRequest { username, password },
                )
                .await;
            self.handle_result(result).await
        };

        self.state = match outcome {
            LoginOutcome::Success(_) => LoginState::Success,
            _ => LoginState::Idle,
        };
        outcome
    }

    async fn handle_result(&mut self, result: Result<Response, ApiError>) -> LoginOutcome {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Login request failed");
                return self.fail(Self::transport_message(&e));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to read login response");
                return self.fail(messages::LOGIN_FAILED.to_string());
            }
        };

        if !status.is_success() {
            warn!(status = status.as_u16(), "Login rejected");
            let server_msg = serde_json::from_str::<LoginEnvelope>(&body)
                .ok()
                .and_then(|e| e.msg)
                .filter(|m| !m.is_empty());
            let message = match (server_msg, status.as_u16()) {
                (Some(msg), _) => msg,
                (None, 401) => messages::BAD_CREDENTIALS.to_string(),
                (None, _) => messages::LOGIN_FAILED.to_string(),
            };
            return self.fail(message);
        }

        let envelope: LoginEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, "Unparseable login response");
                return self.fail(messages::LOGIN_FAILED.to_string());
            }
        };

        match envelope {
            LoginEnvelope {
                code: Some(SUCCESS_CODE),
                data: Some(data),
                ..
            } => match data.token.filter(|t| !t.is_empty()) {
                Some(token) => {
                    self.tokens.set(&token);
                    info!("Login successful");
                    self.presenter
                        .notify(NoticeLevel::Success, messages::LOGIN_SUCCESS);
                    let navigation = Navigation::after(&self.landing_page, LOGIN_REDIRECT_DELAY);
                    self.navigator.navigate(navigation.clone());
                    LoginOutcome::Success(navigation)
                }
                None => {
                    warn!("Login response carried no token");
                    self.presenter.notify(NoticeLevel::Warning, messages::NO_TOKEN);
                    LoginOutcome::MissingToken
                }
            },
            LoginEnvelope { msg, .. } => {
                let message = msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| messages::LOGIN_FAILED.to_string());
                self.fail(message)
            }
        }
    }

    /// Message for a request that got no usable HTTP answer.
    fn transport_message(error: &ApiError) -> String {
        match error.status_code() {
            Some(0) => messages::UNREACHABLE.to_string(),
            Some(401) => messages::BAD_CREDENTIALS.to_string(),
            _ => messages::LOGIN_FAILED.to_string(),
        }
    }

    fn fail(&mut self, message: String) -> LoginOutcome {
        self.state = LoginState::Failed;
        self.presenter.notify(NoticeLevel::Error, &message);
        LoginOutcome::Failed(message)
    }

    /// Forget the credential and head back to the login page.
    pub fn logout(&mut self) -> Navigation {
        self.tokens.clear();
        self.state = LoginState::Idle;
        info!("Logged out");
        self.presenter.notify(NoticeLevel::Info, messages::LOGGED_OUT);
        let navigation = Navigation::after(&self.login_page, LOGIN_REDIRECT_DELAY);
        self.navigator.navigate(navigation.clone());
        navigation
    }
}
