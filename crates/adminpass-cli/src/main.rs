//! adminpass - log in to the admin panel and call its API from a terminal.
//!
//! The token obtained by `login` is kept in the configured storage backend
//! and attached to every later request until the server rejects it.

mod shell;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use adminpass_core::api::ApiError;
use adminpass_core::auth::{messages, GuardOutcome, LoginOutcome};
use adminpass_core::config::{Config, BASE_URL_ENV};
use adminpass_core::presenter::{Navigator, NoticeLevel, Presenter};
use adminpass_core::utils::{format_date, format_file_size, token_preview};
use adminpass_core::AdminContext;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use shell::{TerminalButton, TerminalShell};

const USERNAME_ENV: &str = "ADMINPASS_USERNAME";
const PASSWORD_ENV: &str = "ADMINPASS_PASSWORD";

const SUBMIT_LABEL: &str = "Log in";

#[derive(Parser)]
#[command(name = "adminpass", version, about = "Admin panel session tool")]
struct Cli {
    /// Admin server origin, overrides the config file
    #[arg(long, global = true, env = BASE_URL_ENV)]
    base_url: Option<String>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session token
    Login {
        #[arg(short, long, env = USERNAME_ENV)]
        username: Option<String>,
        /// Remember the username for next time
        #[arg(long)]
        remember: bool,
    },
    /// Forget the session token
    Logout,
    /// Show whether a session is present
    Status,
    /// Open a page, going through the session guard
    Open { path: String },
    /// GET an API path and print the JSON response
    Get { path: String },
    /// POST a JSON body to an API path
    Post { path: String, body: String },
    /// PUT a JSON body to an API path
    Put { path: String, body: String },
    /// DELETE an API path
    Delete { path: String },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;

    let mut config = Config::load()?;
    if let Some(base_url) = cli.base_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        config.base_url = base_url.to_string();
    }
    info!(base_url = %config.base_url, "adminpass starting");

    let start_page = match &cli.command {
        Command::Login { .. } | Command::Status => config.login_page.clone(),
        Command::Open { path } => path.clone(),
        _ => config.landing_page.clone(),
    };
    let shell = Arc::new(TerminalShell::new(&start_page));
    let ctx = AdminContext::new(config, shell.clone(), shell.clone())?;

    let ok = match cli.command {
        Command::Login { username, remember } => login(&ctx, username, remember).await?,
        Command::Logout => {
            ctx.login_flow().logout();
            true
        }
        Command::Status => status(&ctx),
        Command::Open { path } => open(&ctx, &path).await,
        Command::Get { path } => print_json(&ctx, ctx.client.get_json::<Value>(&path).await),
        Command::Post { path, body } => {
            let body = parse_body(&body)?;
            print_json(&ctx, ctx.client.post_json::<Value, _>(&path, &body).await)
        }
        Command::Put { path, body } => {
            let body = parse_body(&body)?;
            print_json(&ctx, ctx.client.put_json::<Value, _>(&path, &body).await)
        }
        Command::Delete { path } => match ctx.client.delete(&path).await {
            Ok(()) => true,
            Err(e) => report_failure(&ctx, &e),
        },
    };

    shell.settle().await;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn login(ctx: &AdminContext, username: Option<String>, remember: bool) -> Result<bool> {
    let remembered = ctx
        .config
        .last_username
        .clone()
        .filter(|_| ctx.config.remember_me);
    let username = match username.or(remembered) {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let mut button = TerminalButton::new(SUBMIT_LABEL);
    let outcome = ctx.login_flow().login(&username, &password, &mut button).await;
    if !matches!(outcome, LoginOutcome::Success(_)) {
        return Ok(false);
    }

    // Save to the file as written, without env or flag overrides
    let path = Config::config_path()?;
    let mut stored = Config::load_from(&path)?;
    stored.last_username = remember.then(|| username.trim().to_string());
    stored.remember_me = remember;
    stored.save_to(&path)?;
    Ok(true)
}

fn status(ctx: &AdminContext) -> bool {
    println!("Server:  {}", ctx.config.base_url);
    println!("Storage: {:?}", ctx.config.storage);

    match ctx.tokens.get() {
        Some(token) => {
            let cookie = ctx.tokens.mirrored_cookie();
            println!("Session: logged in ({})", token_preview(&token));
            match &cookie {
                Some(c) => println!(
                    "Cookie:  {} path={} SameSite={}, expires {}",
                    c.name,
                    c.path,
                    c.same_site.as_str(),
                    format_date(Some(&c.expires))
                ),
                None => println!("Cookie:  missing"),
            }
            true
        }
        None => {
            println!("Session: not logged in");
            false
        }
    }
}

async fn open(ctx: &AdminContext, path: &str) -> bool {
    let presenter: Arc<dyn Presenter> = ctx.presenter.clone();
    let navigator: Arc<dyn Navigator> = ctx.navigator.clone();
    match ctx.session_guard().enforce(path, &presenter, &navigator).await {
        GuardOutcome::Exempt => {
            println!("{}", path);
            true
        }
        GuardOutcome::Authorized => {
            println!("{} (session present)", path);
            true
        }
        GuardOutcome::Unauthenticated(_) => false,
    }
}

fn parse_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).context("Request body is not valid JSON")
}

fn print_json(ctx: &AdminContext, result: Result<Value, ApiError>) -> bool {
    match result {
        Ok(value) => {
            let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            println!("{}", text);
            eprintln!("({})", format_file_size(text.len() as u64));
            true
        }
        Err(e) => report_failure(ctx, &e),
    }
}

/// Show a request failure; 401s are already announced by the interceptor.
fn report_failure(ctx: &AdminContext, error: &ApiError) -> bool {
    if !matches!(error, ApiError::Unauthorized) {
        let message = match error.status_code() {
            Some(0) => messages::UNREACHABLE.to_string(),
            _ => format!("Request failed: {}", error),
        };
        ctx.presenter.notify(NoticeLevel::Error, &message);
    }
    false
}

fn prompt(label: &str) -> Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", label)?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_request_commands() {
        let cli = Cli::try_parse_from(["adminpass", "post", "/admin/api/users", r#"{"name":"a"}"#])
            .unwrap();
        match cli.command {
            Command::Post { path, body } => {
                assert_eq!(path, "/admin/api/users");
                assert_eq!(parse_body(&body).unwrap()["name"], "a");
            }
            _ => panic!("expected post"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "adminpass",
            "status",
            "--base-url",
            "http://admin.test",
            "--log-file",
            "/tmp/adminpass.log",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://admin.test"));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/adminpass.log")));
    }

    #[test]
    fn test_parse_body_rejects_invalid_json() {
        assert!(parse_body("{not json").is_err());
    }
}
