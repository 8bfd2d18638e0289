//! neologin - log in to a Keystone v3 identity service from the command line.
//!
//! Credentials are kept in `~/.neo.env` and the session token in the system
//! temp directory, so later commands reuse or silently regenerate the session.

mod prompt;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use neologin_core::{
    Config, KeystoneClient, LoginOutcome, LoginRequest, SessionManager,
};

use prompt::TerminalPrompt;

/// Log file name inside the cache directory
const LOG_FILE: &str = "neologin.log";

/// A corrupt cache with matching credentials makes `login` report "already
/// logged in", so `logout` is the way out.
const SESSION_LOAD_FAILED: &str = "Loading session failed. Please login first \
     (run 'neologin logout' if the cached session is corrupt)";

#[derive(Debug, Parser)]
#[command(name = "neologin", version, about = "Log in to a Keystone v3 identity service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in, reusing or regenerating a saved session when possible
    Login {
        /// Identity service endpoint
        #[arg(long)]
        auth_url: Option<String>,

        /// User domain name
        #[arg(long)]
        domain: Option<String>,

        /// Account to log in as; a different account than the saved one forces a new login
        #[arg(long)]
        username: Option<String>,

        /// Show the current account instead of logging in
        #[arg(short = 'D', long)]
        describe: bool,
    },
    /// Remove the saved session and credentials
    Logout,
    /// Show the current account
    Whoami,
    /// Print the active session token, regenerating it if needed
    Token,
    /// Print the saved credentials as shell exports
    Env,
}

/// Initialize the tracing subscriber for logging.
/// Stderr gets `RUST_LOG` (default `warn`); the log file gets everything at debug.
fn init_tracing() -> Option<WorkerGuard> {
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(stderr_filter);

    let (file_layer, guard) = match Config::log_dir() {
        Ok(dir) if std::fs::create_dir_all(&dir).is_ok() => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("neologin_core=debug,neologin=debug"));
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli.command)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<bool> {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    let paths = config.paths()?;
    let client = KeystoneClient::new().context("Failed to create HTTP client")?;
    let mut manager = SessionManager::new(&paths, client, TerminalPrompt);

    match command {
        Command::Login {
            auth_url,
            domain,
            username,
            describe,
        } => {
            if describe {
                return Ok(describe_account(&manager));
            }

            let mut request = LoginRequest::new(
                auth_url.unwrap_or_else(|| config.auth_url().to_string()),
                domain.unwrap_or_else(|| config.user_domain_name().to_string()),
            );
            request.username = username;

            match manager.login(&request).await {
                Ok(LoginOutcome::AlreadyLoggedIn) => {
                    println!("You are already logged in.");
                    println!("  use 'neologin login -D' to see your current account");
                    Ok(true)
                }
                Ok(_) => {
                    println!("Login Success");
                    Ok(true)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(false)
                }
            }
        }
        Command::Logout => {
            if manager.logout() {
                println!("Logout Success");
            }
            Ok(true)
        }
        Command::Whoami => Ok(describe_account(&manager)),
        Command::Token => {
            let session = manager
                .load_active_session()
                .await
                .context(SESSION_LOAD_FAILED)?;
            info!(user_id = %session.user_id(), "Active session loaded");
            println!("{}", session.token());
            Ok(true)
        }
        Command::Env => {
            let record = manager
                .credentials()
                .read()
                .context("No saved credentials. Please login first")?;
            for (key, value) in record.env_pairs() {
                println!("export {}={}", key, shell_quote(value));
            }
            Ok(true)
        }
    }
}

fn describe_account<P, T>(manager: &SessionManager<P, T>) -> bool
where
    P: neologin_core::AuthProvider,
    T: neologin_core::Prompt,
{
    match manager.current_account() {
        Some(account) => {
            println!("Username:    {}", account.username);
            println!("Auth URL:    {}", account.auth_url);
            println!("Domain:      {}", account.user_domain_name);
            println!("Project ID:  {}", account.project_id);
            println!(
                "Session:     {}",
                if account.has_session { "cached" } else { "not cached" }
            );
            true
        }
        None => {
            eprintln!("Not logged in");
            false
        }
    }
}

/// Single-quote a value for POSIX shells.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("$HOME x"), "'$HOME x'");
    }

    #[test]
    fn test_cli_parses_login_flags() {
        let cli = Cli::try_parse_from([
            "neologin",
            "login",
            "--auth-url",
            "https://id.example/v3",
            "--domain",
            "example.id",
            "-D",
        ])
        .unwrap();

        match cli.command {
            Command::Login {
                auth_url,
                domain,
                username,
                describe,
            } => {
                assert_eq!(auth_url.as_deref(), Some("https://id.example/v3"));
                assert_eq!(domain.as_deref(), Some("example.id"));
                assert_eq!(username, None);
                assert!(describe);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_session_load_failure_points_to_logout() {
        assert!(SESSION_LOAD_FAILED.starts_with("Loading session failed. Please login first"));
        assert!(SESSION_LOAD_FAILED.contains("neologin logout"));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
