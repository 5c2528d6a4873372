//! Headless mode: connect (and optionally mint a PAT) without the TUI.
//!
//! Reads the server URL from `OPENBIS_URL` (else the saved config) and the
//! username from `OPENBIS_USERNAME` (else the OS login name, else the saved
//! config). Uses the stored PAT if there is one and otherwise prompts for
//! the password on the terminal.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use dsconnect_core::connection;
use dsconnect_core::forms::{default_username, DEFAULT_SERVER_URL};
use dsconnect_core::issuance::{self, IssuanceGate};
use dsconnect_core::models::DEFAULT_SESSION_LABEL;
use dsconnect_core::{Config, ConnectionForm, Environment, TokenForm};

pub const URL_ENV: &str = "OPENBIS_URL";
pub const USERNAME_ENV: &str = "OPENBIS_USERNAME";

/// Command line options for headless mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessArgs {
    /// Session label of the PAT to create, if requested
    pub create_pat: Option<String>,
}

impl HeadlessArgs {
    /// Parse the arguments after the program name. Returns None when
    /// `--headless` is absent.
    pub fn parse(args: &[String]) -> Result<Option<Self>> {
        if !args.iter().any(|a| a == "--headless") {
            return Ok(None);
        }
        let mut create_pat = None;
        let mut iter = args.iter().peekable();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--headless" => {}
                "--create-pat" => {
                    let label = match iter.peek() {
                        Some(next) if !next.starts_with("--") => iter.next().cloned(),
                        _ => None,
                    };
                    create_pat = Some(label.unwrap_or_else(|| DEFAULT_SESSION_LABEL.to_string()));
                }
                other => bail!("Unknown argument: {}", other),
            }
        }
        Ok(Some(Self { create_pat }))
    }
}

/// Build the connection form from the environment and saved config
fn headless_form(env: &Environment, config: &Config) -> ConnectionForm {
    let url = std::env::var(URL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| config.server_url.clone())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    let username = default_username(std::env::var(USERNAME_ENV).ok(), config.last_username.clone());
    ConnectionForm::new(url, env.stored_token.clone(), username)
}

pub async fn run(args: HeadlessArgs) -> Result<()> {
    let env = Environment::detect();
    let config = Config::load().unwrap_or_default();
    let mut form = headless_form(&env, &config);

    if form.token.is_empty() {
        if form.username.trim().is_empty() {
            bail!("No username: set {} or log in once with the TUI", USERNAME_ENV);
        }
        form.password = rpassword::prompt_password(format!("Password for {}: ", form.username))
            .context("Failed to read password")?;
    }

    let outcome = connection::evaluate(&env, &form, true).await?;
    println!("{}", outcome.view.to_text());
    let Some(conn) = outcome.connection else {
        bail!("Not connected");
    };

    let result = match args.create_pat {
        Some(label) => mint(&env, &conn, &label).await,
        None => Ok(()),
    };

    if let Err(e) = conn.session.logout().await {
        warn!(error = %e, "Logout failed");
    }
    result
}

async fn mint(env: &Environment, conn: &connection::Connection, label: &str) -> Result<()> {
    let gate = IssuanceGate::evaluate(Some(conn));
    if !gate.shows_form() {
        println!("{}", gate.view().to_text());
    }
    let now = Utc::now();
    let mut form = TokenForm::defaults(now);
    form.session_label = label.to_string();
    let request = form.to_request(now, conn.server_info.pat_max_validity_secs())?;
    let outcome = issuance::create_token(conn, &request, &env.pat_file, now).await?;
    println!("{}", outcome.view(&env.pat_file).to_text());
    info!(label, "Headless PAT request finished");
    match outcome {
        issuance::IssuanceOutcome::Minted(_) | issuance::IssuanceOutcome::Reused(_) => Ok(()),
        issuance::IssuanceOutcome::Refused(message) => bail!(message),
    }
}
