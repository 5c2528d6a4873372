//! Application state management for dsconnect.
//!
//! This module contains the core `App` struct holding the form values, the
//! active connection and the rendered view of every stage. Stages re-run
//! only when their inputs change: the connection manager on a (Re)Connect
//! press, the issuance gate whenever the connection changes, and token
//! issuance on a Create PAT press.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use dsconnect_core::connection::{self, Connection};
use dsconnect_core::consumer::{self, ConsumerError};
use dsconnect_core::forms::{default_username, DEFAULT_SERVER_URL};
use dsconnect_core::issuance::{self, IssuanceGate};
use dsconnect_core::{Callout, CalloutKind, Config, ConnectionForm, Environment, TokenForm};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for the server URL input.
const MAX_URL_LENGTH: usize = 256;

/// Maximum length for the token input.
/// PATs are around 50 chars; session tokens are shorter.
const MAX_TOKEN_LENGTH: usize = 128;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 64;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for the PAT session label.
const MAX_LABEL_LENGTH: usize = 64;

/// Length of a `YYYY-MM-DD HH:MM` timestamp.
const MAX_DATETIME_LENGTH: usize = 16;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Focusable form elements, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Token,
    Username,
    Password,
    Connect,
    Label,
    ValidFrom,
    ValidTo,
    CreatePat,
}

impl Field {
    const CONNECTION: [Field; 5] = [Field::Url, Field::Token, Field::Username, Field::Password, Field::Connect];
    const ISSUANCE: [Field; 4] = [Field::Label, Field::ValidFrom, Field::ValidTo, Field::CreatePat];

    pub fn is_secret(&self) -> bool {
        matches!(self, Field::Token | Field::Password)
    }

    fn max_len(&self) -> usize {
        match self {
            Field::Url => MAX_URL_LENGTH,
            Field::Token => MAX_TOKEN_LENGTH,
            Field::Username => MAX_USERNAME_LENGTH,
            Field::Password => MAX_PASSWORD_LENGTH,
            Field::Label => MAX_LABEL_LENGTH,
            Field::ValidFrom | Field::ValidTo => MAX_DATETIME_LENGTH,
            Field::Connect | Field::CreatePat => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Url => "openBIS URL",
            Field::Token => "PAT",
            Field::Username => "Username",
            Field::Password => "Password",
            Field::Connect => "(Re)Connect",
            Field::Label => "Session name",
            Field::ValidFrom => "Valid from",
            Field::ValidTo => "to",
            Field::CreatePat => "Create PAT",
        }
    }
}

/// Blocking operation requested by input; run by the main loop after the
/// pending state has been drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Connect,
    CreatePat,
    ListSteps,
    ListSpaces,
}

impl Action {
    pub fn pending_message(&self) -> &'static str {
        match self {
            Action::Connect => "Connecting... this may take a couple of seconds",
            Action::CreatePat => "Creating PAT...",
            Action::ListSteps => "Fetching experimental steps...",
            Action::ListSpaces => "Fetching spaces...",
        }
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub env: Environment,

    // UI State
    pub state: AppState,
    pub focus: Field,
    pub pending: Option<Action>,
    pub status_message: Option<String>,

    // Forms
    pub connection_form: ConnectionForm,
    pub token_form: TokenForm,

    // Stage outputs
    pub connection_view: Callout,
    pub connection: Option<Connection>,
    pub gate: IssuanceGate,
    pub issuance_view: Option<Callout>,
    pub query_view: Option<Callout>,
}

impl App {
    /// Create the application from the detected environment
    pub async fn new(env: Environment, config: Config) -> Result<Self> {
        let url = config
            .server_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let username = default_username(None, config.last_username.clone());
        let connection_form = ConnectionForm::new(url, env.stored_token.clone(), username);

        // No trigger yet: reports missing backend or awaiting input
        let initial = connection::evaluate(&env, &connection_form, false).await?;

        Ok(Self {
            config,
            config_path: Config::config_path().ok(),
            env,
            state: AppState::Normal,
            focus: Field::Url,
            pending: None,
            status_message: None,
            connection_form,
            token_form: TokenForm::default(),
            connection_view: initial.view,
            connection: None,
            gate: IssuanceGate::evaluate(None),
            issuance_view: None,
            query_view: None,
        })
    }

    // =========================================================================
    // Focus
    // =========================================================================

    /// Fields currently on screen; the issuance form only for password sessions
    pub fn visible_fields(&self) -> Vec<Field> {
        let mut fields = Field::CONNECTION.to_vec();
        if self.gate.shows_form() {
            fields.extend_from_slice(&Field::ISSUANCE);
        }
        fields
    }

    pub fn focus_next(&mut self) {
        let fields = self.visible_fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + 1) % fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let fields = self.visible_fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + fields.len() - 1) % fields.len()];
    }

    // =========================================================================
    // Field editing
    // =========================================================================

    pub fn field_value(&self, field: Field) -> &str {
        match field {
            Field::Url => &self.connection_form.url,
            Field::Token => &self.connection_form.token,
            Field::Username => &self.connection_form.username,
            Field::Password => &self.connection_form.password,
            Field::Label => &self.token_form.session_label,
            Field::ValidFrom => &self.token_form.valid_from,
            Field::ValidTo => &self.token_form.valid_to,
            Field::Connect | Field::CreatePat => "",
        }
    }

    fn field_value_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Url => Some(&mut self.connection_form.url),
            Field::Token => Some(&mut self.connection_form.token),
            Field::Username => Some(&mut self.connection_form.username),
            Field::Password => Some(&mut self.connection_form.password),
            Field::Label => Some(&mut self.token_form.session_label),
            Field::ValidFrom => Some(&mut self.token_form.valid_from),
            Field::ValidTo => Some(&mut self.token_form.valid_to),
            Field::Connect | Field::CreatePat => None,
        }
    }

    /// Append a character to the focused field if it is accepted
    pub fn push_char(&mut self, c: char) {
        let field = self.focus;
        if let Some(value) = self.field_value_mut(field) {
            if can_add_char(field, value.chars().count(), c) {
                value.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(value) = self.field_value_mut(self.focus) {
            value.pop();
        }
    }

    /// Queue a blocking action; `pending` is drawn before it runs
    pub fn request(&mut self, action: Action) {
        if action == Action::CreatePat && !self.gate.shows_form() {
            return;
        }
        self.pending = Some(action);
    }

    pub async fn perform(&mut self, action: Action) {
        match action {
            Action::Connect => self.connect().await,
            Action::CreatePat => self.create_pat().await,
            Action::ListSteps => self.list_steps().await,
            Action::ListSpaces => self.list_spaces().await,
        }
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Press of (Re)Connect
    pub async fn connect(&mut self) {
        self.status_message = None;
        match connection::evaluate(&self.env, &self.connection_form, true).await {
            Ok(outcome) => {
                self.connection_view = outcome.view;
                if outcome.connection.is_some() {
                    self.remember_inputs();
                }
                self.set_connection(outcome.connection).await;
            }
            Err(e) => {
                error!(error = %e, "Connection failed");
                self.connection_view = Callout::danger("Connection failed").line(e.to_string());
                self.set_connection(None).await;
            }
        }
        // The password has served its purpose
        self.connection_form.password.clear();
    }

    /// Replace the active connection and re-evaluate everything derived from it
    async fn set_connection(&mut self, connection: Option<Connection>) {
        if let Some(old) = self.connection.take() {
            if let Err(e) = old.session.logout().await {
                warn!(error = %e, "Failed to log out previous session");
            }
        }
        self.connection = connection;

        let gate = IssuanceGate::evaluate(self.connection.as_ref());
        if !gate.shows_form() && Field::ISSUANCE.contains(&self.focus) {
            self.focus = Field::Connect;
        }
        if gate.shows_form() && !self.gate.shows_form() {
            self.token_form = TokenForm::defaults(Utc::now());
        }
        self.gate = gate;
        self.issuance_view = None;
        self.query_view = None;
    }

    fn remember_inputs(&mut self) {
        self.config.server_url = Some(self.connection_form.url.trim().to_string());
        if self.connection_form.token.is_empty() {
            self.config.last_username = Some(self.connection_form.username.trim().to_string());
        }
        let Some(path) = self.config_path.as_ref() else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            warn!(error = %e, "Failed to save config");
        }
    }

    // =========================================================================
    // Token issuance
    // =========================================================================

    /// Press of Create PAT
    pub async fn create_pat(&mut self) {
        let Some(conn) = self.connection.as_ref() else {
            self.issuance_view = Some(self.gate.view());
            return;
        };
        let now = Utc::now();
        let server_max = conn.server_info.pat_max_validity_secs();
        let request = match self.token_form.to_request(now, server_max) {
            Ok(request) => request,
            Err(e) => {
                self.issuance_view = Some(Callout::danger(e.to_string()));
                return;
            }
        };

        let view = match issuance::create_token(conn, &request, &self.env.pat_file, now).await {
            Ok(outcome) => {
                if !matches!(outcome, issuance::IssuanceOutcome::Refused(_)) {
                    info!("PAT stored");
                    self.status_message = Some(format!("PAT stored in {}", self.env.pat_file.display()));
                }
                outcome.view(&self.env.pat_file)
            }
            Err(e) => {
                error!(error = %e, "PAT creation failed");
                Callout::danger("PAT creation failed").line(format!("{:#}", e))
            }
        };
        self.issuance_view = Some(view);
    }

    // =========================================================================
    // Example queries
    // =========================================================================

    pub async fn list_steps(&mut self) {
        let result = consumer::experimental_steps(self.connection.as_ref()).await;
        self.query_view = Some(match result {
            Ok(samples) => {
                let mut view = Callout::new(
                    CalloutKind::Neutral,
                    format!("{} experimental step(s) in home space", samples.len()),
                );
                for sample in &samples {
                    view = view.line(sample.summary());
                }
                view
            }
            Err(e) => query_error(e),
        });
    }

    pub async fn list_spaces(&mut self) {
        let result = consumer::spaces(self.connection.as_ref()).await;
        self.query_view = Some(match result {
            Ok(spaces) => {
                let mut view = Callout::new(CalloutKind::Neutral, format!("{} space(s)", spaces.len()));
                for space in &spaces {
                    view = view.line(match &space.description {
                        Some(desc) if !desc.is_empty() => format!("{} - {}", space.code, desc),
                        _ => space.code.clone(),
                    });
                }
                view
            }
            Err(e) => query_error(e),
        });
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Log out a password session before exiting
    pub async fn shutdown(&mut self) {
        if let Some(conn) = self.connection.take() {
            if let Err(e) = conn.session.logout().await {
                warn!(error = %e, "Logout failed");
            }
        }
    }
}

fn query_error(e: ConsumerError) -> Callout {
    match e {
        ConsumerError::NotConnected => Callout::new(CalloutKind::Warn, e.to_string()),
        other => Callout::danger(other.to_string()),
    }
}

// ============================================================================
// Input validation helpers
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a character should be accepted by a field
pub fn can_add_char(field: Field, current_len: usize, c: char) -> bool {
    current_len < field.max_len() && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
