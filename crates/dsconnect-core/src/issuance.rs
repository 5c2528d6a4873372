//! Token issuance: mint a PAT from a password session and store it.
//!
//! A session opened from a token can never mint another token. The gate
//! hides the form in that case, and `create_token` refuses on its own as
//! well, without contacting the server.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::bootstrap::write_stored_token;
use crate::connection::Connection;
use crate::models::{TokenGrant, TokenRequest};
use crate::view::{Callout, CalloutKind};

pub const CONNECT_FIRST_MESSAGE: &str = "Please connect first";

pub const READY_MESSAGE: &str = "Check the form and press Create PAT to create and store a new PAT. \
After that you may restart dsconnect or enter the PAT in the connection form to reconnect with it.";

pub const TOKEN_SESSION_MESSAGE: &str = "Looks like you are already connected using a PAT. \
For security reasons this connection can not be used to create a new PAT. \
Delete the PAT from the connection form, enter a password and reconnect. \
After that you can try creating a new PAT again.";

pub const REFUSAL_MESSAGE: &str = "ERROR: You must login with a password instead of a PAT to create a PAT!";

/// Which of the three issuance states applies to the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceGate {
    ConnectFirst,
    Ready,
    Refused,
}

impl IssuanceGate {
    pub fn evaluate(connection: Option<&Connection>) -> Self {
        match connection {
            None => IssuanceGate::ConnectFirst,
            Some(conn) if conn.is_token_based() => IssuanceGate::Refused,
            Some(_) => IssuanceGate::Ready,
        }
    }

    /// Only a password session gets the issuance form
    pub fn shows_form(&self) -> bool {
        matches!(self, IssuanceGate::Ready)
    }

    pub fn view(&self) -> Callout {
        match self {
            IssuanceGate::ConnectFirst => Callout::neutral(CONNECT_FIRST_MESSAGE),
            IssuanceGate::Ready => Callout::neutral(READY_MESSAGE),
            IssuanceGate::Refused => Callout::new(CalloutKind::Warn, TOKEN_SESSION_MESSAGE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuanceOutcome {
    /// permId of the token minted and stored in the PAT file
    Minted(String),
    /// permId of an existing token covering the window, stored in the PAT file
    Reused(String),
    Refused(&'static str),
}

impl IssuanceOutcome {
    pub fn view(&self, pat_file: &Path) -> Callout {
        match self {
            IssuanceOutcome::Minted(perm_id) => Callout::new(CalloutKind::Success, perm_id.clone())
                .line(format!("Stored in {}", pat_file.display())),
            IssuanceOutcome::Reused(perm_id) => Callout::new(CalloutKind::Success, perm_id.clone())
                .line("Reused an existing PAT with this session name that is valid for the requested period")
                .line(format!("Stored in {}", pat_file.display())),
            IssuanceOutcome::Refused(message) => Callout::danger(*message),
        }
    }
}

/// Mint (or reuse) a PAT for `request` and write its permId to `pat_file`.
///
/// Server and file errors are returned as-is.
pub async fn create_token(
    connection: &Connection,
    request: &TokenRequest,
    pat_file: &Path,
    now: DateTime<Utc>,
) -> Result<IssuanceOutcome> {
    if connection.is_token_based() {
        warn!("Refusing to create a PAT from a token session");
        return Ok(IssuanceOutcome::Refused(REFUSAL_MESSAGE));
    }

    let grant = connection
        .session
        .get_or_create_personal_access_token(request, now)
        .await
        .context("Failed to create personal access token")?;

    write_stored_token(pat_file, grant.perm_id())?;
    info!(label = %request.session_label, path = %pat_file.display(), reused = matches!(grant, TokenGrant::Reused(_)), "Personal access token stored");
    Ok(match grant {
        TokenGrant::Created(perm_id) => IssuanceOutcome::Minted(perm_id),
        TokenGrant::Reused(perm_id) => IssuanceOutcome::Reused(perm_id),
    })
}
