//! Startup environment: stored PAT and client availability.
//!
//! The PAT file location comes from `OPENBIS_PAT_FILE` and defaults to
//! `OPENBIS_PAT.txt` in the working directory. The same path is read here at
//! startup and written by token issuance.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::api::{self, Connector};

/// Environment variable overriding the PAT file location
pub const PAT_FILE_ENV: &str = "OPENBIS_PAT_FILE";

/// PAT file used when `OPENBIS_PAT_FILE` is unset
pub const DEFAULT_PAT_FILE: &str = "OPENBIS_PAT.txt";

/// Resolve the PAT file path from the process environment
pub fn pat_file_path() -> PathBuf {
    pat_file_path_from(std::env::var_os(PAT_FILE_ENV))
}

fn pat_file_path_from(value: Option<OsString>) -> PathBuf {
    match value {
        Some(v) if !v.is_empty() => PathBuf::from(v),
        _ => PathBuf::from(DEFAULT_PAT_FILE),
    }
}

/// Read a previously stored token.
///
/// Never fails: a missing or unreadable file, or one holding only
/// whitespace, yields `None`. Surrounding whitespace is trimmed.
pub fn read_stored_token(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let token = contents.trim();
            if token.is_empty() {
                None
            } else {
                Some(token.to_string())
            }
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No stored token");
            None
        }
    }
}

/// Write `perm_id` verbatim to `path`, replacing any previous content
pub fn write_stored_token(path: &Path, perm_id: &str) -> Result<()> {
    std::fs::write(path, perm_id)
        .with_context(|| format!("Failed to write token file {}", path.display()))
}

/// Values every later stage reads: stored token, PAT file, client backend.
#[derive(Clone)]
pub struct Environment {
    /// Stored token, empty when none was found
    pub stored_token: String,
    pub pat_file: PathBuf,
    pub connector: Option<Arc<dyn Connector>>,
}

impl Environment {
    /// Inspect the process environment and the compiled-in backend
    pub fn detect() -> Self {
        Self::with(pat_file_path(), api::default_connector())
    }

    pub fn with(pat_file: PathBuf, connector: Option<Arc<dyn Connector>>) -> Self {
        let stored_token = read_stored_token(&pat_file).unwrap_or_default();
        debug!(
            pat_file = %pat_file.display(),
            has_stored_token = !stored_token.is_empty(),
            client_available = connector.is_some(),
            "Environment detected"
        );
        Self {
            stored_token,
            pat_file,
            connector,
        }
    }

    pub fn client_available(&self) -> bool {
        self.connector.is_some()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("has_stored_token", &!self.stored_token.is_empty())
            .field("pat_file", &self.pat_file)
            .field("client_available", &self.client_available())
            .finish()
    }
}
