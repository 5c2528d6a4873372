//! Authentication module for credentials and openBIS sessions.
//!
//! This module provides:
//! - `Credential`: token or username/password, with token taking precedence
//! - `Session`: an authenticated handle on one openBIS server
//!
//! Sessions are never persisted; only minted PATs are written to disk.

pub mod credentials;
pub mod session;

pub use credentials::{user_id_from_token, Credential, CredentialKind};
pub use session::Session;
