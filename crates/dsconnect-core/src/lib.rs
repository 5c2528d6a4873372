//! Core library for dsconnect.
//!
//! Connects to an openBIS server with a personal access token (PAT) or
//! username/password, and mints new PATs from password sessions. The
//! stages of an interactive session are plain functions from their inputs
//! to a rendered [`view::Callout`] plus the values later stages consume:
//!
//! - [`bootstrap`]: stored token and client availability
//! - [`forms`]: raw form values and their validation
//! - [`connection`]: establish or renew a session
//! - [`issuance`]: gate and mint a PAT, persist it to the PAT file
//! - [`consumer`]: example read-only queries

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod connection;
pub mod consumer;
pub mod forms;
pub mod issuance;
pub mod models;
pub mod view;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::{ApiError, Connector, OpenbisApi};
pub use auth::{Credential, CredentialKind, Session};
pub use bootstrap::Environment;
pub use config::Config;
pub use connection::{Connection, ConnectionOutcome};
pub use forms::{ConnectionForm, FormError, TokenForm};
pub use issuance::{IssuanceGate, IssuanceOutcome};
pub use view::{Callout, CalloutKind};
