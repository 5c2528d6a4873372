//! Data models for openBIS entities.
//!
//! This module contains the data structures read from and sent to the
//! openBIS v3 API:
//!
//! - `Person`: the authenticated user with their home space
//! - `ServerInformation`: version metadata reported by the server
//! - `PersonalAccessToken`, `TokenRequest`: PAT records and creation input
//! - `Sample`, `Space`: results of the example read-only queries

pub mod entity;
pub mod person;
pub mod sample;
pub mod server;
pub mod token;

pub use entity::{EntityRef, PermIdRef};
pub use person::{Person, SpaceCode};
pub use sample::{Sample, Space};
pub use server::ServerInformation;
pub use token::{PersonalAccessToken, TokenGrant, TokenRequest, DEFAULT_SESSION_LABEL, DEFAULT_VALIDITY_DAYS};
