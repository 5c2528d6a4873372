//! Example read-only queries against an established session.

use thiserror::Error;
use tracing::debug;

use crate::api::ApiError;
use crate::connection::Connection;
use crate::models::{Sample, Space};

/// Object type listed by the example query
pub const EXPERIMENTAL_STEP_TYPE: &str = "EXPERIMENTAL_STEP";

#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("Please connect before running queries like this!")]
    NotConnected,

    #[error("User {0} has no home space")]
    NoHomeSpace(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn require(connection: Option<&Connection>) -> Result<&Connection, ConsumerError> {
    connection.ok_or(ConsumerError::NotConnected)
}

/// Experimental steps in the connected user's home space
pub async fn experimental_steps(connection: Option<&Connection>) -> Result<Vec<Sample>, ConsumerError> {
    let conn = require(connection)?;
    let space = conn
        .home_space
        .as_deref()
        .ok_or_else(|| ConsumerError::NoHomeSpace(conn.user_id().to_string()))?;
    let samples = conn.session.samples(space, EXPERIMENTAL_STEP_TYPE).await?;
    debug!(space, count = samples.len(), "Fetched experimental steps");
    Ok(samples)
}

/// All spaces visible to the connected user
pub async fn spaces(connection: Option<&Connection>) -> Result<Vec<Space>, ConsumerError> {
    let conn = require(connection)?;
    Ok(conn.session.spaces().await?)
}
