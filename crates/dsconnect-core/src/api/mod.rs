//! openBIS API access.
//!
//! `OpenbisApi` is the surface of the openBIS application server this tool
//! consumes; `Connector` opens an `OpenbisApi` for a server URL. The HTTP
//! implementation (`HttpConnector`, `HttpClient`) speaks the v3 JSON-RPC
//! protocol and is compiled in with the `http` feature. Without it no
//! connector is available and connection attempts report the missing
//! backend instead of failing.

#[cfg(feature = "http")]
pub mod client;
pub mod error;
pub mod rpc;

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{Person, PersonalAccessToken, Sample, ServerInformation, Space, TokenRequest};

#[cfg(feature = "http")]
pub use client::{HttpClient, HttpConnector};
pub use error::ApiError;

/// Stateless view of the application server; every call that needs a
/// session takes its token explicitly.
#[async_trait]
pub trait OpenbisApi: Send + Sync {
    /// Host name of the server this client talks to
    fn hostname(&self) -> &str;

    /// Authenticate and return a fresh session token
    async fn login(&self, user_id: &str, password: &str) -> Result<String, ApiError>;

    async fn logout(&self, session_token: &str) -> Result<(), ApiError>;

    async fn is_session_active(&self, session_token: &str) -> Result<bool, ApiError>;

    async fn get_server_information(&self, session_token: &str) -> Result<ServerInformation, ApiError>;

    async fn get_person(&self, session_token: &str, user_id: &str) -> Result<Person, ApiError>;

    async fn search_personal_access_tokens(
        &self,
        session_token: &str,
        session_name: &str,
    ) -> Result<Vec<PersonalAccessToken>, ApiError>;

    /// Create a PAT and return its permId
    async fn create_personal_access_token(
        &self,
        session_token: &str,
        request: &TokenRequest,
    ) -> Result<String, ApiError>;

    async fn search_samples(
        &self,
        session_token: &str,
        space_code: &str,
        type_code: &str,
    ) -> Result<Vec<Sample>, ApiError>;

    async fn search_spaces(&self, session_token: &str) -> Result<Vec<Space>, ApiError>;
}

/// Opens API clients for server URLs.
pub trait Connector: Send + Sync {
    fn open(&self, url: &str) -> Result<Arc<dyn OpenbisApi>, ApiError>;
}

/// The connector compiled into this build, if any
pub fn default_connector() -> Option<Arc<dyn Connector>> {
    #[cfg(feature = "http")]
    {
        match HttpConnector::new() {
            Ok(connector) => return Some(Arc::new(connector)),
            Err(e) => tracing::error!(error = %e, "Failed to initialize HTTP client"),
        }
    }
    None
}
