//! HTTP client for the openBIS v3 JSON-RPC API.
//!
//! This module provides `HttpClient`, which posts JSON-RPC envelopes to the
//! application server endpoint, and `HttpConnector`, which hands out clients
//! sharing one connection pool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::models::{Person, PersonalAccessToken, Sample, ServerInformation, Space, TokenRequest};

use super::rpc::{self, RpcRequest, RpcResponse, SearchResult};
use super::{ApiError, Connector, OpenbisApi};

/// HTTP request timeout in seconds.
/// Login against a busy server can take several seconds; 30s still fails
/// fast enough for an interactive session.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Hands out `HttpClient`s sharing a single reqwest connection pool.
#[derive(Clone)]
pub struct HttpConnector {
    client: Client,
}

impl HttpConnector {
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

impl Connector for HttpConnector {
    fn open(&self, url: &str) -> Result<Arc<dyn OpenbisApi>, ApiError> {
        Ok(Arc::new(HttpClient::with_client(self.client.clone(), url)?))
    }
}

/// API client bound to one openBIS server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: String,
    hostname: String,
}

impl HttpClient {
    fn with_client(client: Client, url: &str) -> Result<Self, ApiError> {
        let hostname = Self::parse_hostname(url)?;
        Ok(Self {
            client,
            endpoint: rpc::endpoint_url(url.trim()),
            hostname,
        })
    }

    fn parse_hostname(url: &str) -> Result<String, ApiError> {
        let parsed = Url::parse(url.trim()).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!("{}: unsupported scheme", url)));
        }
        parsed
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| ApiError::InvalidUrl(format!("{}: missing host", url)))
    }

    async fn call<T: DeserializeOwned>(&self, method: &'static str, params: Vec<Value>) -> Result<T, ApiError> {
        let request = RpcRequest::new(method, params);
        debug!(method, id = %request.id, host = %self.hostname, "openBIS request");

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(method, status = status.as_u16(), "openBIS request failed");
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", method, e)))?;
        envelope.into_result()
    }
}

#[async_trait]
impl OpenbisApi for HttpClient {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    async fn login(&self, user_id: &str, password: &str) -> Result<String, ApiError> {
        // openBIS answers a failed login with a null token rather than an error
        let token: Option<String> = self.call("login", vec![json!(user_id), json!(password)]).await?;
        token.ok_or(ApiError::Unauthorized)
    }

    async fn logout(&self, session_token: &str) -> Result<(), ApiError> {
        self.call("logout", vec![json!(session_token)]).await
    }

    async fn is_session_active(&self, session_token: &str) -> Result<bool, ApiError> {
        self.call("isSessionActive", vec![json!(session_token)]).await
    }

    async fn get_server_information(&self, session_token: &str) -> Result<ServerInformation, ApiError> {
        let entries = self.call("getServerInformation", vec![json!(session_token)]).await?;
        Ok(ServerInformation::from_map(entries))
    }

    async fn get_person(&self, session_token: &str, user_id: &str) -> Result<Person, ApiError> {
        let result: Value = self
            .call(
                "getPersons",
                vec![
                    json!(session_token),
                    json!([rpc::person_perm_id(user_id)]),
                    rpc::person_fetch_options(),
                ],
            )
            .await?;
        rpc::person_from_map(result, user_id)
    }

    async fn search_personal_access_tokens(
        &self,
        session_token: &str,
        session_name: &str,
    ) -> Result<Vec<PersonalAccessToken>, ApiError> {
        let result: SearchResult<PersonalAccessToken> = self
            .call(
                "searchPersonalAccessTokens",
                vec![
                    json!(session_token),
                    rpc::pat_search_criteria(session_name),
                    rpc::pat_fetch_options(),
                ],
            )
            .await?;
        Ok(result.objects)
    }

    async fn create_personal_access_token(
        &self,
        session_token: &str,
        request: &TokenRequest,
    ) -> Result<String, ApiError> {
        let ids: Vec<crate::models::PermIdRef> = self
            .call(
                "createPersonalAccessTokens",
                vec![json!(session_token), json!([rpc::pat_creation(request)])],
            )
            .await?;
        ids.into_iter()
            .next()
            .map(|id| id.value)
            .ok_or_else(|| ApiError::InvalidResponse("createPersonalAccessTokens returned no id".to_string()))
    }

    async fn search_samples(
        &self,
        session_token: &str,
        space_code: &str,
        type_code: &str,
    ) -> Result<Vec<Sample>, ApiError> {
        let result: SearchResult<Sample> = self
            .call(
                "searchSamples",
                vec![
                    json!(session_token),
                    rpc::sample_search_criteria(space_code, type_code),
                    rpc::sample_fetch_options(),
                ],
            )
            .await?;
        Ok(result.objects)
    }

    async fn search_spaces(&self, session_token: &str) -> Result<Vec<Space>, ApiError> {
        let result: SearchResult<Space> = self
            .call(
                "searchSpaces",
                vec![
                    json!(session_token),
                    rpc::space_search_criteria(),
                    rpc::space_fetch_options(),
                ],
            )
            .await?;
        Ok(result.objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hostname() {
        assert_eq!(
            HttpClient::parse_hostname("https://main.datastore.bam.de/").unwrap(),
            "main.datastore.bam.de"
        );
        assert_eq!(HttpClient::parse_hostname(" http://localhost:8443 ").unwrap(), "localhost");

        assert!(matches!(HttpClient::parse_hostname("main.datastore.bam.de"), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(HttpClient::parse_hostname("ftp://example.org"), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(HttpClient::parse_hostname(""), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_connector_opens_client_for_url() {
        let connector = HttpConnector::new().expect("Failed to build HTTP connector");
        let api = connector.open("https://main.datastore.bam.de/").unwrap();
        assert_eq!(api.hostname(), "main.datastore.bam.de");
        assert!(connector.open("not a url").is_err());
    }
}
