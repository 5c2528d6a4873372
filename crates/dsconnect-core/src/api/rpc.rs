//! JSON-RPC envelopes and request payloads for the openBIS v3 API.
//!
//! openBIS deserializes every parameter by its `@type` tag, so the criteria
//! and fetch options built here carry the fully qualified DTO names the
//! server expects.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{Person, TokenRequest};

use super::ApiError;

/// Path of the application server v3 JSON endpoint, relative to the server URL
pub const V3_ENDPOINT: &str = "openbis/openbis/rmi-application-server-v3.json";

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Serialize)]
pub struct RpcRequest {
    pub method: &'static str,
    pub params: Vec<Value>,
    pub id: String,
    pub jsonrpc: &'static str,
}

impl RpcRequest {
    pub fn new(method: &'static str, params: Vec<Value>) -> Self {
        Self {
            method,
            params,
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed).to_string(),
            jsonrpc: "2.0",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Unwrap the envelope into the typed result or the mapped RPC error
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        if let Some(err) = self.error {
            return Err(ApiError::from_rpc(err.code, &err.message));
        }
        let value = self.result.unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// Join the server URL and the v3 endpoint, tolerating a trailing slash
pub fn endpoint_url(server_url: &str) -> String {
    format!("{}/{}", server_url.trim_end_matches('/'), V3_ENDPOINT)
}

// ===== Payload builders =====

pub fn person_perm_id(user_id: &str) -> Value {
    json!({
        "@type": "as.dto.person.id.PersonPermId",
        "permId": user_id,
    })
}

pub fn person_fetch_options() -> Value {
    json!({
        "@type": "as.dto.person.fetchoptions.PersonFetchOptions",
        "space": { "@type": "as.dto.space.fetchoptions.SpaceFetchOptions" },
    })
}

fn string_equal_to(value: &str) -> Value {
    json!({
        "@type": "as.dto.common.search.StringEqualToValue",
        "value": value,
    })
}

fn code_equals(code: &str) -> Value {
    json!({
        "@type": "as.dto.common.search.CodeSearchCriteria",
        "fieldValue": string_equal_to(code),
    })
}

pub fn pat_search_criteria(session_name: &str) -> Value {
    json!({
        "@type": "as.dto.pat.search.PersonalAccessTokenSearchCriteria",
        "operator": "AND",
        "criteria": [{
            "@type": "as.dto.pat.search.PersonalAccessTokenSessionNameSearchCriteria",
            "fieldValue": string_equal_to(session_name),
        }],
    })
}

pub fn pat_fetch_options() -> Value {
    json!({
        "@type": "as.dto.pat.fetchoptions.PersonalAccessTokenFetchOptions",
    })
}

pub fn pat_creation(request: &TokenRequest) -> Value {
    json!({
        "@type": "as.dto.pat.create.PersonalAccessTokenCreation",
        "sessionName": request.session_label,
        "validFromDate": request.valid_from.timestamp_millis(),
        "validToDate": request.valid_to.timestamp_millis(),
    })
}

pub fn sample_search_criteria(space_code: &str, type_code: &str) -> Value {
    json!({
        "@type": "as.dto.sample.search.SampleSearchCriteria",
        "operator": "AND",
        "criteria": [
            {
                "@type": "as.dto.space.search.SpaceSearchCriteria",
                "operator": "AND",
                "criteria": [code_equals(space_code)],
            },
            {
                "@type": "as.dto.sample.search.SampleTypeSearchCriteria",
                "operator": "AND",
                "criteria": [code_equals(type_code)],
            },
        ],
    })
}

pub fn sample_fetch_options() -> Value {
    json!({
        "@type": "as.dto.sample.fetchoptions.SampleFetchOptions",
        "type": { "@type": "as.dto.sample.fetchoptions.SampleTypeFetchOptions" },
    })
}

pub fn space_search_criteria() -> Value {
    json!({
        "@type": "as.dto.space.search.SpaceSearchCriteria",
        "operator": "AND",
        "criteria": [],
    })
}

pub fn space_fetch_options() -> Value {
    json!({
        "@type": "as.dto.space.fetchoptions.SpaceFetchOptions",
    })
}

/// Result wrapper of every `search*` method
#[derive(Debug, Deserialize)]
pub struct SearchResult<T> {
    pub objects: Vec<T>,
}

/// `getPersons` answers with a map keyed by the stringified person id
pub fn person_from_map(result: Value, user_id: &str) -> Result<Person, ApiError> {
    let map = match result {
        Value::Object(map) => map,
        other => {
            return Err(ApiError::InvalidResponse(format!(
                "expected a person map, got {}",
                other
            )))
        }
    };
    let value = map
        .into_iter()
        .map(|(_, v)| v)
        .next()
        .ok_or_else(|| ApiError::NotFound(format!("person {}", user_id)))?;
    serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}
