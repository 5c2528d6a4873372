//! In-memory openBIS server for tests.
//!
//! `FakeServer` implements both `Connector` and `OpenbisApi` and records
//! every call, so tests can assert which server operations a flow used.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::{ApiError, Connector, OpenbisApi};
use crate::models::sample::SampleType;
use crate::models::{
    EntityRef, PermIdRef, Person, PersonalAccessToken, Sample, ServerInformation, Space, SpaceCode,
    TokenRequest,
};

pub const FAKE_HOSTNAME: &str = "openbis.test";
const SESSION_SUFFIX: &str = "-260101000000000xSESSION";
const MINTED_PERM_ID: &str = "$pat-jdoe-261016090000000xNEW";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(String),
    Login(String, String),
    Logout,
    IsSessionActive(String),
    ServerInformation,
    GetPerson(String),
    SearchPats(String),
    CreatePat(TokenRequest),
    SearchSamples(String, String),
    SearchSpaces,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    inactive_tokens: bool,
    reject_login: bool,
    pat_max_validity_secs: Option<i64>,
    existing_pats: Vec<PersonalAccessToken>,
}

#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<State>>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `isSessionActive` answers false for every token
    pub fn with_inactive_tokens(self) -> Self {
        self.state.lock().unwrap().inactive_tokens = true;
        self
    }

    /// `login` fails as with wrong credentials
    pub fn rejecting_login(self) -> Self {
        self.state.lock().unwrap().reject_login = true;
        self
    }

    /// `getServerInformation` advertises a maximum PAT lifetime
    pub fn with_pat_max_validity(self, secs: i64) -> Self {
        self.state.lock().unwrap().pat_max_validity_secs = Some(secs);
        self
    }

    pub fn with_existing_pats(self, pats: Vec<PersonalAccessToken>) -> Self {
        self.state.lock().unwrap().existing_pats = pats;
        self
    }

    pub fn api(&self) -> Arc<dyn OpenbisApi> {
        Arc::new(self.clone())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn minted_perm_id(&self) -> &'static str {
        MINTED_PERM_ID
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl Connector for FakeServer {
    fn open(&self, url: &str) -> Result<Arc<dyn OpenbisApi>, ApiError> {
        self.record(Call::Open(url.to_string()));
        Ok(self.api())
    }
}

#[async_trait]
impl OpenbisApi for FakeServer {
    fn hostname(&self) -> &str {
        FAKE_HOSTNAME
    }

    async fn login(&self, user_id: &str, password: &str) -> Result<String, ApiError> {
        self.record(Call::Login(user_id.to_string(), password.to_string()));
        if self.state.lock().unwrap().reject_login {
            return Err(ApiError::Unauthorized);
        }
        Ok(format!("{}{}", user_id, SESSION_SUFFIX))
    }

    async fn logout(&self, _session_token: &str) -> Result<(), ApiError> {
        self.record(Call::Logout);
        Ok(())
    }

    async fn is_session_active(&self, session_token: &str) -> Result<bool, ApiError> {
        self.record(Call::IsSessionActive(session_token.to_string()));
        Ok(!self.state.lock().unwrap().inactive_tokens)
    }

    async fn get_server_information(&self, _session_token: &str) -> Result<ServerInformation, ApiError> {
        self.record(Call::ServerInformation);
        let mut entries: std::collections::BTreeMap<String, String> =
            [("openbis-version", "20.10.11"), ("api-version", "3.6")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
        if let Some(secs) = self.state.lock().unwrap().pat_max_validity_secs {
            entries.insert(
                "personal-access-tokens-max-validity-period".to_string(),
                secs.to_string(),
            );
        }
        Ok(ServerInformation::from_map(entries))
    }

    async fn get_person(&self, _session_token: &str, user_id: &str) -> Result<Person, ApiError> {
        self.record(Call::GetPerson(user_id.to_string()));
        Ok(Person {
            user_id: user_id.to_string(),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            email: Some("jane.doe@bam.de".to_string()),
            active: Some(true),
            space: Some(EntityRef::Object(SpaceCode {
                code: user_id.to_uppercase(),
            })),
        })
    }

    async fn search_personal_access_tokens(
        &self,
        _session_token: &str,
        session_name: &str,
    ) -> Result<Vec<PersonalAccessToken>, ApiError> {
        self.record(Call::SearchPats(session_name.to_string()));
        Ok(self.state.lock().unwrap().existing_pats.clone())
    }

    async fn create_personal_access_token(
        &self,
        _session_token: &str,
        request: &TokenRequest,
    ) -> Result<String, ApiError> {
        self.record(Call::CreatePat(request.clone()));
        Ok(MINTED_PERM_ID.to_string())
    }

    async fn search_samples(
        &self,
        _session_token: &str,
        space_code: &str,
        type_code: &str,
    ) -> Result<Vec<Sample>, ApiError> {
        self.record(Call::SearchSamples(space_code.to_string(), type_code.to_string()));
        Ok(vec![Sample {
            perm_id: Some(PermIdRef { value: "20261016090000000-1".to_string() }),
            identifier: Some(PermIdRef { value: format!("/{}/DEFAULT/STEP_1", space_code) }),
            code: "STEP_1".to_string(),
            sample_type: Some(EntityRef::Object(SampleType {
                code: type_code.to_string(),
            })),
            registration_date: Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).single(),
        }])
    }

    async fn search_spaces(&self, _session_token: &str) -> Result<Vec<Space>, ApiError> {
        self.record(Call::SearchSpaces);
        Ok(vec![Space {
            code: "JDOE".to_string(),
            description: Some("Home space".to_string()),
        }])
    }
}
