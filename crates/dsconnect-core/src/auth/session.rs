use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::api::{ApiError, OpenbisApi};
use crate::models::{Person, Sample, ServerInformation, Space, TokenGrant, TokenRequest};

use super::credentials::{user_id_from_token, Credential, CredentialKind};

/// An authenticated session on one openBIS server.
///
/// Owns the API client and the session token. A session opened from a PAT
/// keeps `CredentialKind::Token` for its whole lifetime, which is what the
/// token issuance gate checks.
#[derive(Clone)]
pub struct Session {
    api: Arc<dyn OpenbisApi>,
    token: String,
    kind: CredentialKind,
    user_id: String,
}

impl Session {
    /// Open a session with whichever credential the operator supplied
    pub async fn open(api: Arc<dyn OpenbisApi>, credential: &Credential) -> Result<Self, ApiError> {
        match credential {
            Credential::Token(token) => Self::with_token(api, token).await,
            Credential::Password { username, password } => Self::login(api, username, password).await,
        }
    }

    /// Reuse an existing token (normally a PAT). The user id is taken from
    /// the token itself and the server is asked whether it is still active.
    pub async fn with_token(api: Arc<dyn OpenbisApi>, token: &str) -> Result<Self, ApiError> {
        let user_id = user_id_from_token(token)
            .filter(|id| !id.is_empty())
            .ok_or(ApiError::InvalidToken)?
            .to_string();

        if !api.is_session_active(token).await? {
            return Err(ApiError::InactiveSession);
        }

        info!(host = api.hostname(), user = %user_id, "Connected with token");
        Ok(Self {
            api,
            token: token.to_string(),
            kind: CredentialKind::Token,
            user_id,
        })
    }

    pub async fn login(api: Arc<dyn OpenbisApi>, username: &str, password: &str) -> Result<Self, ApiError> {
        let token = api.login(username, password).await?;
        info!(host = api.hostname(), user = username, "Logged in with password");
        Ok(Self {
            api,
            token,
            kind: CredentialKind::Password,
            user_id: username.to_string(),
        })
    }

    pub fn hostname(&self) -> &str {
        self.api.hostname()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    pub fn is_token_based(&self) -> bool {
        self.kind == CredentialKind::Token
    }

    /// Effective user id: the login name, or the one embedded in the token
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn server_information(&self) -> Result<ServerInformation, ApiError> {
        self.api.get_server_information(&self.token).await
    }

    pub async fn person(&self, user_id: &str) -> Result<Person, ApiError> {
        self.api.get_person(&self.token, user_id).await
    }

    /// Return a PAT for `request`, creating one unless a token with the same
    /// label is valid now and until at least `request.valid_to`.
    pub async fn get_or_create_personal_access_token(
        &self,
        request: &TokenRequest,
        now: DateTime<Utc>,
    ) -> Result<TokenGrant, ApiError> {
        let existing = self
            .api
            .search_personal_access_tokens(&self.token, &request.session_label)
            .await?;

        if let Some(pat) = existing
            .iter()
            .filter(|pat| request.is_covered_by(pat, now))
            .max_by_key(|pat| pat.valid_to)
        {
            info!(label = %request.session_label, valid_to = ?pat.valid_to, "Reusing existing personal access token");
            return Ok(TokenGrant::Reused(pat.perm_id().to_string()));
        }

        debug!(label = %request.session_label, from = %request.valid_from, to = %request.valid_to, "Creating personal access token");
        let perm_id = self.api.create_personal_access_token(&self.token, request).await?;
        Ok(TokenGrant::Created(perm_id))
    }

    pub async fn samples(&self, space_code: &str, type_code: &str) -> Result<Vec<Sample>, ApiError> {
        self.api.search_samples(&self.token, space_code, type_code).await
    }

    pub async fn spaces(&self) -> Result<Vec<Space>, ApiError> {
        self.api.search_spaces(&self.token).await
    }

    /// End a password session on the server. Token sessions are the PAT
    /// itself and are left alone.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if self.is_token_based() {
            return Ok(());
        }
        self.api.logout(&self.token).await
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.hostname())
            .field("kind", &self.kind)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersonalAccessToken;
    use crate::testing::{Call, FakeServer};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_login_uses_password() {
        let server = FakeServer::new();
        let session = Session::login(server.api(), "jdoe", "secret").await.unwrap();
        assert_eq!(session.kind(), CredentialKind::Password);
        assert_eq!(session.user_id(), "jdoe");
        assert_eq!(session.token(), "jdoe-260101000000000xSESSION");
        assert_eq!(server.calls(), vec![Call::Login("jdoe".into(), "secret".into())]);
    }

    #[tokio::test]
    async fn test_with_token_checks_session() {
        let server = FakeServer::new();
        let session = Session::with_token(server.api(), "$pat-jdoe-1x2").await.unwrap();
        assert!(session.is_token_based());
        assert_eq!(session.user_id(), "jdoe");
        assert_eq!(server.calls(), vec![Call::IsSessionActive("$pat-jdoe-1x2".into())]);
    }

    #[tokio::test]
    async fn test_with_token_rejects_inactive_or_malformed() {
        let server = FakeServer::new().with_inactive_tokens();
        let err = Session::with_token(server.api(), "$pat-jdoe-1x2").await.unwrap_err();
        assert!(matches!(err, ApiError::InactiveSession));

        let err = Session::with_token(server.api(), "garbage").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    fn pat(perm_id: &str, label: &str, valid_to: DateTime<Utc>) -> PersonalAccessToken {
        PersonalAccessToken {
            perm_id: crate::models::PermIdRef { value: perm_id.into() },
            session_name: label.into(),
            valid_from: Some(now() - Duration::days(10)),
            valid_to: Some(valid_to),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_covering_token() {
        let server = FakeServer::new().with_existing_pats(vec![
            pat("$pat-jdoe-OLD", "default", now() + Duration::days(400)),
            pat("$pat-jdoe-LAPTOP", "laptop", now() + Duration::days(500)),
        ]);
        let session = Session::login(server.api(), "jdoe", "pw").await.unwrap();

        let grant = session
            .get_or_create_personal_access_token(&TokenRequest::default_at(now()), now())
            .await
            .unwrap();
        assert_eq!(grant, TokenGrant::Reused("$pat-jdoe-OLD".to_string()));
        assert!(!server.calls().iter().any(|c| matches!(c, Call::CreatePat(_))));
    }

    #[tokio::test]
    async fn test_get_or_create_mints_when_existing_token_expires_too_soon() {
        let server = FakeServer::new().with_existing_pats(vec![pat(
            "$pat-jdoe-OLD",
            "default",
            now() + Duration::minutes(1),
        )]);
        let session = Session::login(server.api(), "jdoe", "pw").await.unwrap();

        let request = TokenRequest::default_at(now());
        let grant = session.get_or_create_personal_access_token(&request, now()).await.unwrap();
        assert_eq!(grant, TokenGrant::Created(server.minted_perm_id().to_string()));
        assert!(server.calls().contains(&Call::CreatePat(request)));
    }

    #[tokio::test]
    async fn test_get_or_create_ignores_expired_token() {
        let expired = PersonalAccessToken {
            perm_id: crate::models::PermIdRef { value: "$pat-jdoe-EXPIRED".into() },
            session_name: "default".into(),
            valid_from: Some(now() - Duration::days(400)),
            valid_to: Some(now() - Duration::days(35)),
        };
        let server = FakeServer::new().with_existing_pats(vec![expired]);
        let session = Session::login(server.api(), "jdoe", "pw").await.unwrap();

        let request = TokenRequest::default_at(now());
        let grant = session.get_or_create_personal_access_token(&request, now()).await.unwrap();
        assert_eq!(grant.perm_id(), server.minted_perm_id());
        assert!(server.calls().contains(&Call::CreatePat(request)));
    }

    #[tokio::test]
    async fn test_logout_only_for_password_sessions() {
        let server = FakeServer::new();
        let token_session = Session::with_token(server.api(), "$pat-jdoe-1x2").await.unwrap();
        token_session.logout().await.unwrap();
        assert!(!server.calls().iter().any(|c| matches!(c, Call::Logout)));

        let pw_session = Session::login(server.api(), "jdoe", "pw").await.unwrap();
        pw_session.logout().await.unwrap();
        assert!(server.calls().contains(&Call::Logout));
    }
}
