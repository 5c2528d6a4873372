//! Connection manager: turns the connection form into a live session.
//!
//! `evaluate` is a function of the environment, the form values, and the
//! trigger. It never retries and never falls back from token to password:
//! failures of the server calls are returned to the caller unchanged.

use tracing::{info, instrument};

use crate::api::ApiError;
use crate::auth::Session;
use crate::bootstrap::Environment;
use crate::forms::ConnectionForm;
use crate::models::{Person, ServerInformation};
use crate::view::{Callout, CalloutKind};

pub const MISSING_CLIENT_MESSAGE: &str =
    "The openBIS client backend is not available - rebuild dsconnect with the `http` feature to connect";

pub const AWAITING_INPUT_MESSAGE: &str = "Please enter credentials above and press (Re)Connect!";

/// A session together with the metadata fetched right after connecting.
#[derive(Debug, Clone)]
pub struct Connection {
    pub session: Session,
    pub server_info: ServerInformation,
    pub person: Person,
    pub home_space: Option<String>,
}

impl Connection {
    pub fn user_id(&self) -> &str {
        self.session.user_id()
    }

    pub fn is_token_based(&self) -> bool {
        self.session.is_token_based()
    }

    /// Success summary shown after (re)connecting
    pub fn summary(&self) -> Callout {
        let person = &self.person;
        Callout::new(CalloutKind::Success, "Connected!")
            .line(format!(
                "Server: {}, version {}, API version: {}",
                self.session.hostname(),
                self.server_info.openbis_version(),
                self.server_info.api_version()
            ))
            .line(format!(
                "UserId: {}, {} ({})",
                person.user_id,
                person.full_name(),
                person.email.as_deref().unwrap_or("no email")
            ))
            .line(format!("Space: {}", self.home_space.as_deref().unwrap_or("none")))
            .line(format!("PAT: {}", self.is_token_based()))
    }
}

/// What the connection stage exposes to later stages.
#[derive(Debug, Clone)]
pub struct ConnectionOutcome {
    pub view: Callout,
    pub connection: Option<Connection>,
}

impl ConnectionOutcome {
    fn without_session(view: Callout) -> Self {
        Self { view, connection: None }
    }
}

/// Establish or renew a session.
///
/// Without a client backend or without the trigger no server call is made.
/// With the trigger, a non-empty token is used exclusively; otherwise the
/// username and password log in.
#[instrument(skip_all, fields(url = %form.url, trigger = trigger))]
pub async fn evaluate(
    env: &Environment,
    form: &ConnectionForm,
    trigger: bool,
) -> Result<ConnectionOutcome, ApiError> {
    let Some(connector) = env.connector.as_ref() else {
        return Ok(ConnectionOutcome::without_session(Callout::danger(MISSING_CLIENT_MESSAGE)));
    };
    if !trigger {
        return Ok(ConnectionOutcome::without_session(Callout::neutral(AWAITING_INPUT_MESSAGE)));
    }

    let api = connector.open(form.url.trim())?;
    let session = Session::open(api, &form.credential()).await?;

    let server_info = session.server_information().await?;
    let person = session.person(session.user_id()).await?;
    let home_space = person.home_space().map(str::to_string);
    info!(user = %person.user_id, home_space = ?home_space, token = session.is_token_based(), "Connection established");

    let connection = Connection {
        session,
        server_info,
        person,
        home_space,
    };
    Ok(ConnectionOutcome {
        view: connection.summary(),
        connection: Some(connection),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::testing::{Call, FakeServer};

    fn env_with(server: &FakeServer) -> Environment {
        Environment {
            stored_token: String::new(),
            pat_file: PathBuf::from("unused.txt"),
            connector: Some(Arc::new(server.clone())),
        }
    }

    fn form(token: &str) -> ConnectionForm {
        let mut form = ConnectionForm::new("https://openbis.test/", token, "jdoe");
        form.password = "secret".to_string();
        form
    }

    #[tokio::test]
    async fn test_missing_client_reports_danger() {
        let env = Environment {
            stored_token: String::new(),
            pat_file: PathBuf::from("unused.txt"),
            connector: None,
        };
        let outcome = evaluate(&env, &form(""), true).await.unwrap();
        assert_eq!(outcome.view.kind, CalloutKind::Danger);
        assert_eq!(outcome.view.title, MISSING_CLIENT_MESSAGE);
        assert!(outcome.connection.is_none());
    }

    #[tokio::test]
    async fn test_no_trigger_awaits_input() {
        let server = FakeServer::new();
        let outcome = evaluate(&env_with(&server), &form(""), false).await.unwrap();
        assert_eq!(outcome.view.kind, CalloutKind::Neutral);
        assert!(outcome.connection.is_none());
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn test_password_path_never_uses_token() {
        let server = FakeServer::new();
        let outcome = evaluate(&env_with(&server), &form(""), true).await.unwrap();

        let connection = outcome.connection.expect("should be connected");
        assert!(!connection.is_token_based());
        assert_eq!(connection.home_space.as_deref(), Some("JDOE"));
        assert_eq!(
            server.calls(),
            vec![
                Call::Open("https://openbis.test/".into()),
                Call::Login("jdoe".into(), "secret".into()),
                Call::ServerInformation,
                Call::GetPerson("jdoe".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_token_path_takes_precedence() {
        let server = FakeServer::new();
        let outcome = evaluate(&env_with(&server), &form("$pat-alice-261016x1"), true)
            .await
            .unwrap();

        let connection = outcome.connection.expect("should be connected");
        assert!(connection.is_token_based());
        assert_eq!(connection.user_id(), "alice");
        let calls = server.calls();
        assert!(calls.contains(&Call::IsSessionActive("$pat-alice-261016x1".into())));
        assert!(calls.contains(&Call::GetPerson("alice".into())));
        assert!(!calls.iter().any(|c| matches!(c, Call::Login(..))));
    }

    #[tokio::test]
    async fn test_summary_lines() {
        let server = FakeServer::new();
        let outcome = evaluate(&env_with(&server), &form(""), true).await.unwrap();
        assert_eq!(outcome.view.kind, CalloutKind::Success);
        assert_eq!(
            outcome.view.lines,
            vec![
                "Server: openbis.test, version 20.10.11, API version: 3.6".to_string(),
                "UserId: jdoe, Jane Doe (jane.doe@bam.de)".to_string(),
                "Space: JDOE".to_string(),
                "PAT: false".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_authentication_failure_propagates() {
        let server = FakeServer::new().rejecting_login();
        let err = evaluate(&env_with(&server), &form(""), true).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        // No retry, no fallback
        assert_eq!(
            server.calls(),
            vec![
                Call::Open("https://openbis.test/".into()),
                Call::Login("jdoe".into(), "secret".into()),
            ]
        );
    }
}
