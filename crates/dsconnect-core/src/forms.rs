//! Form values for connecting and for issuing a PAT.
//!
//! Forms hold raw text exactly as the operator typed it; conversion into
//! typed inputs happens when a trigger is pressed.

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

use crate::auth::Credential;
use crate::models::{TokenRequest, DEFAULT_SESSION_LABEL, DEFAULT_VALIDITY_DAYS};

/// Server offered when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "https://main.datastore.bam.de/";

/// Format of the editable validity timestamps (local time)
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Login name of the operating system user
pub fn os_username() -> Option<String> {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.trim().is_empty())
}

/// Default username: an explicit choice, else the OS login name, else the
/// one saved from the last password login.
pub fn default_username(explicit: Option<String>, saved: Option<String>) -> String {
    first_non_blank([explicit, os_username(), saved])
}

fn first_non_blank<const N: usize>(candidates: [Option<String>; N]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionForm {
    pub url: String,
    pub token: String,
    pub username: String,
    pub password: String,
}

impl ConnectionForm {
    pub fn new(url: impl Into<String>, token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            username: username.into(),
            password: String::new(),
        }
    }

    /// Credentials to use; a non-empty token wins over username/password
    pub fn credential(&self) -> Credential {
        Credential::from_inputs(&self.token, &self.username, &self.password)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("Session name must not be empty")]
    EmptyLabel,

    #[error("Invalid {field} date '{value}' - expected YYYY-MM-DD HH:MM")]
    InvalidDate { field: &'static str, value: String },

    #[error("'Valid from' must be before 'to'")]
    EmptyWindow,

    #[error("'to' may be at most {max_days} days from now")]
    TooLong { max_days: i64 },

    #[error("The server accepts PATs valid for at most {max_days} days")]
    ExceedsServerLimit { max_days: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenForm {
    pub session_label: String,
    pub valid_from: String,
    pub valid_to: String,
}

impl TokenForm {
    /// Label "default", valid from now for one year
    pub fn defaults(now: DateTime<Utc>) -> Self {
        let request = TokenRequest::default_at(now);
        Self {
            session_label: request.session_label,
            valid_from: format_local(request.valid_from),
            valid_to: format_local(request.valid_to),
        }
    }

    /// Validate the form into a request. The upper bound matches the date
    /// picker range: no later than one year from `now`. When the server
    /// advertises a maximum PAT lifetime (`server_max_secs`), the window
    /// must not be longer.
    pub fn to_request(&self, now: DateTime<Utc>, server_max_secs: Option<i64>) -> Result<TokenRequest, FormError> {
        let label = self.session_label.trim();
        if label.is_empty() {
            return Err(FormError::EmptyLabel);
        }
        let valid_from = parse_local("valid from", &self.valid_from)?;
        let valid_to = parse_local("to", &self.valid_to)?;

        if valid_from >= valid_to {
            return Err(FormError::EmptyWindow);
        }
        // Minute precision in the form: allow the trailing minute of the default window
        let latest = now + Duration::days(DEFAULT_VALIDITY_DAYS) + Duration::minutes(1);
        if valid_to > latest {
            return Err(FormError::TooLong {
                max_days: DEFAULT_VALIDITY_DAYS,
            });
        }
        if let Some(max_secs) = server_max_secs {
            if valid_to - valid_from > Duration::seconds(max_secs) + Duration::minutes(1) {
                return Err(FormError::ExceedsServerLimit {
                    max_days: max_secs / 86_400,
                });
            }
        }
        Ok(TokenRequest::new(label, valid_from, valid_to))
    }
}

impl Default for TokenForm {
    fn default() -> Self {
        Self::defaults(Utc::now())
    }
}

pub fn format_local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(DATETIME_FORMAT).to_string()
}

fn parse_local(field: &'static str, value: &str) -> Result<DateTime<Utc>, FormError> {
    let invalid = || FormError::InvalidDate {
        field,
        value: value.to_string(),
    };
    let naive = NaiveDateTime::parse_from_str(value.trim(), DATETIME_FORMAT).map_err(|_| invalid())?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_default_token_form_round_trips() {
        let form = TokenForm::defaults(now());
        assert_eq!(form.session_label, DEFAULT_SESSION_LABEL);

        let request = form.to_request(now(), None).unwrap();
        assert_eq!(request.session_label, "default");
        assert_eq!(request.valid_from, now());
        assert_eq!(request.valid_to, now() + Duration::days(365));
    }

    #[test]
    fn test_label_is_trimmed_and_required() {
        let mut form = TokenForm::defaults(now());
        form.session_label = "  laptop ".to_string();
        assert_eq!(form.to_request(now(), None).unwrap().session_label, "laptop");

        form.session_label = "   ".to_string();
        assert_eq!(form.to_request(now(), None), Err(FormError::EmptyLabel));
    }

    #[test]
    fn test_invalid_dates() {
        let mut form = TokenForm::defaults(now());
        form.valid_from = "tomorrow".to_string();
        assert!(matches!(
            form.to_request(now(), None),
            Err(FormError::InvalidDate { field: "valid from", .. })
        ));

        let mut form = TokenForm::defaults(now());
        form.valid_to = form.valid_from.clone();
        assert_eq!(form.to_request(now(), None), Err(FormError::EmptyWindow));
    }

    #[test]
    fn test_window_longer_than_a_year_is_rejected() {
        let mut form = TokenForm::defaults(now());
        form.valid_to = format_local(now() + Duration::days(400));
        assert_eq!(form.to_request(now(), None), Err(FormError::TooLong { max_days: 365 }));
    }

    #[test]
    fn test_window_is_checked_against_server_limit() {
        let form = TokenForm::defaults(now());
        // A one-year limit admits the default window
        assert!(form.to_request(now(), Some(365 * 86_400)).is_ok());
        assert_eq!(
            form.to_request(now(), Some(30 * 86_400)),
            Err(FormError::ExceedsServerLimit { max_days: 30 })
        );

        let mut short = TokenForm::defaults(now());
        short.valid_to = format_local(now() + Duration::days(30));
        assert!(short.to_request(now(), Some(30 * 86_400)).is_ok());
    }

    #[test]
    fn test_username_precedence() {
        let pick = |explicit: Option<&str>, os: Option<&str>, saved: Option<&str>| {
            first_non_blank([explicit, os, saved].map(|v| v.map(str::to_string)))
        };
        assert_eq!(pick(Some("env"), Some("os"), Some("saved")), "env");
        assert_eq!(pick(None, Some("os"), Some("saved")), "os");
        assert_eq!(pick(Some("  "), None, Some("saved")), "saved");
        assert_eq!(pick(None, None, None), "");
    }

    #[test]
    fn test_connection_form_credential() {
        let mut form = ConnectionForm::new(DEFAULT_SERVER_URL, "", "jdoe");
        form.password = "secret".to_string();
        assert_eq!(
            form.credential(),
            Credential::Password {
                username: "jdoe".to_string(),
                password: "secret".to_string()
            }
        );

        form.token = "$pat-jdoe-1".to_string();
        assert_eq!(form.credential(), Credential::Token("$pat-jdoe-1".to_string()));
    }
}
