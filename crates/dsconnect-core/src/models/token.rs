use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::PermIdRef;

/// Session label used when the operator does not pick one
pub const DEFAULT_SESSION_LABEL: &str = "default";

/// Default PAT lifetime, also the upper bound offered by the form
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// A personal access token as returned by `searchPersonalAccessTokens`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalAccessToken {
    #[serde(rename = "permId")]
    pub perm_id: PermIdRef,
    #[serde(rename = "sessionName")]
    pub session_name: String,
    #[serde(rename = "validFromDate", with = "chrono::serde::ts_milliseconds_option", default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(rename = "validToDate", with = "chrono::serde::ts_milliseconds_option", default)]
    pub valid_to: Option<DateTime<Utc>>,
}

impl PersonalAccessToken {
    pub fn perm_id(&self) -> &str {
        &self.perm_id.value
    }

    /// A token is reusable as long as its validity window has not ended
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_to.map(|to| to > at).unwrap_or(false)
    }
}

/// Input for minting a new PAT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub session_label: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
}

impl TokenRequest {
    pub fn new(session_label: impl Into<String>, valid_from: DateTime<Utc>, valid_to: DateTime<Utc>) -> Self {
        Self {
            session_label: session_label.into(),
            valid_from,
            valid_to,
        }
    }

    /// Label "default", valid from `now` for one year
    pub fn default_at(now: DateTime<Utc>) -> Self {
        Self::new(DEFAULT_SESSION_LABEL, now, now + Duration::days(DEFAULT_VALIDITY_DAYS))
    }

    /// An existing token satisfies the request if it has the same label, is
    /// valid at `now` and stays valid at least until `valid_to`.
    pub fn is_covered_by(&self, pat: &PersonalAccessToken, now: DateTime<Utc>) -> bool {
        pat.session_name == self.session_label
            && pat.is_valid_at(now)
            && pat.valid_to.map(|to| to >= self.valid_to).unwrap_or(false)
    }
}

/// permId handed out for a `TokenRequest`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenGrant {
    /// Minted by this request
    Created(String),
    /// An existing token already covering the requested window
    Reused(String),
}

impl TokenGrant {
    pub fn perm_id(&self) -> &str {
        match self {
            TokenGrant::Created(id) | TokenGrant::Reused(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_pat() {
        let json = r#"{
            "@type": "as.dto.pat.PersonalAccessToken",
            "permId": {"@type": "as.dto.pat.id.PersonalAccessTokenPermId", "permId": "$pat-jdoe-241016101500000xABCD"},
            "sessionName": "default",
            "validFromDate": 1729073700000,
            "validToDate": 1760609700000
        }"#;
        let pat: PersonalAccessToken = serde_json::from_str(json).expect("Failed to parse PAT JSON");
        assert_eq!(pat.perm_id(), "$pat-jdoe-241016101500000xABCD");
        assert_eq!(pat.session_name, "default");

        let before_expiry = Utc.timestamp_millis_opt(1760609699999).unwrap();
        let at_expiry = Utc.timestamp_millis_opt(1760609700000).unwrap();
        assert!(pat.is_valid_at(before_expiry));
        assert!(!pat.is_valid_at(at_expiry));
    }

    #[test]
    fn test_default_request() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let req = TokenRequest::default_at(now);
        assert_eq!(req.session_label, "default");
        assert_eq!(req.valid_from, now);
        assert_eq!(req.valid_to, Utc.with_ymd_and_hms(2027, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_request_is_covered_only_by_long_enough_token() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let request = TokenRequest::default_at(now);
        let pat = |label: &str, valid_to| PersonalAccessToken {
            perm_id: PermIdRef { value: "$pat-jdoe-1".to_string() },
            session_name: label.to_string(),
            valid_from: Some(now - Duration::days(1)),
            valid_to,
        };

        assert!(request.is_covered_by(&pat("default", Some(request.valid_to)), now));
        assert!(!request.is_covered_by(&pat("default", Some(now + Duration::minutes(1))), now));
        assert!(!request.is_covered_by(&pat("laptop", Some(request.valid_to)), now));
        assert!(!request.is_covered_by(&pat("default", None), now));
    }
}
