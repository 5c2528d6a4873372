use std::fmt;

/// Credentials supplied by the operator.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Token(String),
    Password { username: String, password: String },
}

/// Which kind of credential a session was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Token,
    Password,
}

impl Credential {
    /// Pick the credential to use from raw form values.
    /// Any non-empty token field wins, even if it is only whitespace; the
    /// password is then ignored. The token itself is sent trimmed.
    pub fn from_inputs(token: &str, username: &str, password: &str) -> Self {
        if !token.is_empty() {
            Credential::Token(token.trim().to_string())
        } else {
            Credential::Password {
                username: username.trim().to_string(),
                password: password.to_string(),
            }
        }
    }

    pub fn kind(&self) -> CredentialKind {
        match self {
            Credential::Token(_) => CredentialKind::Token,
            Credential::Password { .. } => CredentialKind::Password,
        }
    }
}

// Keep secrets out of logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Token(_) => f.write_str("Credential::Token(***)"),
            Credential::Password { username, .. } => f
                .debug_struct("Credential::Password")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// Extract the user id from a structured token (`<prefix>-<userId>-<suffix>`).
///
/// PATs look like `$pat-jdoe-241016101500000xABCD`; the user id is the second
/// hyphen-delimited segment. Returns `None` when there is no second segment.
pub fn user_id_from_token(token: &str) -> Option<&str> {
    token.split('-').nth(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_from_token() {
        assert_eq!(user_id_from_token("abc-jdoe-123456"), Some("jdoe"));
        assert_eq!(user_id_from_token("$pat-jdoe-241016101500000xABCD"), Some("jdoe"));
        assert_eq!(user_id_from_token("tok-xyz-999"), Some("xyz"));
        // Only the second segment counts, extra hyphens are ignored
        assert_eq!(user_id_from_token("a-b-c-d"), Some("b"));
        assert_eq!(user_id_from_token("a--c"), Some(""));
        assert_eq!(user_id_from_token("nohyphen"), None);
    }

    #[test]
    fn test_token_takes_precedence() {
        let cred = Credential::from_inputs("abc-jdoe-1", "someone", "pw");
        assert_eq!(cred, Credential::Token("abc-jdoe-1".to_string()));
        assert_eq!(cred.kind(), CredentialKind::Token);
    }

    #[test]
    fn test_whitespace_token_still_takes_token_path() {
        let cred = Credential::from_inputs("  ", "jdoe", "secret");
        assert_eq!(cred, Credential::Token(String::new()));
        // ...which then has no user id to connect with
        assert_eq!(user_id_from_token(""), None);

        let cred = Credential::from_inputs(" abc-jdoe-1\n", "jdoe", "secret");
        assert_eq!(cred, Credential::Token("abc-jdoe-1".to_string()));
    }

    #[test]
    fn test_empty_token_uses_password() {
        let cred = Credential::from_inputs("", " jdoe ", "secret");
        assert_eq!(
            cred,
            Credential::Password {
                username: "jdoe".to_string(),
                password: "secret".to_string()
            }
        );
        assert_eq!(cred.kind(), CredentialKind::Password);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let token = format!("{:?}", Credential::Token("abc-jdoe-1".to_string()));
        assert!(!token.contains("jdoe"));
        let pw = format!("{:?}", Credential::from_inputs("", "jdoe", "hunter2"));
        assert!(pw.contains("jdoe"));
        assert!(!pw.contains("hunter2"));
    }
}
