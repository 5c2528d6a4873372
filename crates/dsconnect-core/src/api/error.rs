use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Unauthorized - check username/password or token")]
    Unauthorized,

    #[error("Malformed token - expected <prefix>-<userId>-<suffix>")]
    InvalidToken,

    #[error("Session is not active - the token may be expired or revoked")]
    InactiveSession,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("openBIS error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut = (0..=MAX_ERROR_BODY_LENGTH)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status {
            401 | 403 => ApiError::Unauthorized,
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Map a JSON-RPC error object. openBIS reports bad credentials and dead
    /// sessions as generic errors, so the message text is inspected.
    pub fn from_rpc(code: i64, message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("session token") && (lower.contains("expired") || lower.contains("invalid")) {
            ApiError::InactiveSession
        } else if lower.contains("authorization failure") || lower.contains("authentication failure") {
            ApiError::Unauthorized
        } else {
            ApiError::Rpc {
                code,
                message: Self::truncate_body(message),
            }
        }
    }
}
