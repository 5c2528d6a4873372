use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const OPENBIS_VERSION_KEY: &str = "openbis-version";
const API_VERSION_KEY: &str = "api-version";
const PAT_MAX_VALIDITY_KEY: &str = "personal-access-tokens-max-validity-period";

/// Server metadata from `getServerInformation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInformation {
    pub entries: BTreeMap<String, String>,
}

impl ServerInformation {
    pub fn from_map(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn openbis_version(&self) -> &str {
        self.get(OPENBIS_VERSION_KEY).unwrap_or("unknown")
    }

    pub fn api_version(&self) -> &str {
        self.get(API_VERSION_KEY).unwrap_or("unknown")
    }

    /// Longest PAT lifetime the server accepts, in seconds, when advertised
    pub fn pat_max_validity_secs(&self) -> Option<i64> {
        self.get(PAT_MAX_VALIDITY_KEY).and_then(|v| v.parse().ok())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions() {
        let json = r#"{"api-version":"3.6","openbis-version":"20.10.9","personal-access-tokens-max-validity-period":"31536000"}"#;
        let info = ServerInformation::from_map(serde_json::from_str(json).unwrap());
        assert_eq!(info.openbis_version(), "20.10.9");
        assert_eq!(info.api_version(), "3.6");
        assert_eq!(info.pat_max_validity_secs(), Some(31_536_000));
    }

    #[test]
    fn test_missing_versions() {
        let info = ServerInformation::default();
        assert_eq!(info.openbis_version(), "unknown");
        assert_eq!(info.pat_max_validity_secs(), None);
    }
}
