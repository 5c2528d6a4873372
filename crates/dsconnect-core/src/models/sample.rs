use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityRef, PermIdRef};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleType {
    pub code: String,
}

/// An openBIS object (sample), e.g. an experimental step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "permId")]
    pub perm_id: Option<PermIdRef>,
    pub identifier: Option<PermIdRef>,
    pub code: String,
    #[serde(rename = "type", default)]
    pub sample_type: Option<EntityRef<SampleType>>,
    #[serde(rename = "registrationDate", with = "chrono::serde::ts_milliseconds_option", default)]
    pub registration_date: Option<DateTime<Utc>>,
}

impl Sample {
    pub fn display_identifier(&self) -> &str {
        self.identifier
            .as_ref()
            .map(|i| i.value.as_str())
            .unwrap_or(&self.code)
    }

    pub fn type_code(&self) -> Option<&str> {
        self.sample_type
            .as_ref()
            .and_then(|t| t.as_object())
            .map(|t| t.code.as_str())
    }

    /// One-line listing: identifier, then type and registration date if known
    pub fn summary(&self) -> String {
        let mut details = Vec::new();
        if let Some(code) = self.type_code() {
            details.push(code.to_string());
        }
        if let Some(date) = self.registration_date {
            details.push(format!("registered {}", date.format("%Y-%m-%d")));
        }
        if details.is_empty() {
            self.display_identifier().to_string()
        } else {
            format!("{} ({})", self.display_identifier(), details.join(", "))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub code: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample() {
        let json = r#"{
            "@type": "as.dto.sample.Sample",
            "permId": {"permId": "20241016101500000-42"},
            "identifier": {"identifier": "/JDOE/PROJ/EXP_STEP_1"},
            "code": "EXP_STEP_1",
            "type": {"@type": "as.dto.sample.SampleType", "code": "EXPERIMENTAL_STEP"},
            "registrationDate": 1729073700000
        }"#;
        let sample: Sample = serde_json::from_str(json).expect("Failed to parse sample JSON");
        assert_eq!(sample.display_identifier(), "/JDOE/PROJ/EXP_STEP_1");
        assert_eq!(sample.type_code(), Some("EXPERIMENTAL_STEP"));
        assert!(sample.registration_date.is_some());
        assert_eq!(
            sample.summary(),
            "/JDOE/PROJ/EXP_STEP_1 (EXPERIMENTAL_STEP, registered 2024-10-16)"
        );
    }

    #[test]
    fn test_sample_identifier_falls_back_to_code() {
        let sample: Sample = serde_json::from_str(r#"{"code":"S1","type":3}"#).unwrap();
        assert_eq!(sample.display_identifier(), "S1");
        assert_eq!(sample.type_code(), None);
        assert_eq!(sample.summary(), "S1");
    }
}
