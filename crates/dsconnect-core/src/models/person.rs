use serde::{Deserialize, Serialize};

use super::EntityRef;

/// Home space of a person; only the code is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceCode {
    pub code: String,
}

/// An openBIS user as returned by `getPersons`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub space: Option<EntityRef<SpaceCode>>,
}

impl Person {
    /// Code of the person's home space, if one is assigned
    pub fn home_space(&self) -> Option<&str> {
        self.space
            .as_ref()
            .and_then(|s| s.as_object())
            .map(|s| s.code.as_str())
    }

    pub fn full_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{} {}", first, last).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_person() {
        let json = r#"{
            "@type": "as.dto.person.Person",
            "@id": 1,
            "permId": {"@type": "as.dto.person.id.PersonPermId", "permId": "jdoe"},
            "userId": "jdoe",
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane.doe@bam.de",
            "active": true,
            "space": {"@type": "as.dto.space.Space", "@id": 2, "code": "JDOE"}
        }"#;
        let person: Person = serde_json::from_str(json).expect("Failed to parse person JSON");
        assert_eq!(person.user_id, "jdoe");
        assert_eq!(person.full_name(), "Jane Doe");
        assert_eq!(person.home_space(), Some("JDOE"));
    }

    #[test]
    fn test_person_without_space() {
        let person: Person = serde_json::from_str(r#"{"userId":"system","firstName":null,"lastName":null,"email":null}"#)
            .expect("Failed to parse person JSON");
        assert_eq!(person.home_space(), None);
        assert_eq!(person.full_name(), "");
    }
}
