use serde::{Deserialize, Serialize};

/// A nested entity as serialized by the openBIS JSON layer.
///
/// The server writes each object once and replaces later occurrences of the
/// same instance with its numeric `@id`, so a nested field is either the
/// full object or a back-reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef<T> {
    Object(T),
    Reference(i64),
}

impl<T> EntityRef<T> {
    pub fn as_object(&self) -> Option<&T> {
        match self {
            EntityRef::Object(obj) => Some(obj),
            EntityRef::Reference(_) => None,
        }
    }
}

/// Wrapper used by openBIS for every `*PermId` / `*Identifier` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermIdRef {
    #[serde(rename = "permId", alias = "identifier")]
    pub value: String,
}
