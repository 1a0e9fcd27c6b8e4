use std::fmt;

use serde_json::{Map, Value};

/// Identifier of a backend record.
///
/// Collections served by json-server style backends mix numeric and string
/// ids, so both are accepted and kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads an id out of a JSON value, if it is a string or a number.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self(text.clone())),
            Value::Number(number) => Some(Self(number.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed view over an entry of the `users` collection.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: RecordId,
    pub email: String,
    /// Every other key of the entry.
    pub fields: Map<String, Value>,
}

impl UserRecord {
    /// Builds the view from a raw backend entry; entries lacking an id or an
    /// email cannot be matched against a session and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let id = object.get("id").and_then(RecordId::from_json)?;
        let email = object.get("email")?.as_str()?.to_string();
        let mut fields = object.clone();
        fields.remove("id");
        fields.remove("email");
        Some(Self { id, email, fields })
    }

    /// The entry as a flat JSON object, id and email included.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.fields.clone();
        map.insert("id".into(), Value::String(self.id.to_string()));
        map.insert("email".into(), Value::String(self.email.clone()));
        map
    }

    pub fn matches_email(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.to_lowercase()
    }
}
