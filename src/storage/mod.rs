pub mod json_backend;
pub mod memory;

use serde_json::{Map, Value};

use crate::domain::RecordId;
use crate::errors::{ProfileError, Result};

/// Generic CRUD-style access to named collections of JSON records.
pub trait DataService: Send + Sync {
    /// Fetches every record of `collection`.
    fn read(&self, collection: &str) -> Result<Vec<Value>>;

    /// Merges `partial` into the record identified by `id` and returns the
    /// updated record. Keys absent from `partial` are left untouched.
    fn update(
        &mut self,
        id: &RecordId,
        partial: &Map<String, Value>,
        collection: &str,
    ) -> Result<Value>;
}

/// Applies a partial update to the matching record of `records`.
pub(crate) fn apply_patch(
    records: &mut [Value],
    id: &RecordId,
    partial: &Map<String, Value>,
    collection: &str,
) -> Result<Value> {
    let target = records
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find(|record| record.get("id").and_then(RecordId::from_json).as_ref() == Some(id))
        .ok_or_else(|| {
            ProfileError::NotFound(format!("record `{}` in collection `{}`", id, collection))
        })?;
    for (key, value) in partial {
        if key == "id" {
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
    Ok(Value::Object(target.clone()))
}

pub use json_backend::JsonDataStore;
pub use memory::{MemoryDataService, UpdateCall};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_merges_keys_and_keeps_the_id() {
        let mut records = vec![
            json!({ "id": 1, "name": "Ana", "city": "Lima" }),
            json!({ "id": "2", "name": "Luis" }),
        ];
        let partial = json!({ "id": 99, "city": "Cusco", "region": "Cusco" });
        let updated = apply_patch(
            &mut records,
            &RecordId::new("1"),
            partial.as_object().unwrap(),
            "users",
        )
        .unwrap();

        assert_eq!(
            updated,
            json!({ "id": 1, "name": "Ana", "city": "Cusco", "region": "Cusco" })
        );
        assert_eq!(records[0], updated);
        assert_eq!(records[1], json!({ "id": "2", "name": "Luis" }));
    }

    #[test]
    fn patch_reports_missing_records() {
        let mut records = vec![json!({ "id": 1 })];
        let err = apply_patch(&mut records, &RecordId::new("7"), &Map::new(), "users")
            .unwrap_err();
        assert!(matches!(err, ProfileError::NotFound(_)));
    }
}
