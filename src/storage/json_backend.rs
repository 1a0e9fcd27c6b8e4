use std::{fs, path::PathBuf};

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::core::utils::{ensure_dir, write_atomic};
use crate::domain::RecordId;
use crate::errors::{ProfileError, Result};

use super::{apply_patch, DataService};

/// json-server style database: one JSON object whose keys are collection
/// names and whose values are arrays of records.
#[derive(Debug, Clone)]
pub struct JsonDataStore {
    path: PathBuf,
}

impl JsonDataStore {
    /// Opens the database at `path`, creating it with an empty `users`
    /// collection when the file does not exist yet.
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let store = Self { path };
        if !store.path.exists() {
            let mut database = Map::new();
            database.insert("users".into(), json!([]));
            store.write_database(&database)?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Appends `record` to `collection`, assigning an id when it has none.
    pub fn insert(&mut self, collection: &str, record: Value) -> Result<Value> {
        let Value::Object(mut record) = record else {
            return Err(ProfileError::InvalidInput(
                "records must be JSON objects".into(),
            ));
        };
        if !record.contains_key("id") {
            record.insert("id".into(), Value::String(Uuid::new_v4().simple().to_string()));
        }
        let mut database = self.read_database()?;
        let entries = database
            .entry(collection.to_string())
            .or_insert_with(|| json!([]));
        let Some(entries) = entries.as_array_mut() else {
            return Err(ProfileError::Storage(format!(
                "collection `{}` is not an array",
                collection
            )));
        };
        entries.push(Value::Object(record.clone()));
        self.write_database(&database)?;
        tracing::debug!(collection, path = %self.path.display(), "record inserted");
        Ok(Value::Object(record))
    }

    fn read_database(&self) -> Result<Map<String, Value>> {
        let data = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&data)? {
            Value::Object(database) => Ok(database),
            _ => Err(ProfileError::Storage(format!(
                "`{}` does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_database(&self, database: &Map<String, Value>) -> Result<()> {
        let json = serde_json::to_string_pretty(database)?;
        write_atomic(&self.path, &json)
    }
}

impl DataService for JsonDataStore {
    fn read(&self, collection: &str) -> Result<Vec<Value>> {
        let mut database = self.read_database()?;
        match database.remove(collection) {
            Some(Value::Array(records)) => Ok(records),
            Some(_) => Err(ProfileError::Storage(format!(
                "collection `{}` is not an array",
                collection
            ))),
            None => Err(ProfileError::NotFound(format!("collection `{}`", collection))),
        }
    }

    fn update(
        &mut self,
        id: &RecordId,
        partial: &Map<String, Value>,
        collection: &str,
    ) -> Result<Value> {
        let mut database = self.read_database()?;
        let records = database
            .get_mut(collection)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| ProfileError::NotFound(format!("collection `{}`", collection)))?;
        let updated = apply_patch(records, id, partial, collection)?;
        self.write_database(&database)?;
        tracing::debug!(collection, id = %id, fields = partial.len(), "record updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn new_database_starts_with_empty_users() {
        let dir = tempdir().unwrap();
        let store = JsonDataStore::new(dir.path().join("data").join("db.json")).unwrap();
        assert!(store.path().exists());
        assert!(store.read("users").unwrap().is_empty());
        assert!(matches!(
            store.read("orders"),
            Err(ProfileError::NotFound(_))
        ));
    }

    #[test]
    fn insert_assigns_ids_and_update_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        let mut store = JsonDataStore::new(path.clone()).unwrap();

        let created = store
            .insert("users", json!({ "email": "ana@example.com", "city": "Lima" }))
            .unwrap();
        let id = RecordId::from_json(&created["id"]).expect("generated id");

        let mut partial = Map::new();
        partial.insert("city".into(), json!("Cusco"));
        store.update(&id, &partial, "users").unwrap();

        let reopened = JsonDataStore::new(path).unwrap();
        let users = reopened.read("users").unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["city"], json!("Cusco"));
        assert_eq!(users[0]["email"], json!("ana@example.com"));
    }

    #[test]
    fn existing_ids_are_kept() {
        let dir = tempdir().unwrap();
        let mut store = JsonDataStore::new(dir.path().join("db.json")).unwrap();
        let created = store.insert("users", json!({ "id": 5, "email": "a@b.co" })).unwrap();
        assert_eq!(created["id"], json!(5));
        assert!(store.insert("users", json!("nope")).is_err());
    }

    #[test]
    fn corrupt_files_are_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        let store = JsonDataStore::new(path).unwrap();
        assert!(matches!(store.read("users"), Err(ProfileError::Storage(_))));
    }
}
