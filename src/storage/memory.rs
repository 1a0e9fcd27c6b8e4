use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::domain::RecordId;
use crate::errors::{ProfileError, Result};

use super::{apply_patch, DataService};

/// One call received by [`MemoryDataService::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCall {
    pub collection: String,
    pub id: RecordId,
    pub partial: Map<String, Value>,
    pub applied: bool,
}

/// In-memory collections with a log of update calls and failure injection.
#[derive(Debug, Default)]
pub struct MemoryDataService {
    collections: HashMap<String, Vec<Value>>,
    calls: Vec<UpdateCall>,
    failing_updates: u32,
    failing_reads: bool,
}

impl MemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: &str, records: Vec<Value>) -> Self {
        self.collections.insert(name.to_string(), records);
        self
    }

    /// Makes the next `count` update calls fail without touching the data.
    pub fn fail_next_updates(&mut self, count: u32) {
        self.failing_updates = count;
    }

    pub fn fail_reads(&mut self, failing: bool) {
        self.failing_reads = failing;
    }

    /// Every update call received, failed ones included.
    pub fn calls(&self) -> &[UpdateCall] {
        &self.calls
    }

    pub fn collection(&self, name: &str) -> Option<&[Value]> {
        self.collections.get(name).map(Vec::as_slice)
    }
}

impl DataService for MemoryDataService {
    fn read(&self, collection: &str) -> Result<Vec<Value>> {
        if self.failing_reads {
            return Err(ProfileError::Storage("simulated read failure".into()));
        }
        self.collections
            .get(collection)
            .cloned()
            .ok_or_else(|| ProfileError::NotFound(format!("collection `{}`", collection)))
    }

    fn update(
        &mut self,
        id: &RecordId,
        partial: &Map<String, Value>,
        collection: &str,
    ) -> Result<Value> {
        let mut call = UpdateCall {
            collection: collection.to_string(),
            id: id.clone(),
            partial: partial.clone(),
            applied: false,
        };
        if self.failing_updates > 0 {
            self.failing_updates -= 1;
            self.calls.push(call);
            return Err(ProfileError::Storage("simulated update failure".into()));
        }
        let result = match self.collections.get_mut(collection) {
            Some(records) => apply_patch(records, id, partial, collection),
            None => Err(ProfileError::NotFound(format!("collection `{}`", collection))),
        };
        call.applied = result.is_ok();
        self.calls.push(call);
        result
    }
}
