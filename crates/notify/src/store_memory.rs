//! In-memory store for tests and dry runs.

use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;

use crate::{Result, store::GroupStore, types::GroupRecord};

/// In-memory store backed by a `BTreeMap`, so listing order is stable.
pub struct InMemoryGroupStore {
    groups: Mutex<BTreeMap<String, GroupRecord>>,
}

impl InMemoryGroupStore {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_groups(groups: impl IntoIterator<Item = GroupRecord>) -> Self {
        Self {
            groups: Mutex::new(groups.into_iter().map(|g| (g.id.clone(), g)).collect()),
        }
    }
}

impl Default for InMemoryGroupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GroupStore for InMemoryGroupStore {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>> {
        let groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        Ok(groups.values().cloned().collect())
    }

    async fn get_group(&self, id: &str) -> Result<Option<GroupRecord>> {
        let groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        Ok(groups.get(id).cloned())
    }

    async fn save_group(&self, group: &GroupRecord) -> Result<()> {
        let mut groups = self.groups.lock().unwrap_or_else(|e| e.into_inner());
        groups.insert(group.id.clone(), group.clone());
        Ok(())
    }
}
