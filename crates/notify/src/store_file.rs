//! JSON file-backed group store with atomic writes.

use std::path::{Path, PathBuf};

use {
    async_trait::async_trait,
    tokio::{fs, sync::Mutex},
};

use crate::{Result, error::Context, store::GroupStore, types::GroupRecord};

/// All groups in a single `groups.json` array.
pub struct FileGroupStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileGroupStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Store at `<data_dir>/groups.json`.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("groups.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<GroupRecord>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path).await?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    /// Atomic write: write to temp, rename over target, keep `.bak`.
    async fn atomic_write(&self, groups: &[GroupRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(groups)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, json.as_bytes()).await?;

        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let bak = self.path.with_extension("json.bak");
            let _ = fs::copy(&self.path, &bak).await;
        }

        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl GroupStore for FileGroupStore {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>> {
        self.read_all().await
    }

    async fn get_group(&self, id: &str) -> Result<Option<GroupRecord>> {
        Ok(self.read_all().await?.into_iter().find(|g| g.id == id))
    }

    async fn save_group(&self, group: &GroupRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut groups = self.read_all().await?;
        match groups.iter().position(|g| g.id == group.id) {
            Some(pos) => groups[pos] = group.clone(),
            None => groups.push(group.clone()),
        }
        self.atomic_write(&groups).await
    }
}
