//! Persistence trait for group documents.

use async_trait::async_trait;

use crate::{Result, types::GroupRecord};

/// Document store holding every group the bot serves.
///
/// Writes replace the whole record. Concurrent writers to the same group
/// are last-write-wins.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>>;
    async fn get_group(&self, id: &str) -> Result<Option<GroupRecord>>;
    /// Insert or replace a group.
    async fn save_group(&self, group: &GroupRecord) -> Result<()>;
}
