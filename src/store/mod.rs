//! Persistence for friends, groups and expenses.

use async_trait::async_trait;
use thiserror::Error;

use crate::schemas::{Expense, Friend, Group};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("couldn't encode document: {0}")]
    Encode(#[from] bson::ser::Error),
}

/// What happened to an `add_member` call. The membership checks run in the
/// same write as the append, so two concurrent calls cannot both succeed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberAdded {
    Added,
    GroupMissing,
    AlreadyMember,
    NameTaken,
}

/// Everything the API needs from storage. Writes are last-write-wins.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_friends(&self) -> Result<Vec<Friend>, StoreError>;

    async fn get_friend(&self, id: &str) -> Result<Option<Friend>, StoreError>;

    async fn insert_friend(&self, friend: &Friend) -> Result<(), StoreError>;

    /// Returns false when no friend had that id.
    async fn delete_friend(&self, id: &str) -> Result<bool, StoreError>;

    /// Whether the friend belongs to a group or paid for an expense.
    async fn friend_in_use(&self, id: &str) -> Result<bool, StoreError>;

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError>;

    async fn get_group(&self, id: &str) -> Result<Option<Group>, StoreError>;

    async fn insert_group(&self, group: &Group) -> Result<(), StoreError>;

    /// Removes the group together with its expenses. Returns false when no
    /// group had that id.
    async fn delete_group(&self, id: &str) -> Result<bool, StoreError>;

    /// Appends a member unless the group already has that friend or another
    /// member with the same name.
    async fn add_member(
        &self,
        group_id: &str,
        friend: &Friend,
    ) -> Result<MemberAdded, StoreError>;

    async fn insert_expense(&self, expense: &Expense) -> Result<(), StoreError>;

    /// All expenses of a group, oldest first.
    async fn expenses_for_group(&self, group_id: &str) -> Result<Vec<Expense>, StoreError>;
}
