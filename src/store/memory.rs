use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MemberAdded, Store, StoreError};
use crate::schemas::{Expense, Friend, Group};

#[derive(Debug, Default)]
struct Collections {
    friends: Vec<Friend>,
    groups: Vec<Group>,
    expenses: Vec<Expense>,
}

/// Keeps everything in process memory, in insertion order. Used when no
/// MongoDB URI is configured and by the tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_friends(&self) -> Result<Vec<Friend>, StoreError> {
        Ok(self.collections.read().await.friends.clone())
    }

    async fn get_friend(&self, id: &str) -> Result<Option<Friend>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.friends.iter().find(|f| f.id == id).cloned())
    }

    async fn insert_friend(&self, friend: &Friend) -> Result<(), StoreError> {
        self.collections.write().await.friends.push(friend.clone());
        Ok(())
    }

    async fn delete_friend(&self, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let before = collections.friends.len();
        collections.friends.retain(|f| f.id != id);
        Ok(collections.friends.len() < before)
    }

    async fn friend_in_use(&self, id: &str) -> Result<bool, StoreError> {
        let collections = self.collections.read().await;
        let in_group = collections.groups.iter().any(|g| g.has_member(id));
        let paid = collections
            .expenses
            .iter()
            .flat_map(|e| &e.payments)
            .any(|p| p.friend.id == id);
        Ok(in_group || paid)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        Ok(self.collections.read().await.groups.clone())
    }

    async fn get_group(&self, id: &str) -> Result<Option<Group>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn insert_group(&self, group: &Group) -> Result<(), StoreError> {
        self.collections.write().await.groups.push(group.clone());
        Ok(())
    }

    async fn delete_group(&self, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let before = collections.groups.len();
        collections.groups.retain(|g| g.id != id);
        collections.expenses.retain(|e| e.group_id != id);
        Ok(collections.groups.len() < before)
    }

    async fn add_member(
        &self,
        group_id: &str,
        friend: &Friend,
    ) -> Result<MemberAdded, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(group) = collections.groups.iter_mut().find(|g| g.id == group_id) else {
            return Ok(MemberAdded::GroupMissing);
        };
        if group.has_member(&friend.id) {
            return Ok(MemberAdded::AlreadyMember);
        }
        if group.members.iter().any(|m| m.name == friend.name) {
            return Ok(MemberAdded::NameTaken);
        }
        group.members.push(friend.clone());
        Ok(MemberAdded::Added)
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<(), StoreError> {
        self.collections.write().await.expenses.push(expense.clone());
        Ok(())
    }

    async fn expenses_for_group(&self, group_id: &str) -> Result<Vec<Expense>, StoreError> {
        let collections = self.collections.read().await;
        let mut expenses: Vec<Expense> = collections
            .expenses
            .iter()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        expenses.sort_by_key(|e| e.created_at);
        Ok(expenses)
    }
}
