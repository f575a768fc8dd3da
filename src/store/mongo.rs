use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    Client, Collection, Database,
};

use super::{MemberAdded, Store, StoreError};
use crate::schemas::{Expense, Friend, Group};

#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(client.database(database)))
    }

    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn friends(&self) -> Collection<Friend> {
        self.database.collection("Friends")
    }

    fn groups(&self) -> Collection<Group> {
        self.database.collection("Groups")
    }

    fn expenses(&self) -> Collection<Expense> {
        self.database.collection("Expenses")
    }
}

async fn find_all<T>(collection: Collection<T>, filter: Document) -> Result<Vec<T>, StoreError>
where
    T: serde::de::DeserializeOwned + Unpin + Send + Sync,
{
    let cursor = collection.find(filter, None).await?;
    Ok(cursor.try_collect().await?)
}

#[async_trait]
impl Store for MongoStore {
    async fn list_friends(&self) -> Result<Vec<Friend>, StoreError> {
        find_all(self.friends(), doc! {}).await
    }

    async fn get_friend(&self, id: &str) -> Result<Option<Friend>, StoreError> {
        Ok(self.friends().find_one(doc! { "id": id }, None).await?)
    }

    async fn insert_friend(&self, friend: &Friend) -> Result<(), StoreError> {
        self.friends().insert_one(friend, None).await?;
        Ok(())
    }

    async fn delete_friend(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.friends().delete_one(doc! { "id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn friend_in_use(&self, id: &str) -> Result<bool, StoreError> {
        let groups = self
            .groups()
            .count_documents(doc! { "members.id": id }, None)
            .await?;
        if groups > 0 {
            return Ok(true);
        }
        let expenses = self
            .expenses()
            .count_documents(doc! { "payments.friend.id": id }, None)
            .await?;
        Ok(expenses > 0)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, StoreError> {
        find_all(self.groups(), doc! {}).await
    }

    async fn get_group(&self, id: &str) -> Result<Option<Group>, StoreError> {
        Ok(self.groups().find_one(doc! { "id": id }, None).await?)
    }

    async fn insert_group(&self, group: &Group) -> Result<(), StoreError> {
        self.groups().insert_one(group, None).await?;
        Ok(())
    }

    async fn delete_group(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.groups().delete_one(doc! { "id": id }, None).await?;
        self.expenses()
            .delete_many(doc! { "groupId": id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn add_member(
        &self,
        group_id: &str,
        friend: &Friend,
    ) -> Result<MemberAdded, StoreError> {
        // The membership checks live in the filter so the push is a single
        // atomic document update.
        let result = self
            .groups()
            .update_one(
                doc! {
                    "id": group_id,
                    "members.id": { "$ne": friend.id.as_str() },
                    "members.name": { "$ne": friend.name.as_str() },
                },
                doc! { "$push": { "members": bson::to_bson(friend)? } },
                None,
            )
            .await?;
        if result.matched_count > 0 {
            return Ok(MemberAdded::Added);
        }
        Ok(match self.get_group(group_id).await? {
            None => MemberAdded::GroupMissing,
            Some(group) if group.has_member(&friend.id) => MemberAdded::AlreadyMember,
            Some(_) => MemberAdded::NameTaken,
        })
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<(), StoreError> {
        self.expenses().insert_one(expense, None).await?;
        Ok(())
    }

    async fn expenses_for_group(&self, group_id: &str) -> Result<Vec<Expense>, StoreError> {
        let mut expenses = find_all(self.expenses(), doc! { "groupId": group_id }).await?;
        expenses.sort_by_key(|expense| expense.created_at);
        Ok(expenses)
    }
}
