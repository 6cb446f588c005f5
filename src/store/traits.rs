use anyhow::Result;
use serde_json::Value;

use crate::model::Id;

/// Document collections of the loyalty backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Businesses,
    Rewards,
    Redeems,
    BusinessDetails,
    History,
    Receipts,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Users,
        Collection::Businesses,
        Collection::Rewards,
        Collection::Redeems,
        Collection::BusinessDetails,
        Collection::History,
        Collection::Receipts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Businesses => "businesses",
            Collection::Rewards => "rewards",
            Collection::Redeems => "redeems",
            Collection::BusinessDetails => "business_details",
            Collection::History => "history",
            Collection::Receipts => "receipts",
        }
    }
}

/// Schemaless documents keyed by `_id`, kept in insertion order
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self, collection: Collection) -> Result<Vec<Value>>;
    async fn get_document(&self, collection: Collection, id: &str) -> Result<Option<Value>>;
    /// Store a new document; `_id` and `createdAt` are filled in when absent
    async fn insert_document(&self, collection: Collection, document: Value) -> Result<Value>;
    /// Merge the top-level keys of `changes` into a document
    async fn update_document(
        &self,
        collection: Collection,
        id: &str,
        changes: Value,
    ) -> Result<Option<Value>>;
    async fn delete_document(&self, collection: Collection, id: &str) -> Result<bool>;
}

/// Bearer tokens issued by `/login`
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn issue_token(&self, user_id: &Id) -> Result<String>;
    async fn session_user(&self, token: &str) -> Result<Option<Id>>;
    async fn revoke_token(&self, token: &str) -> Result<bool>;
}

pub trait Store: DocumentStore + SessionStore {}

impl<T> Store for T where T: DocumentStore + SessionStore {}
