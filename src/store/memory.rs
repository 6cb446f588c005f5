use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{generate_id, Id};
use crate::store::traits::{Collection, DocumentStore, SessionStore};

#[derive(Clone, Debug)]
struct Session {
    user_id: Id,
    issued_at: Instant,
}

/// In-memory backend store used by the mock server and the tests
#[derive(Debug, Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Value>>>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    /// Sessions older than this are rejected (12 hours)
    session_ttl: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ttl: Duration::from_secs(12 * 3600),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Number of documents per collection
    pub async fn counts(&self) -> HashMap<Collection, usize> {
        let collections = self.collections.read().await;
        Collection::ALL
            .iter()
            .map(|collection| {
                let count = collections.get(collection).map_or(0, Vec::len);
                (*collection, count)
            })
            .collect()
    }
}

fn document_id(document: &Value) -> Option<&str> {
    document.get("_id").and_then(Value::as_str)
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(&self, collection: Collection) -> Result<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn get_document(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.iter().find(|doc| document_id(doc) == Some(id)))
            .cloned())
    }

    async fn insert_document(&self, collection: Collection, document: Value) -> Result<Value> {
        let Value::Object(mut fields) = document else {
            return Err(anyhow!("{} documents must be JSON objects", collection.name()));
        };
        if !fields.get("_id").is_some_and(Value::is_string) {
            fields.insert("_id".to_string(), Value::String(generate_id()));
        }
        fields
            .entry("createdAt")
            .or_insert_with(|| Value::String(chrono::Utc::now().to_rfc3339()));
        let document = Value::Object(fields);

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();
        if documents
            .iter()
            .any(|doc| document_id(doc) == document_id(&document))
        {
            return Err(anyhow!(
                "duplicate id in {}: {:?}",
                collection.name(),
                document_id(&document)
            ));
        }
        documents.push(document.clone());
        Ok(document)
    }

    async fn update_document(
        &self,
        collection: Collection,
        id: &str,
        changes: Value,
    ) -> Result<Option<Value>> {
        let Value::Object(changes) = changes else {
            return Err(anyhow!("updates must be JSON objects"));
        };
        let mut collections = self.collections.write().await;
        let Some(document) = collections
            .get_mut(&collection)
            .and_then(|documents| documents.iter_mut().find(|doc| document_id(doc) == Some(id)))
        else {
            return Ok(None);
        };

        if let Value::Object(fields) = document {
            merge_fields(fields, changes);
            fields.insert(
                "updatedAt".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        Ok(Some(document.clone()))
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        let before = documents.len();
        documents.retain(|doc| document_id(doc) != Some(id));
        Ok(documents.len() != before)
    }
}

/// Top-level merge; `_id` is never overwritten
fn merge_fields(fields: &mut Map<String, Value>, changes: Map<String, Value>) {
    for (key, value) in changes {
        if key != "_id" {
            fields.insert(key, value);
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn issue_token(&self, user_id: &Id) -> Result<String> {
        let token = Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            token.clone(),
            Session {
                user_id: user_id.clone(),
                issued_at: Instant::now(),
            },
        );
        Ok(token)
    }

    async fn session_user(&self, token: &str) -> Result<Option<Id>> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(token) {
            Some(session) if session.issued_at.elapsed() > self.session_ttl => {
                sessions.remove(token);
                Ok(None)
            }
            Some(session) => Ok(Some(session.user_id.clone())),
            None => Ok(None),
        }
    }

    async fn revoke_token(&self, token: &str) -> Result<bool> {
        Ok(self.sessions.write().await.remove(token).is_some())
    }
}
