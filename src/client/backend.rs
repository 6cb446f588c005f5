use async_trait::async_trait;
use serde_json::Value;

use crate::error::AdminError;
use crate::model::{Ack, ListPage, MutationIntent};

/// One list call: endpoint path plus its query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub path: String,
    pub page: u32,
    pub limit: u32,
    pub params: Vec<(String, String)>,
}

impl ListRequest {
    pub fn new(path: impl Into<String>, page: u32, limit: u32) -> Self {
        Self {
            path: path.into(),
            page: page.max(1),
            limit: limit.max(1),
            params: Vec::new(),
        }
    }

    /// Add a parameter; blank values are left out of the request
    pub fn param(mut self, key: &str, value: impl AsRef<str>) -> Self {
        let value = value.as_ref().trim();
        if !value.is_empty() {
            self.params.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        pairs.extend(self.params.iter().cloned());
        pairs
    }
}

/// The REST backend as seen by list pages
///
/// Implementations interpret every response through the success/failure
/// envelope and report problems as [`AdminError`].
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list(&self, request: &ListRequest) -> Result<ListPage<Value>, AdminError>;
    async fn mutate(&self, intent: &MutationIntent) -> Result<Ack, AdminError>;
}
