use parking_lot::RwLock;

/// Where the session token lives between requests
pub trait AuthStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: &str);
    fn clear_token(&self);
}

/// Process-local token storage
#[derive(Debug, Default)]
pub struct MemoryAuthStore {
    token: RwLock<Option<String>>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        store.set_token(token);
        store
    }
}

impl AuthStore for MemoryAuthStore {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Blank tokens are treated as a logout
    fn set_token(&self, token: &str) {
        let token = token.trim();
        *self.token.write() = if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        };
    }

    fn clear_token(&self) {
        *self.token.write() = None;
    }
}
