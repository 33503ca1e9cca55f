use std::sync::Arc;

use tokio::sync::RwLock;

pub mod claims;
pub mod store;

/// The single in-memory slot for the current access token. Written only by
/// the session layer, read by the HTTP client when it signs outgoing
/// requests.
#[derive(Clone, Default)]
pub struct TokenCell(Arc<RwLock<Option<String>>>);

impl TokenCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn get(&self) -> Option<String> {
        self.0.read().await.clone()
    }

    pub(crate) async fn set(&self, token: String) {
        *self.0.write().await = Some(token);
    }

    pub(crate) async fn clear(&self) {
        *self.0.write().await = None;
    }
}

impl std::fmt::Debug for TokenCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCell").finish()
    }
}
