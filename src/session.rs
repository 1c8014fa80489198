use std::sync::Arc;

use tokio::sync::RwLock;

/// Bearer token held on the dashboard side of the API.
///
/// Cloning shares the same slot, so the pollers, the API client and the
/// `/session` handlers all observe the same login state.
#[derive(Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(initial.and_then(normalize))),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Replace the token. A blank token logs the session out.
    pub async fn set(&self, token: &str) {
        *self.token.write().await = normalize(token.to_owned());
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }
}

fn normalize(token: String) -> Option<String> {
    let trimmed = token.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
