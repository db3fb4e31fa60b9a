use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use tokio::sync::RwLock;

struct Session {
    token: Secret<String>,
    seller_id: Option<String>,
}

/// The signed-in user's token and selected seller. Cloning shares the same
/// session.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session with a token obtained elsewhere.
    pub async fn init(&self, token: impl Into<String>, seller_id: Option<String>) {
        *self.inner.write().await = Some(Session {
            token: Secret::new(token.into()),
            seller_id,
        });
    }

    pub async fn clear(&self) {
        if self.inner.write().await.take().is_some() {
            tracing::info!("Session cleared");
        }
    }

    pub async fn is_active(&self) -> bool {
        self.inner.read().await.is_some()
    }

    pub async fn set_seller(&self, seller_id: impl Into<String>) {
        if let Some(session) = self.inner.write().await.as_mut() {
            session.seller_id = Some(seller_id.into());
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|s| s.token.expose_secret().clone())
    }

    pub async fn seller_id(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .and_then(|s| s.seller_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_and_clear_lifecycle() {
        let session = SessionStore::new();
        assert!(!session.is_active().await);

        session.init("tok", Some("s1".into())).await;
        assert_eq!(session.token().await.as_deref(), Some("tok"));
        assert_eq!(session.seller_id().await.as_deref(), Some("s1"));

        let shared = session.clone();
        shared.set_seller("s2").await;
        assert_eq!(session.seller_id().await.as_deref(), Some("s2"));

        session.clear().await;
        assert!(!shared.is_active().await);
        assert_eq!(shared.token().await, None);
    }
}
