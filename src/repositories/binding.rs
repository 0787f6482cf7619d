use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{TokenHint, TokenHolder};

#[derive(Debug, Clone, Default)]
struct Binding {
    access: Option<TokenHint>,
    refresh: Option<TokenHint>,
}

/// Per-(holder, client) record of the currently live token pair
///
/// At most one access hint and one refresh hint exist per pair. Bindings are
/// a convenience for token reuse, not an authority over validity: a token
/// evicted from its binding stays valid until it expires or is revoked.
#[derive(Clone, Default)]
pub struct TokenBindingStore {
    bindings: Arc<RwLock<HashMap<(TokenHolder, Uuid), Binding>>>,
}

impl TokenBindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_access(&self, holder: TokenHolder, client_id: Uuid) -> Option<TokenHint> {
        self.bindings
            .read()
            .await
            .get(&(holder, client_id))
            .and_then(|b| b.access.clone())
    }

    pub async fn get_refresh(&self, holder: TokenHolder, client_id: Uuid) -> Option<TokenHint> {
        self.bindings
            .read()
            .await
            .get(&(holder, client_id))
            .and_then(|b| b.refresh.clone())
    }

    /// Bind the provided hints; a `None` leaves the existing entry untouched
    pub async fn put(
        &self,
        holder: TokenHolder,
        client_id: Uuid,
        access: Option<TokenHint>,
        refresh: Option<TokenHint>,
    ) {
        let mut bindings = self.bindings.write().await;
        let binding = bindings.entry((holder, client_id)).or_default();
        if access.is_some() {
            binding.access = access;
        }
        if refresh.is_some() {
            binding.refresh = refresh;
        }
    }

    pub async fn delete_access(&self, holder: TokenHolder, client_id: Uuid) {
        let mut bindings = self.bindings.write().await;
        if let Some(binding) = bindings.get_mut(&(holder, client_id)) {
            binding.access = None;
        }
    }

    pub async fn delete_refresh(&self, holder: TokenHolder, client_id: Uuid) {
        let mut bindings = self.bindings.write().await;
        if let Some(binding) = bindings.get_mut(&(holder, client_id)) {
            binding.refresh = None;
        }
    }

    pub async fn delete_both(&self, holder: TokenHolder, client_id: Uuid) {
        self.bindings.write().await.remove(&(holder, client_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = TokenBindingStore::new();
        let holder = TokenHolder::Owner(Uuid::new_v4());
        let client_id = Uuid::new_v4();

        store
            .put(
                holder,
                client_id,
                Some(TokenHint::access("at")),
                Some(TokenHint::refresh("rt")),
            )
            .await;

        assert_eq!(store.get_access(holder, client_id).await.unwrap().token, "at");
        assert_eq!(store.get_refresh(holder, client_id).await.unwrap().token, "rt");
    }

    #[tokio::test]
    async fn test_put_overwrites_only_provided_flavours() {
        let store = TokenBindingStore::new();
        let holder = TokenHolder::Owner(Uuid::new_v4());
        let client_id = Uuid::new_v4();

        store
            .put(
                holder,
                client_id,
                Some(TokenHint::access("at1")),
                Some(TokenHint::refresh("rt1")),
            )
            .await;
        store
            .put(holder, client_id, None, Some(TokenHint::refresh("rt2")))
            .await;

        assert_eq!(store.get_access(holder, client_id).await.unwrap().token, "at1");
        assert_eq!(store.get_refresh(holder, client_id).await.unwrap().token, "rt2");
    }

    #[tokio::test]
    async fn test_holder_variants_are_distinct_keys() {
        let store = TokenBindingStore::new();
        let id = Uuid::new_v4();
        let client_id = Uuid::new_v4();

        store
            .put(
                TokenHolder::Owner(id),
                client_id,
                Some(TokenHint::access("owner-at")),
                None,
            )
            .await;

        assert!(store
            .get_access(TokenHolder::Client(id), client_id)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_flavours() {
        let store = TokenBindingStore::new();
        let holder = TokenHolder::Client(Uuid::new_v4());
        let client_id = Uuid::new_v4();

        store
            .put(
                holder,
                client_id,
                Some(TokenHint::access("at")),
                Some(TokenHint::refresh("rt")),
            )
            .await;

        store.delete_refresh(holder, client_id).await;
        assert!(store.get_refresh(holder, client_id).await.is_none());
        assert!(store.get_access(holder, client_id).await.is_some());

        store.delete_both(holder, client_id).await;
        assert!(store.get_access(holder, client_id).await.is_none());
    }
}
