use chrono::Duration;

use crate::repositories::{
    AuthorizationCodeStore, ClientRegistry, ConsentStore, OwnerRegistry, TokenBindingStore,
    TokenStore,
};

/// Token lifetimes and issuer identity applied at issuance time
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    /// `https://{hostname}:{port}` of this server
    pub issuer: String,
    pub access_duration: Duration,
    pub refresh_duration: Duration,
    pub client_secret_duration: Duration,
}

/// The authorization engine: one value owning every store
///
/// Handlers receive the engine through shared state; nothing in the engine
/// is a global. All stores are cheaply cloneable handles onto shared state.
#[derive(Clone)]
pub struct Engine {
    pub clients: ClientRegistry,
    pub owners: OwnerRegistry,
    pub codes: AuthorizationCodeStore,
    pub tokens: TokenStore,
    pub bindings: TokenBindingStore,
    pub consents: ConsentStore,
    pub policy: TokenPolicy,
}

impl Engine {
    pub fn new(policy: TokenPolicy) -> Self {
        Self {
            clients: ClientRegistry::new(),
            owners: OwnerRegistry::new(),
            codes: AuthorizationCodeStore::new(),
            tokens: TokenStore::new(),
            bindings: TokenBindingStore::new(),
            consents: ConsentStore::new(),
            policy,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_engine() -> Engine {
    Engine::new(TokenPolicy {
        issuer: "https://localhost:3000".to_string(),
        access_duration: Duration::hours(1),
        refresh_duration: Duration::hours(24),
        client_secret_duration: Duration::hours(1),
    })
}
