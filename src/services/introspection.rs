use crate::dto::oauth::IntrospectionResponse;
use crate::engine::Engine;
use crate::models::{TokenHint, TOKEN_TYPE_BEARER};

/// Assembles RFC 7662 responses by joining the token store with the client
/// and owner registries
#[derive(Clone)]
pub struct IntrospectionService {
    engine: Engine,
}

impl IntrospectionService {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Introspect a presented token
    ///
    /// An invalid, expired or revoked token yields `{ "active": false }` and
    /// nothing else. Fields whose source cannot be resolved are omitted.
    pub async fn introspect(&self, hint: &TokenHint) -> IntrospectionResponse {
        let Some(token) = self.engine.tokens.validate(hint).await else {
            return IntrospectionResponse::inactive();
        };

        let mut response = IntrospectionResponse {
            active: true,
            client_id: Some(token.client_id.to_string()),
            exp: Some(token.expires_at.timestamp()),
            iat: Some(token.issued_at.timestamp()),
            nbf: Some(token.not_before.timestamp()),
            scope: if token.scope.is_empty() {
                None
            } else {
                Some(token.scope.clone())
            },
            sub: Some(token.owner_id.to_string()),
            token_type: Some(TOKEN_TYPE_BEARER.to_string()),
            iss: Some(self.engine.policy.issuer.clone()),
            jti: Some(token.token.clone()),
            ..IntrospectionResponse::default()
        };

        let client = self.engine.clients.get(token.client_id).await;
        if let Some(client) = &client {
            response.aud = client.client_uri.clone();
        }

        // a client-credentials token names the client itself as its owner
        if token.owner_id == token.client_id {
            response.username = client.map(|c| c.name);
        } else if let Some(owner) = self.engine.owners.get_by_id(token.owner_id).await {
            response.username = Some(owner.username);
        }

        response
    }
}
