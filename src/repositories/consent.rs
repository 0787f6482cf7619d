use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{ConsentToken, PendingAuthorization, PendingConsent};
use crate::utils::random;

/// Lifetime of a pending consent entry
pub const CONSENT_LIFETIME_MINUTES: i64 = 10;

/// Store of pending authorization requests awaiting owner approval
///
/// Keyed by (owner, client); at most one pending request per pair, a new
/// `put` replaces the previous one. Entries expire after ten minutes and are
/// evicted lazily on read.
#[derive(Clone, Default)]
pub struct ConsentStore {
    pending: Arc<RwLock<HashMap<(Uuid, Uuid), PendingConsent>>>,
}

impl ConsentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a validated request to a fresh one-shot consent token
    pub async fn put(&self, owner_id: Uuid, request: PendingAuthorization) -> ConsentToken {
        let consent = ConsentToken::new(request.client_id);
        let entry = PendingConsent {
            request,
            consent: consent.clone(),
            expires_at: Utc::now() + Duration::minutes(CONSENT_LIFETIME_MINUTES),
        };
        self.pending
            .write()
            .await
            .insert((owner_id, consent.client_id), entry);
        consent
    }

    /// Destructively redeem a consent token
    ///
    /// The entry is removed before the token comparison, so a mismatched
    /// presentation also discards the pending request. Token bytes are
    /// compared in constant time.
    pub async fn take(
        &self,
        owner_id: Uuid,
        consent: &ConsentToken,
    ) -> Option<PendingAuthorization> {
        let entry = self
            .pending
            .write()
            .await
            .remove(&(owner_id, consent.client_id))?;

        if Utc::now() >= entry.expires_at {
            tracing::debug!(owner_id = %owner_id, client_id = %consent.client_id, "pending consent expired");
            return None;
        }
        if !random::constant_time_compare(&entry.consent.token, &consent.token) {
            tracing::debug!(owner_id = %owner_id, client_id = %consent.client_id, "consent token mismatch");
            return None;
        }
        Some(entry.request)
    }
}
