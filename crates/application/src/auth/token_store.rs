//! Persisted bearer-token cell.
//!
//! The token lives in a single storage slot as a JSON-encoded string, the
//! same shape browser local storage would hold. Reads fail closed: anything
//! that cannot be decoded reads as "no token".

use std::sync::Arc;

use serde_json::Value;
use sims_domain::token_preview;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::ports::{KeyValueStorage, StorageError};

/// Storage slot holding the token.
pub const TOKEN_SLOT: &str = "acces_token";

/// Thread-safe handle to the persisted token.
///
/// Clones share the same storage and write lock.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    write_lock: Arc<RwLock<()>>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").field("slot", &TOKEN_SLOT).finish()
    }
}

impl TokenStore {
    /// Creates a store over the given storage.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(RwLock::new(())),
        }
    }

    /// Persists `token`, replacing any previous one. No validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be written.
    pub async fn set(&self, token: &str) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(token)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let _guard = self.write_lock.write().await;
        self.storage.set_item(TOKEN_SLOT, &encoded).await?;
        debug!(token = %token_preview(token), "Stored access token");
        Ok(())
    }

    /// Returns the stored token, or `None` when absent or unreadable.
    pub async fn get(&self) -> Option<String> {
        let raw = {
            let _guard = self.write_lock.read().await;
            match self.storage.get_item(TOKEN_SLOT).await {
                Ok(raw) => raw?,
                Err(e) => {
                    warn!(error = %e, "Token slot could not be read");
                    return None;
                }
            }
        };
        let token = decode_slot(&raw);
        if token.is_none() {
            warn!("Token slot holds an unreadable value");
        }
        token
    }

    /// Returns true when a token can be read.
    pub async fn has_token(&self) -> bool {
        self.get().await.is_some()
    }

    /// Removes the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be removed.
    pub async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.write().await;
        self.storage.remove_item(TOKEN_SLOT).await?;
        debug!("Cleared access token");
        Ok(())
    }
}

/// Accepts `"abc"` and `{"token":"abc"}`; everything else is corrupt.
fn decode_slot(raw: &str) -> Option<String> {
    let token = match serde_json::from_str::<Value>(raw).ok()? {
        Value::String(token) => token,
        Value::Object(mut map) => match map.remove("token") {
            Some(Value::String(token)) => token,
            _ => return None,
        },
        _ => return None,
    };
    (!token.is_empty()).then_some(token)
}
