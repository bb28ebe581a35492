//! Cart session identifiers.

use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use tracing::{debug, warn};

use pachamama_core::SessionId;

use crate::storage::{KeyValueStore, keys};

/// Random characters after the `session_` prefix.
const SESSION_SUFFIX_LEN: usize = 13;

/// Lazily creates and persists the identifier that keys the server-side cart.
///
/// Once generated, the same identifier is returned for the lifetime of the
/// backing store.
#[derive(Clone)]
pub struct SessionIdManager {
    store: Arc<dyn KeyValueStore>,
    current: Arc<RwLock<Option<SessionId>>>,
}

impl SessionIdManager {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Return the persisted identifier, generating and storing one if needed.
    pub fn get_or_create(&self) -> SessionId {
        if let Some(id) = self.current.read().clone() {
            return id;
        }

        let mut current = self.current.write();
        if let Some(id) = current.clone() {
            return id;
        }

        let id = match self.store.get(keys::CART_SESSION_ID) {
            Ok(Some(stored)) if !stored.is_empty() => SessionId::new(stored),
            Ok(_) => self.create(),
            Err(err) => {
                warn!(error = %err, "Failed to read cart session, starting a new one");
                self.create()
            }
        };

        *current = Some(id.clone());
        id
    }

    /// Identifier already loaded in memory, if any.
    #[must_use]
    pub fn current(&self) -> Option<SessionId> {
        self.current.read().clone()
    }

    /// A fresh `session_` identifier with a random base-36 suffix.
    #[must_use]
    pub fn generate() -> SessionId {
        let mut rng = rand::rng();
        let suffix: String = (0..SESSION_SUFFIX_LEN)
            .map(|_| char::from_digit(rng.random_range(0..36), 36).unwrap_or('0'))
            .collect();
        SessionId::new(format!("{}{suffix}", SessionId::PREFIX))
    }

    fn create(&self) -> SessionId {
        let id = Self::generate();
        debug!(session_id = %id, "Created cart session");
        if let Err(err) = self.store.set(keys::CART_SESSION_ID, id.as_str()) {
            warn!(error = %err, "Failed to persist cart session");
        }
        id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_generated_id_format() {
        let id = SessionIdManager::generate();
        let suffix = id.as_str().strip_prefix("session_").unwrap();
        assert_eq!(suffix.len(), SESSION_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_id_is_stable_and_persisted() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionIdManager::new(Arc::clone(&store) as Arc<dyn KeyValueStore>);
        assert!(manager.current().is_none());

        let first = manager.get_or_create();
        let second = manager.get_or_create();
        assert_eq!(first, second);
        assert_eq!(
            store.get(keys::CART_SESSION_ID).unwrap().as_deref(),
            Some(first.as_str())
        );

        let reloaded = SessionIdManager::new(store);
        assert_eq!(reloaded.get_or_create(), first);
    }

    #[test]
    fn test_existing_id_is_reused() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::CART_SESSION_ID, "session_existing").unwrap();
        let manager = SessionIdManager::new(store);
        assert_eq!(manager.get_or_create().as_str(), "session_existing");
    }
}
