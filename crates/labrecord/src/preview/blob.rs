//! Revocable handles to rendered documents.
//!
//! A [`DocumentHandle`] stands in for a published document the way an object
//! URL stands in for a blob: it stays valid until revoked, and revoking it is
//! what frees the document. Handles are not `Clone`, so there is always exactly
//! one owner, and the registry sees exactly one release per publish whether the
//! owner calls [`DocumentHandle::revoke`] or simply drops the handle.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::render::{DocumentFormat, RenderedDocument};

/// Identifier of a published document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    /// The raw numeric id.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    live: HashMap<u64, DocumentFormat>,
    published: u64,
    released: u64,
}

/// Issues [`DocumentHandle`]s and tracks which are still live.
///
/// Cloning the registry shares the same bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct BlobRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl BlobRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish `document` and return the owning handle.
    #[must_use]
    pub fn publish(&self, document: RenderedDocument) -> DocumentHandle {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(id, document.format());
        state.published += 1;
        drop(state);

        debug!("Published {} ({} bytes)", HandleId(id), document.len());
        DocumentHandle {
            id: HandleId(id),
            document,
            registry: self.clone(),
            released: false,
        }
    }

    /// Number of handles not yet released.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    /// Total handles ever published.
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.lock().published
    }

    /// Total handles released.
    #[must_use]
    pub fn released_count(&self) -> u64 {
        self.lock().released
    }

    /// Whether `id` is still live.
    #[must_use]
    pub fn is_live(&self, id: HandleId) -> bool {
        self.lock().live.contains_key(&id.0)
    }

    fn release(&self, id: HandleId) {
        let mut state = self.lock();
        if state.live.remove(&id.0).is_some() {
            state.released += 1;
            trace!("Released {id}");
        }
    }
}

/// Sole owner of a published document.
pub struct DocumentHandle {
    id: HandleId,
    document: RenderedDocument,
    registry: BlobRegistry,
    released: bool,
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentHandle")
            .field("id", &self.id)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl DocumentHandle {
    /// Identifier of this handle.
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The published document.
    #[must_use]
    pub fn document(&self) -> &RenderedDocument {
        &self.document
    }

    /// Release the handle.
    pub fn revoke(mut self) {
        debug!("Revoking {}", self.id);
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.registry.release(self.id);
        }
    }
}

impl Drop for DocumentHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> RenderedDocument {
        RenderedDocument::new(DocumentFormat::Pdf, b"%PDF-1.3".to_vec(), Some(1))
    }

    #[test]
    fn test_publish_and_revoke() {
        let registry = BlobRegistry::new();
        let handle = registry.publish(document());
        let id = handle.id();

        assert!(registry.is_live(id));
        assert_eq!(registry.live_count(), 1);
        assert_eq!(handle.document().len(), 8);

        handle.revoke();
        assert!(!registry.is_live(id));
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.released_count(), 1);
    }

    #[test]
    fn test_drop_releases_once() {
        let registry = BlobRegistry::new();
        {
            let _handle = registry.publish(document());
        }
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.released_count(), 1);
    }

    #[test]
    fn test_revoke_does_not_double_release() {
        let registry = BlobRegistry::new();
        registry.publish(document()).revoke();
        registry.publish(document()).revoke();
        assert_eq!(registry.published_count(), 2);
        assert_eq!(registry.released_count(), 2);
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = BlobRegistry::new();
        let a = registry.publish(document());
        let b = registry.publish(document());
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.live_count(), 2);
        assert!(a.id().to_string().starts_with("blob:"));
    }

    #[test]
    fn test_cloned_registry_shares_state() {
        let registry = BlobRegistry::new();
        let other = registry.clone();
        let handle = other.publish(document());
        assert_eq!(registry.live_count(), 1);
        drop(handle);
        assert_eq!(registry.released_count(), 1);
    }
}
