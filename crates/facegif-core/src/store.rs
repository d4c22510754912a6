//! In-memory image store handing out `blob:` display references.

use crate::types::{DisplayRef, ImageFile};
use std::collections::HashMap;
use uuid::Uuid;

/// Owns the bytes behind every live `blob:` reference.
///
/// Each reference is acquired once by [`create`](Self::create) and released
/// once by [`revoke`](Self::revoke). `len()` is the number of live references,
/// so a session with nothing displayed must leave it at zero.
#[derive(Debug, Default)]
pub struct BlobStore {
    blobs: HashMap<Uuid, ImageFile>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, file: ImageFile) -> DisplayRef {
        let id = Uuid::new_v4();
        tracing::debug!(%id, name = %file.name, bytes = file.len(), "blob created");
        self.blobs.insert(id, file);
        DisplayRef::Blob(id)
    }

    pub fn resolve(&self, reference: &DisplayRef) -> Option<&ImageFile> {
        match reference {
            DisplayRef::Blob(id) => self.blobs.get(id),
            DisplayRef::Remote(_) => None,
        }
    }

    /// Release a reference. Returns false for remote or already-revoked references.
    pub fn revoke(&mut self, reference: &DisplayRef) -> bool {
        let DisplayRef::Blob(id) = reference else {
            return false;
        };
        let removed = self.blobs.remove(id).is_some();
        if removed {
            tracing::debug!(%id, "blob revoked");
        } else {
            tracing::warn!(%id, "revoke of unknown blob");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}
