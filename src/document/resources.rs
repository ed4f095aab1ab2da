//! Locally addressable handles for resources extracted from archives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;

/// Creates and releases opaque references to in-memory resources.
///
/// A handle is whatever the consumer of the rich rendering can put in a `src`
/// attribute and later resolve.
pub trait ResourceStore: Send + Sync {
    /// Register `data` and return a handle for it.
    fn create(&self, data: &[u8], mime_type: &str) -> String;

    /// Forget a handle returned by [`create`](Self::create). Unknown handles are ignored.
    fn release(&self, handle: &str);
}

/// Keeps resource bytes in memory behind `blob:readalong/N` handles.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next: AtomicU64,
    entries: Mutex<HashMap<String, StoredResource>>,
}

/// Bytes and media type registered in a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct StoredResource {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live handle.
    pub fn get(&self, handle: &str) -> Option<StoredResource> {
        self.entries.lock().get(handle).cloned()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceStore for MemoryStore {
    fn create(&self, data: &[u8], mime_type: &str) -> String {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = format!("blob:readalong/{id}");
        self.entries.lock().insert(
            handle.clone(),
            StoredResource {
                data: data.to_vec(),
                mime_type: mime_type.to_string(),
            },
        );
        handle
    }

    fn release(&self, handle: &str) {
        self.entries.lock().remove(handle);
    }
}

/// Inlines resources as base64 `data:` URIs. Nothing to release.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUriStore;

impl ResourceStore for DataUriStore {
    fn create(&self, data: &[u8], mime_type: &str) -> String {
        format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
    }

    fn release(&self, _handle: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        let a = store.create(b"one", "image/png");
        let b = store.create(b"two", "image/jpeg");
        assert_ne!(a, b);
        assert!(a.starts_with("blob:readalong/"));

        let stored = store.get(&b).expect("handle should be live");
        assert_eq!(stored.data, b"two");
        assert_eq!(stored.mime_type, "image/jpeg");

        store.release(&a);
        assert!(store.get(&a).is_none());
        assert_eq!(store.len(), 1);

        store.release("blob:readalong/unknown");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_data_uri_store() {
        let store = DataUriStore;
        assert_eq!(store.create(b"hi", "text/plain"), "data:text/plain;base64,aGk=");
    }
}
