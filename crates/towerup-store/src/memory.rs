use crate::{validate_key, ObjectBackend, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// In-process object store. Clones share the same objects.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    objects: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectBackend for MemoryBackend {
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((bucket.to_owned(), key.to_owned()), data.to_vec());
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        validate_key(key)?;
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(bucket.to_owned(), key.to_owned()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{bucket}/{key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_object_is_not_found() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.get_object("b", "k"),
            Err(StoreError::NotFound(p)) if p == "b/k"
        ));
    }

    #[test]
    fn clones_share_objects() {
        let backend = MemoryBackend::new();
        backend.clone().put_object("b", "k", b"v").unwrap();
        assert_eq!(backend.get_object("b", "k").unwrap(), b"v");
        assert!(backend.get_object("other", "k").is_err());
    }
}
