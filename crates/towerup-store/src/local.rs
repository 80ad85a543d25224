use crate::{validate_key, ObjectBackend, StoreError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Object store kept in a local directory, one subdirectory per bucket.
///
/// Writes go through a temporary file in the bucket directory and are
/// renamed into place, so a reader never observes a half-written artifact.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_owned(),
        }
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf, StoreError> {
        validate_key(bucket)?;
        Ok(self.root.join(bucket))
    }
}

impl ObjectBackend for LocalBackend {
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(dir.join(key)).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        validate_key(key)?;
        let path = self.bucket_dir(bucket)?.join(key);
        match fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}
