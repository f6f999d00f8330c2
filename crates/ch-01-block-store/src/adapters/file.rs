use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File-backed key-value store for deployments without RocksDB.
///
/// The whole map is rewritten on every mutation through a temp file and a
/// rename, so a crash leaves either the old or the new snapshot.
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open (or create) the store file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();
        let data = match std::fs::read(&path) {
            Ok(bytes) => {
                let data: BTreeMap<Vec<u8>, Vec<u8>> =
                    bincode::deserialize(&bytes).map_err(|e| KVStoreError::CorruptionError {
                        message: format!("{}: {e}", path.display()),
                    })?;
                tracing::info!(
                    "[ch-01] Loaded {} keys from {}",
                    data.len(),
                    path.display()
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("[ch-01] No existing storage file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                return Err(KVStoreError::IOError {
                    message: format!("{}: {e}", path.display()),
                })
            }
        };
        Ok(Self { data, path })
    }

    fn save_to_file(&self) -> Result<(), KVStoreError> {
        let io_err = |e: std::io::Error| KVStoreError::IOError {
            message: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let bytes = bincode::serialize(&self.data).map_err(|e| KVStoreError::IOError {
            message: e.to_string(),
        })?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        let previous = self.data.insert(key.to_vec(), value.to_vec());
        if let Err(e) = self.save_to_file() {
            match previous {
                Some(old) => self.data.insert(key.to_vec(), old),
                None => self.data.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let snapshot = self.data.clone();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
            }
        }
        if let Err(e) = self.save_to_file() {
            self.data = snapshot;
            return Err(e);
        }
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.bin");

        let mut store = FileBackedKVStore::open(&path).unwrap();
        store
            .atomic_batch_write(vec![
                BatchOperation::put(b"a", b"1"),
                BatchOperation::put(b"b", b"2"),
            ])
            .unwrap();
        drop(store);

        let store = FileBackedKVStore::open(&path).unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert!(store.exists(b"b").unwrap());
    }

    #[test]
    fn test_failed_put_leaves_no_trace() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.bin");
        let mut store = FileBackedKVStore::open(&path).unwrap();
        store.put(b"seen", b"1").unwrap();

        // A directory where the temp file should go makes every save fail.
        std::fs::create_dir(path.with_extension("tmp")).unwrap();

        assert!(store.put(b"tx", b"record").is_err());
        assert!(!store.exists(b"tx").unwrap());
        assert!(store.put(b"seen", b"2").is_err());
        assert_eq!(store.get(b"seen").unwrap(), Some(b"1".to_vec()));
        assert!(store
            .atomic_batch_write(vec![BatchOperation::put(b"batch", b"x")])
            .is_err());
        assert!(!store.exists(b"batch").unwrap());
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.bin");
        std::fs::write(&path, [0xff, 0xff, 0xff]).unwrap();

        assert!(matches!(
            FileBackedKVStore::open(&path),
            Err(KVStoreError::CorruptionError { .. })
        ));
    }
}
