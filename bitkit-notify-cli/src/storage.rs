//! File-backed key store for the CLI.
//!
//! Each key lives in `<storage_dir>/keys/<key_id>.key` as hex. Files are
//! created owner-readable only on unix. This is a demo store: keys are not
//! encrypted at rest.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bitkit_notify::secure_storage::{
    SecureKeyStorage, SecureStorageError, SecureStorageErrorCode, SecureStorageResult,
    StoreOptions,
};

pub struct FileKeyStorage {
    dir: PathBuf,
}

impl FileKeyStorage {
    pub fn new(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: storage_dir.as_ref().join("keys"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key_id: &str) -> SecureStorageResult<PathBuf> {
        let valid = !key_id.is_empty()
            && key_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SecureStorageError::invalid_key(
                key_id,
                "key id may only contain letters, digits, '_' and '-'",
            ));
        }
        Ok(self.dir.join(format!("{key_id}.key")))
    }
}

fn io_error(key_id: &str, err: std::io::Error) -> SecureStorageError {
    let mut error = match err.kind() {
        ErrorKind::PermissionDenied => SecureStorageError::access_denied(err.to_string()),
        _ => SecureStorageError::new(SecureStorageErrorCode::Internal, err.to_string()),
    };
    error.key_id = Some(key_id.to_string());
    error
}

impl SecureKeyStorage for FileKeyStorage {
    async fn store(
        &self,
        key_id: &str,
        key_data: &[u8],
        options: StoreOptions,
    ) -> SecureStorageResult<()> {
        let path = self.key_path(key_id)?;
        if !options.overwrite && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(SecureStorageError::already_exists(key_id));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(key_id, e))?;
        tokio::fs::write(&path, hex::encode(key_data))
            .await
            .map_err(|e| io_error(key_id, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| io_error(key_id, e))?;
        }

        tracing::debug!(key_id, path = %path.display(), "stored key");
        Ok(())
    }

    async fn retrieve(&self, key_id: &str) -> SecureStorageResult<Option<Vec<u8>>> {
        let path = self.key_path(key_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => hex::decode(contents.trim())
                .map(Some)
                .map_err(|e| SecureStorageError::invalid_key(key_id, e)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(key_id, err)),
        }
    }

    async fn delete(&self, key_id: &str) -> SecureStorageResult<()> {
        let path = self.key_path(key_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(SecureStorageError::not_found(key_id))
            }
            Err(err) => Err(io_error(key_id, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitkit_notify::secure_storage::ensure_device_keypair;

    #[tokio::test]
    async fn test_store_retrieve_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = FileKeyStorage::new(temp_dir.path());

        storage.store("k1", &[1, 2, 3], StoreOptions::new()).await.unwrap();
        assert_eq!(storage.retrieve("k1").await.unwrap(), Some(vec![1, 2, 3]));
        assert!(storage.exists("k1").await.unwrap());

        let err = storage
            .store("k1", &[9], StoreOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, SecureStorageErrorCode::AlreadyExists);

        storage
            .store("k1", &[9], StoreOptions::new().overwrite())
            .await
            .unwrap();
        assert_eq!(storage.retrieve("k1").await.unwrap(), Some(vec![9]));

        storage.delete("k1").await.unwrap();
        assert_eq!(storage.retrieve("k1").await.unwrap(), None);
        assert!(storage.delete("k1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_rejects_path_like_key_ids() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = FileKeyStorage::new(temp_dir.path());

        for key_id in ["", "../escape", "a/b", "dot.key"] {
            let err = storage.retrieve(key_id).await.unwrap_err();
            assert_eq!(err.code, SecureStorageErrorCode::InvalidKey, "{key_id:?}");
        }
    }

    #[tokio::test]
    async fn test_corrupt_file_is_invalid_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = FileKeyStorage::new(temp_dir.path());
        std::fs::create_dir_all(storage.dir()).unwrap();
        std::fs::write(storage.dir().join("k.key"), "not hex").unwrap();

        let err = storage.retrieve("k").await.unwrap_err();
        assert_eq!(err.code, SecureStorageErrorCode::InvalidKey);
    }

    #[tokio::test]
    async fn test_device_key_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();

        let first = ensure_device_keypair(&FileKeyStorage::new(temp_dir.path()), "device")
            .await
            .unwrap();
        let second = ensure_device_keypair(&FileKeyStorage::new(temp_dir.path()), "device")
            .await
            .unwrap();
        assert_eq!(first.public_hex(), second.public_hex());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let storage = FileKeyStorage::new(temp_dir.path());
        storage.store("k", &[1], StoreOptions::new()).await.unwrap();

        let mode = std::fs::metadata(storage.dir().join("k.key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
