//! JSON-file storage backend.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, instrument, trace};

use tokenward_core::error::{Error, StorageError};
use tokenward_core::{Result, StorageBackend};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// File holding the stored values.
const CREDENTIALS_FILE: &str = "credentials.json";

/// Sibling file used for exclusive write locking.
const LOCK_FILE: &str = "credentials.lock";

fn map_io(path: &Path) -> impl Fn(std::io::Error) -> Error + '_ {
    move |err| {
        StorageError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
        .into()
    }
}

/// A storage backend persisting values as one JSON object on disk.
///
/// Writes are serialized across processes with an exclusive lock and land
/// atomically through a rename. On Unix the file is readable by its owner
/// only.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend storing its file in `dir`.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The directory holding the credentials file.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the credentials file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&path).map_err(map_io(&path))?;
        serde_json::from_str(&contents).map_err(|e| {
            StorageError::Serialization {
                key: CREDENTIALS_FILE.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let path = self.path();

        if entries.is_empty() {
            if path.exists() {
                fs::remove_file(&path).map_err(map_io(&path))?;
                debug!(path = %path.display(), "Removed empty credentials file");
            }
            return Ok(());
        }

        let json = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Serialization {
            key: CREDENTIALS_FILE.to_string(),
            message: e.to_string(),
        })?;

        let temp_path = path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(map_io(&temp_path))?;

            #[cfg(unix)]
            {
                let mut perms = file.metadata().map_err(map_io(&temp_path))?.permissions();
                perms.set_mode(0o600);
                fs::set_permissions(&temp_path, perms).map_err(map_io(&temp_path))?;
            }

            file.write_all(json.as_bytes()).map_err(map_io(&temp_path))?;
            file.sync_all().map_err(map_io(&temp_path))?;
        }
        fs::rename(&temp_path, &path).map_err(map_io(&path))?;

        Ok(())
    }

    /// Apply `change` to the stored map under the exclusive lock.
    fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        fs::create_dir_all(&self.dir).map_err(map_io(&self.dir))?;

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(map_io(&lock_path))?;

        lock_file.lock_exclusive().map_err(map_io(&lock_path))?;

        let result = self.load().and_then(|mut entries| {
            if change(&mut entries) {
                self.save(&entries)
            } else {
                Ok(())
            }
        });

        lock_file.unlock().map_err(map_io(&lock_path))?;

        result
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    #[instrument(skip(self, value), fields(dir = %self.dir.display()))]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        trace!("Storing value");
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    fn remove(&self, key: &str) -> Result<()> {
        if !self.path().exists() {
            return Ok(());
        }
        self.update(|entries| entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_as_empty() {
        let temp = TempDir::new().unwrap();
        let backend = FileBackend::new(temp.path().join("nested"));
        assert_eq!(backend.get("accessToken").unwrap(), None);
        backend.remove("accessToken").unwrap();
        assert!(!backend.dir().exists());
    }

    #[test]
    fn values_survive_a_new_instance() {
        let temp = TempDir::new().unwrap();
        FileBackend::new(temp.path())
            .set("refreshToken", "R1")
            .unwrap();

        let reopened = FileBackend::new(temp.path());
        assert_eq!(
            reopened.get("refreshToken").unwrap().as_deref(),
            Some("R1")
        );
    }

    #[test]
    fn removing_last_key_deletes_file() {
        let temp = TempDir::new().unwrap();
        let backend = FileBackend::new(temp.path());
        backend.set("accessToken", "A1").unwrap();
        backend.set("user", "{\"id\":1}").unwrap();
        assert!(backend.path().exists());

        backend.remove("accessToken").unwrap();
        assert!(backend.path().exists());
        assert_eq!(backend.get("user").unwrap().as_deref(), Some("{\"id\":1}"));

        backend.remove("user").unwrap();
        assert!(!backend.path().exists());
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let temp = TempDir::new().unwrap();
        let backend = FileBackend::new(temp.path());
        fs::write(backend.path(), "not json").unwrap();

        let err = backend.get("accessToken").unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::Serialization { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn file_is_owner_only() {
        let temp = TempDir::new().unwrap();
        let backend = FileBackend::new(temp.path());
        backend.set("accessToken", "A1").unwrap();

        let mode = fs::metadata(backend.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
