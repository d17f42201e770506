//! Key repositories: where serialized key documents live.
//!
//! The cryptographic core neither reads nor interprets these documents; a
//! repository stores opaque strings (typically JSON-serialized
//! configuration produced elsewhere) under caller-chosen identifiers.
//! An optional [`DocumentEncryptor`] protects documents at rest; pairing a
//! repository with an encryptor is the caller's policy decision.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Raised by repository operations.
#[derive(Debug)]
pub enum RepositoryError {
    /// Underlying storage failed.
    Io(String),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "repository storage error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Backend for persisting serialized key documents.
pub trait KeyRepository: Send + Sync {
    /// Store `document` under `id`, replacing any previous document with
    /// the same id.
    fn store(&self, id: &str, document: &str) -> Result<(), RepositoryError>;

    /// Load every stored document, in no particular order.
    fn load_all(&self) -> Result<Vec<String>, RepositoryError>;
}

/// Protects documents at rest.
pub trait DocumentEncryptor: Send + Sync {
    /// Encrypt a document before it is persisted.
    fn encrypt(&self, document: &str) -> Result<String, RepositoryError>;

    /// Decrypt a document read back from storage.
    fn decrypt(&self, document: &str) -> Result<String, RepositoryError>;
}

// ---------------------------------------------------------------------------
// Ephemeral repository
// ---------------------------------------------------------------------------

/// In-memory repository; the last-resort fallback and a test double.
///
/// Documents vanish when the process exits, so anything protected against
/// keys stored here becomes unreadable on restart.
#[derive(Default)]
pub struct EphemeralKeyRepository {
    documents: RwLock<HashMap<String, String>>,
}

impl EphemeralKeyRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyRepository for EphemeralKeyRepository {
    fn store(&self, id: &str, document: &str) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().unwrap();
        documents.insert(id.to_string(), document.to_string());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<String>, RepositoryError> {
        let documents = self.documents.read().unwrap();
        Ok(documents.values().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// File-system repository
// ---------------------------------------------------------------------------

/// File-based repository (one file per document).
///
/// Directory layout:
/// ```text
/// keys/
///   {id}.json
/// ```
pub struct FileSystemKeyRepository {
    dir: PathBuf,
}

impl FileSystemKeyRepository {
    /// Open (creating if needed) a repository rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| RepositoryError::Io(format!("create dir: {}", e)))?;
        Ok(Self { dir })
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl KeyRepository for FileSystemKeyRepository {
    fn store(&self, id: &str, document: &str) -> Result<(), RepositoryError> {
        let path = self.document_path(id);
        // Atomic replace: write to temp, then rename
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, document)
            .map_err(|e| RepositoryError::Io(format!("write: {}", e)))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| RepositoryError::Io(format!("rename: {}", e)))?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<String>, RepositoryError> {
        let mut documents = Vec::new();
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| RepositoryError::Io(format!("readdir: {}", e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| RepositoryError::Io(format!("entry: {}", e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                let document = std::fs::read_to_string(&path)
                    .map_err(|e| RepositoryError::Io(format!("read: {}", e)))?;
                documents.push(document);
            }
        }
        Ok(documents)
    }
}

// ---------------------------------------------------------------------------
// Default selection policy
// ---------------------------------------------------------------------------

/// Pick the best available repository: the preferred directory when it is
/// usable, else an ephemeral in-memory repository.
///
/// Environment probing (which directory a given host should prefer) belongs
/// to the caller; this helper only walks the fallback chain and reports the
/// outcome.
pub fn select_default_repository(preferred_dir: Option<PathBuf>) -> Arc<dyn KeyRepository> {
    if let Some(dir) = preferred_dir {
        match FileSystemKeyRepository::new(&dir) {
            Ok(repository) => {
                info!(path = %dir.display(), "using file-system key repository");
                return Arc::new(repository);
            }
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "key storage directory unusable");
            }
        }
    }
    warn!("using an ephemeral key repository; protected data will be unavailable when the process exits");
    Arc::new(EphemeralKeyRepository::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_store_and_load() {
        let repository = EphemeralKeyRepository::new();
        repository.store("key-1", "doc-1").unwrap();
        repository.store("key-2", "doc-2").unwrap();
        repository.store("key-1", "doc-1b").unwrap();

        let mut documents = repository.load_all().unwrap();
        documents.sort();
        assert_eq!(documents, ["doc-1b", "doc-2"]);
    }

    #[test]
    fn file_system_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let repository = FileSystemKeyRepository::new(dir.path()).unwrap();
        repository.store("key-1", "doc-1").unwrap();
        repository.store("key-2", "doc-2").unwrap();

        let mut documents = repository.load_all().unwrap();
        documents.sort();
        assert_eq!(documents, ["doc-1", "doc-2"]);
    }

    #[test]
    fn file_system_store_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let repository = FileSystemKeyRepository::new(dir.path()).unwrap();
        repository.store("key-1", "old").unwrap();
        repository.store("key-1", "new").unwrap();
        assert_eq!(repository.load_all().unwrap(), ["new"]);
    }

    #[test]
    fn selection_prefers_usable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let repository = select_default_repository(Some(dir.path().to_path_buf()));
        repository.store("key-1", "doc").unwrap();
        assert!(dir.path().join("key-1.json").exists());
    }

    #[test]
    fn selection_falls_back_to_ephemeral() {
        // A file (not a directory) in the path makes creation fail.
        let file = tempfile::NamedTempFile::new().unwrap();
        let bad_dir = file.path().join("nested");
        let repository = select_default_repository(Some(bad_dir));
        repository.store("key-1", "doc").unwrap();
        assert_eq!(repository.load_all().unwrap(), ["doc"]);
    }

    #[test]
    fn selection_with_no_preference_is_ephemeral() {
        let repository = select_default_repository(None);
        assert!(repository.load_all().unwrap().is_empty());
    }
}
