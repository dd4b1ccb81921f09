//! Artifact store for generated files
//!
//! A flat namespace of named byte blobs. Names are plain file names; anything
//! that could escape the store's directory is rejected.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{OrderError, OrderResult};

use super::file_io::{write_bytes_atomic, write_path_atomic};

/// Metadata about a stored artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    pub name: String,
    pub size_bytes: u64,
}

/// Named blob storage
pub trait ArtifactStore {
    /// Store bytes under a name, replacing any previous content
    fn put(&self, name: &str, bytes: &[u8]) -> OrderResult<()>;

    /// Store a file produced by `write`, returning its size in bytes.
    ///
    /// `write` is handed a scratch path to create the file at. Nothing
    /// appears under `name` unless it succeeds.
    fn put_with<F>(&self, name: &str, write: F) -> OrderResult<u64>
    where
        F: FnOnce(&Path) -> OrderResult<()>;

    /// Read the bytes stored under a name
    fn get(&self, name: &str) -> OrderResult<Vec<u8>>;

    fn exists(&self, name: &str) -> OrderResult<bool>;

    /// Every stored artifact, sorted by name
    fn list(&self) -> OrderResult<Vec<ArtifactInfo>>;

    fn remove(&self, name: &str) -> OrderResult<()>;
}

/// Reject empty names, path separators and parent references
pub fn validate_artifact_name(name: &str) -> OrderResult<()> {
    if name.trim().is_empty() {
        return Err(OrderError::Validation("file name cannot be empty".into()));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(OrderError::Validation(format!(
            "invalid file name '{}'",
            name
        )));
    }
    Ok(())
}

/// Artifacts stored as files in one directory
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the artifacts
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> OrderResult<PathBuf> {
        validate_artifact_name(name)?;
        Ok(self.dir.join(name))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn put(&self, name: &str, bytes: &[u8]) -> OrderResult<()> {
        let path = self.path_for(name)?;
        write_bytes_atomic(path, bytes)
    }

    fn put_with<F>(&self, name: &str, write: F) -> OrderResult<u64>
    where
        F: FnOnce(&Path) -> OrderResult<()>,
    {
        let path = self.path_for(name)?;
        write_path_atomic(&path, write)?;
        fs::metadata(&path)
            .map(|metadata| metadata.len())
            .map_err(|e| OrderError::Io(format!("Failed to read {}: {}", name, e)))
    }

    fn get(&self, name: &str) -> OrderResult<Vec<u8>> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(OrderError::export_not_found(name));
        }
        fs::read(&path).map_err(|e| OrderError::Io(format!("Failed to read {}: {}", name, e)))
    }

    fn exists(&self, name: &str) -> OrderResult<bool> {
        Ok(self.path_for(name)?.is_file())
    }

    fn list(&self) -> OrderResult<Vec<ArtifactInfo>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut artifacts = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| {
            OrderError::Io(format!("Failed to read export directory: {}", e))
        })? {
            let entry = entry
                .map_err(|e| OrderError::Io(format!("Failed to read directory entry: {}", e)))?;

            let metadata = entry
                .metadata()
                .map_err(|e| OrderError::Io(format!("Failed to read file metadata: {}", e)))?;
            if !metadata.is_file() {
                continue;
            }

            // Names that are not valid UTF-8 cannot be requested anyway
            if let Ok(name) = entry.file_name().into_string() {
                artifacts.push(ArtifactInfo {
                    name,
                    size_bytes: metadata.len(),
                });
            }
        }

        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(artifacts)
    }

    fn remove(&self, name: &str) -> OrderResult<()> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(OrderError::export_not_found(name));
        }
        fs::remove_file(&path)
            .map_err(|e| OrderError::Io(format!("Failed to delete {}: {}", name, e)))
    }
}
