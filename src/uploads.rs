//! Content store for complaint photo evidence.
//!
//! A single flat directory; filenames follow `complaint_{id}_{hex}{ext}` with
//! a v4 UUID as the collision-resistant hex part. Validation happens before
//! anything touches the filesystem, so a rejected file leaves no residue.

use crate::errors::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Upload size cap: 5 MiB, inclusive.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted filename extensions, matched case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

#[derive(Debug, Clone)]
pub struct ImageStore {
    base_dir: PathBuf,
}

impl ImageStore {
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create uploads directory '{}': {}",
                base_dir.display(),
                e
            ))
        })?;
        info!(path = %base_dir.display(), "Image store initialized");
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Validates the upload without writing anything. Each violated rule is
    /// named in the error so the presentation layer can report it per file.
    pub fn validate(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                Error::Validation(format!("'{}' has no file extension", original_name))
            })?;

        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(Error::Validation(format!(
                "extension '.{}' is not allowed (accepted: {})",
                ext,
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }
        if bytes.is_empty() {
            return Err(Error::Validation(format!("'{}' is empty", original_name)));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(Error::Validation(format!(
                "'{}' is {} bytes, over the {} byte limit",
                original_name,
                bytes.len(),
                MAX_IMAGE_BYTES
            )));
        }
        Ok(ext)
    }

    /// Validates and writes one image, returning the stored path. The write
    /// is a plain blocking filesystem write under a generated name scoped by
    /// complaint id.
    pub fn save(&self, complaint_id: i64, original_name: &str, bytes: &[u8]) -> Result<String> {
        let ext = self.validate(original_name, bytes)?;

        let filename = format!(
            "complaint_{}_{}.{}",
            complaint_id,
            Uuid::new_v4().simple(),
            ext
        );
        let path = self.base_dir.join(&filename);
        fs::write(&path, bytes).map_err(|e| {
            Error::Storage(format!("Failed to write '{}': {}", path.display(), e))
        })?;

        debug!(
            complaint_id,
            size = bytes.len(),
            path = %path.display(),
            "Stored complaint image"
        );
        Ok(path.to_string_lossy().into_owned())
    }

    /// Lists stored files for one complaint by filename prefix.
    pub fn list_for_complaint(&self, complaint_id: i64) -> Result<Vec<String>> {
        let prefix = format!("complaint_{}_", complaint_id);
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.base_dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to list uploads directory '{}': {}",
                self.base_dir.display(),
                e
            ))
        })? {
            let entry = entry.map_err(|e| {
                Error::Storage(format!("Failed to read directory entry: {}", e))
            })?;
            let name = entry.file_name();
            if let Some(name) = name.to_str()
                && name.starts_with(&prefix)
                && entry.path().is_file()
            {
                paths.push(entry.path().to_string_lossy().into_owned());
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (ImageStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ImageStore::new(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn test_save_uses_complaint_scoped_name() {
        let (store, _dir) = test_store();
        let path = store.save(7, "blown_tire.JPG", b"jpeg-bytes").unwrap();
        let filename = Path::new(&path).file_name().unwrap().to_str().unwrap();
        assert!(filename.starts_with("complaint_7_"), "got {filename}");
        assert!(filename.ends_with(".jpg"), "extension lowercased: {filename}");
        assert_eq!(fs::read(&path).unwrap(), b"jpeg-bytes");
    }

    #[test]
    fn test_extension_allow_list_ignores_content() {
        let (store, _dir) = test_store();
        // Perfectly valid PNG magic bytes under a disallowed name still fail.
        let err = store
            .save(1, "evidence.exe", b"\x89PNG\r\n\x1a\n")
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got: {err:?}");

        let err = store.save(1, "noextension", b"data").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_size_cap_is_inclusive() {
        let (store, _dir) = test_store();
        let exactly_5_mib = vec![0u8; MAX_IMAGE_BYTES];
        assert!(store.save(2, "big.png", &exactly_5_mib).is_ok());

        let one_over = vec![0u8; MAX_IMAGE_BYTES + 1];
        let err = store.save(2, "too_big.png", &one_over).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_empty_upload_rejected() {
        let (store, _dir) = test_store();
        assert!(store.save(3, "empty.png", b"").is_err());
    }

    #[test]
    fn test_list_for_complaint_filters_by_prefix() {
        let (store, _dir) = test_store();
        store.save(10, "a.png", b"a").unwrap();
        store.save(10, "b.jpeg", b"b").unwrap();
        store.save(11, "other.png", b"c").unwrap();

        let listed = store.list_for_complaint(10).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(store.list_for_complaint(99).unwrap().is_empty());
    }
}
