//! Content-addressed storage for downloaded media.
//!
//! Image bytes are stored under a two-level directory keyed by hash
//! prefix: `{media_dir}/{hash[0..2]}/{hash[0..8]}.{extension}`. Saving
//! the same bytes twice is a no-op, so re-scrapes never duplicate files.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of content as lowercase hex.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Construct the storage path for content.
///
/// Uses a two-level directory structure based on hash prefix for
/// filesystem efficiency.
pub fn content_storage_path(media_dir: &Path, content_hash: &str, extension: &str) -> PathBuf {
    media_dir
        .join(&content_hash[..2])
        .join(format!("{}.{}", &content_hash[..8], extension))
}

/// Pick a file extension: sniff the bytes first, fall back to the URL.
pub fn extension_for(content: &[u8], url: &str) -> String {
    if let Some(kind) = infer::get(content) {
        return kind.extension().to_string();
    }
    extension_from_url(url).unwrap_or_else(|| "bin".to_string())
}

/// Extension from a URL path, when it has a plausible one.
fn extension_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let filename = path.rsplit('/').next()?;
    let (_, ext) = filename.rsplit_once('.')?;
    (ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_ascii_lowercase())
}

/// Saved media file: its hash and where it lives.
#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub content_hash: String,
    pub path: PathBuf,
}

/// Write media bytes to content-addressed storage.
///
/// Returns the hash and path. Idempotent: existing files are left
/// untouched.
pub fn save_media(media_dir: &Path, content: &[u8], url: &str) -> std::io::Result<StoredMedia> {
    let hash = content_hash(content);
    let extension = extension_for(content, url);
    let path = content_storage_path(media_dir, &hash, &extension);

    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
    }

    Ok(StoredMedia {
        content_hash: hash,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_storage_path_layout() {
        let path = content_storage_path(Path::new("/media"), "abcdef1234567890", "jpg");
        assert_eq!(path, PathBuf::from("/media/ab/abcdef12.jpg"));
    }

    #[test]
    fn test_extension_from_url_fallback() {
        // Bytes that no sniffer recognizes fall back to the URL.
        assert_eq!(extension_for(b"not an image", "https://x.example/a/photo.JPG?v=2"), "jpg");
        assert_eq!(extension_for(b"not an image", "https://x.example/a/photo"), "bin");
    }

    #[test]
    fn test_save_media_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = save_media(dir.path(), b"image bytes", "https://x.example/a.jpg").unwrap();
        let second = save_media(dir.path(), b"image bytes", "https://x.example/b.jpg").unwrap();
        assert_eq!(first.content_hash, second.content_hash);
        assert_eq!(first.path, second.path);
        assert!(first.path.exists());
    }
}
