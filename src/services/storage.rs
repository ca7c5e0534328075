//! Blob storage for uploaded files. The auth flow never touches this; only
//! the user-creation endpoint does.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::config::StorageConfig;

/// A file received from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Upload outcome. Failures are reported through `has_error` rather than an
/// error type; callers decide whether a failed upload aborts their flow.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub status: u16,
    pub url: String,
    pub original_file_name: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub has_error: bool,
}

impl UploadResult {
    fn failure(file: &UploadedFile) -> Self {
        Self {
            status: 400,
            url: String::new(),
            original_file_name: file.file_name.clone(),
            file_name: String::new(),
            file_type: file.content_type.clone(),
            file_size: file.bytes.len() as u64,
            has_error: true,
        }
    }
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Stores the file under `directory` (defaults to `uploads/`) and
    /// returns where it landed.
    async fn upload(&self, file: UploadedFile, directory: Option<&str>) -> UploadResult;

    /// Removes a stored file. Returns false when it did not exist.
    async fn delete(&self, file_name: &str, directory: &str) -> anyhow::Result<bool>;
}

/// Local-disk implementation; the configured base URL is what clients see.
pub struct LocalStorageService {
    config: StorageConfig,
}

impl LocalStorageService {
    #[must_use]
    pub const fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn target_dir(&self, directory: Option<&str>) -> (String, PathBuf) {
        let dir = directory.unwrap_or("uploads").to_lowercase();
        let path = Path::new(&self.config.upload_path).join(&dir);
        (dir, path)
    }
}

/// Keep only A-Z, a-z, 0-9, and dots; strip leading/trailing dots;
/// lowercase the result.
#[must_use]
pub fn create_valid_filename(filename: &str, max_length: Option<usize>) -> String {
    let mut sanitized: String = filename
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect();

    sanitized = sanitized.trim_matches('.').to_string();

    if let Some(max) = max_length
        && sanitized.len() > max
    {
        sanitized.truncate(max);
    }

    sanitized.to_lowercase()
}

/// Splits `name.ext` into (`name`, `.ext`); no extension gives an empty tail.
fn split_extension(filename: &str) -> (&str, &str) {
    filename
        .rfind('.')
        .map_or((filename, ""), |idx| filename.split_at(idx))
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn upload(&self, file: UploadedFile, directory: Option<&str>) -> UploadResult {
        let (dir, dir_path) = self.target_dir(directory);

        if let Err(e) = fs::create_dir_all(&dir_path).await {
            warn!("Failed to create upload directory: {e}");
            return UploadResult::failure(&file);
        }

        let valid_name = create_valid_filename(&file.file_name, None);
        let mut final_name = valid_name.clone();
        let mut target = dir_path.join(&final_name);

        // Rename rather than overwrite when the name is taken.
        while target.exists() {
            let (base, ext) = split_extension(&valid_name);
            final_name = format!("{base}_{}{ext}", chrono::Utc::now().timestamp_millis());
            target = dir_path.join(&final_name);
        }

        if let Err(e) = fs::write(&target, &file.bytes).await {
            warn!("Failed to write upload to {}: {e}", target.display());
            return UploadResult::failure(&file);
        }

        info!(path = %target.display(), "Stored uploaded file");

        UploadResult {
            status: 201,
            url: format!(
                "{}/{dir}/{final_name}",
                self.config.public_base_url.trim_end_matches('/')
            ),
            original_file_name: file.file_name,
            file_name: final_name,
            file_type: file.content_type,
            file_size: file.bytes.len() as u64,
            has_error: false,
        }
    }

    async fn delete(&self, file_name: &str, directory: &str) -> anyhow::Result<bool> {
        let path = Path::new(&self.config.upload_path)
            .join(directory)
            .join(file_name);

        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_sanitization() {
        assert_eq!(create_valid_filename("Photo 2024.JPG", None), "photo_2024.jpg");
        assert_eq!(create_valid_filename("..hidden..", None), "hidden");
        assert_eq!(create_valid_filename("a/b\\c.png", None), "a_b_c.png");
        assert_eq!(create_valid_filename("report.pdf", Some(6)), "report");
    }

    #[test]
    fn extension_split() {
        assert_eq!(split_extension("photo.jpg"), ("photo", ".jpg"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension("noext"), ("noext", ""));
    }

    #[tokio::test]
    async fn upload_writes_and_renames_on_collision() {
        let dir = std::env::temp_dir().join(format!("aula-test-{}", std::process::id()));
        let config = StorageConfig {
            upload_path: dir.to_string_lossy().to_string(),
            public_base_url: "http://localhost:3003/uploads".to_string(),
        };
        let storage = LocalStorageService::new(config);

        let file = UploadedFile {
            file_name: "avatar.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };

        let first = storage.upload(file.clone(), Some("avatars")).await;
        assert!(!first.has_error);
        assert_eq!(first.status, 201);
        assert_eq!(first.file_name, "avatar.png");
        assert!(first.url.ends_with("/avatars/avatar.png"));

        let second = storage.upload(file, Some("avatars")).await;
        assert!(!second.has_error);
        assert_ne!(second.file_name, "avatar.png");
        assert!(second.file_name.starts_with("avatar_"));

        let removed = storage.delete(&first.file_name, "avatars").await.unwrap();
        assert!(removed);
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
