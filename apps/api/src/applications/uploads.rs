//! Resume file storage on local disk. Everything lives flat under one root
//! directory, which the router serves at `/uploads`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::ProfileResume;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];
const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file exceeds the {} MB limit", MAX_UPLOAD_BYTES / (1024 * 1024))]
    TooLarge,

    #[error("unsupported file type '{0}', expected pdf, doc, docx or txt")]
    UnsupportedType(String),

    #[error("file storage failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::TooLarge => AppError::PayloadTooLarge(e.to_string()),
            UploadError::UnsupportedType(_) => AppError::Validation(e.to_string()),
            UploadError::Io(io) => AppError::Storage(io),
        }
    }
}

/// A file written into the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path as persisted on the record.
    pub path: String,
    /// Name the client supplied.
    pub original_name: String,
}

/// Public URL of a stored file under the static `/uploads` mount.
pub fn public_url(stored_path: &str) -> String {
    let name = Path::new(stored_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("/uploads/{name}")
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// Keeps ASCII alphanumerics, dots, dashes and underscores.
fn sanitize(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let start = cleaned.len().saturating_sub(MAX_NAME_LEN);
    cleaned[start..].to_string()
}

pub fn check_upload(original_name: &str, len: usize) -> Result<String, UploadError> {
    if len > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }
    let ext = extension_of(original_name).unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(UploadError::UnsupportedType(ext));
    }
    Ok(ext)
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stored_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Validates and writes a freshly uploaded file under a generated unique name.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, UploadError> {
        check_upload(original_name, bytes.len())?;

        let short = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            &short[..8],
            sanitize(original_name)
        );
        let path = self.stored_path(&file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!("Stored upload {} ({} bytes)", path.display(), bytes.len());

        Ok(StoredFile {
            path: path.to_string_lossy().into_owned(),
            original_name: original_name.to_string(),
        })
    }

    /// Copies a profile resume into a per-application file so later profile
    /// changes leave the submission intact.
    pub async fn copy_profile(
        &self,
        user_id: Uuid,
        profile: &ProfileResume,
    ) -> Result<StoredFile, UploadError> {
        let ext = extension_of(&profile.original_name)
            .or_else(|| extension_of(&profile.path))
            .unwrap_or_else(|| "pdf".to_string());
        let short = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "profile-apply-{}-{}-{}.{}",
            user_id,
            Utc::now().timestamp_millis(),
            &short[..8],
            ext
        );
        let path = self.stored_path(&file_name);
        tokio::fs::copy(&profile.path, &path).await?;

        Ok(StoredFile {
            path: path.to_string_lossy().into_owned(),
            original_name: profile.original_name.clone(),
        })
    }

    /// Best effort: a missing file is not an error.
    pub async fn remove(&self, stored_path: &str) {
        match tokio::fs::remove_file(stored_path).await {
            Ok(()) => debug!("Removed {stored_path}"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {stored_path}: {e}"),
        }
    }

    /// Absolute path handed to the scoring engine.
    pub async fn absolute(&self, stored_path: &str) -> std::io::Result<PathBuf> {
        tokio::fs::canonicalize(stored_path).await
    }
}
