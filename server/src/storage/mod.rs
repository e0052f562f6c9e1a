//! File Storage
//!
//! Local-disk storage for submissions and profile documents under the
//! configured upload root. Paths stored in the database are relative to
//! that root:
//!
//! - `assignments/<assignment_id>/<user_id>/<uuid>.<ext>`
//! - `user-profiles/<user_id>/<doc_type>/<uuid>.<ext>`

use std::io;
use std::path::{Component, Path, PathBuf};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::util::format_file_size;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File exceeds the configured limit.
    #[error("File too large (max: {})", format_file_size(*.max_size))]
    TooLarge {
        /// Maximum allowed size in bytes.
        max_size: usize,
    },

    /// Empty upload.
    #[error("File is empty")]
    EmptyFile,

    /// Missing or unusable filename.
    #[error("Invalid filename")]
    InvalidFilename,

    /// Extension not on the allow-list.
    #[error("File type not allowed: .{extension} (allowed: {allowed})")]
    ExtensionNotAllowed {
        extension: String,
        allowed: String,
    },

    /// File missing on disk.
    #[error("File not found")]
    NotFound,

    /// Filesystem failure.
    #[error("Storage error: {0}")]
    Io(#[from] io::Error),
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::TooLarge { .. }
            | Self::EmptyFile
            | Self::InvalidFilename
            | Self::ExtensionNotAllowed { .. } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.to_string())
            }
            Self::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            Self::Io(err) => {
                tracing::error!(%err, "File storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Storage operation failed".to_string(),
                )
            }
        };

        let body = Json(serde_json::json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// A file written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the upload root.
    pub relative_path: String,
    /// Sanitized original filename, for display only.
    pub file_name: String,
    /// Size in bytes.
    pub size: usize,
}

/// Local-disk file store.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    max_size: usize,
    submission_extensions: Vec<String>,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>, max_size: usize, submission_extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            max_size,
            submission_extensions,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.upload_dir.clone(),
            config.max_upload_size,
            config.allowed_extensions.clone(),
        )
    }

    /// Create the upload root if it does not exist.
    pub async fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check size and extension of an upload. Returns the lowercase extension.
    pub fn validate<S: AsRef<str>>(
        &self,
        original_name: &str,
        size: usize,
        allowed: &[S],
    ) -> Result<String, StorageError> {
        if size == 0 {
            return Err(StorageError::EmptyFile);
        }
        if size > self.max_size {
            return Err(StorageError::TooLarge {
                max_size: self.max_size,
            });
        }

        let extension = extension_of(original_name).ok_or(StorageError::InvalidFilename)?;
        if !allowed.iter().any(|a| a.as_ref() == extension) {
            return Err(StorageError::ExtensionNotAllowed {
                extension,
                allowed: allowed
                    .iter()
                    .map(|a| a.as_ref())
                    .collect::<Vec<&str>>()
                    .join(", "),
            });
        }
        Ok(extension)
    }

    /// Validate and store an assignment submission.
    pub async fn store_submission(
        &self,
        assignment_id: Uuid,
        user_id: Uuid,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let extension =
            self.validate(original_name, data.len(), self.submission_extensions.as_slice())?;
        let dir = PathBuf::from("assignments")
            .join(assignment_id.to_string())
            .join(user_id.to_string());
        self.write(dir, &extension, original_name, data).await
    }

    /// Validate and store a profile document of the given type.
    pub async fn store_profile_document(
        &self,
        user_id: Uuid,
        doc_type: &str,
        allowed: &[&str],
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let extension = self.validate(original_name, data.len(), allowed)?;
        let dir = PathBuf::from("user-profiles")
            .join(user_id.to_string())
            .join(doc_type);
        self.write(dir, &extension, original_name, data).await
    }

    async fn write(
        &self,
        dir: PathBuf,
        extension: &str,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let file_name = sanitize_filename(original_name);
        if file_name.is_empty() {
            return Err(StorageError::InvalidFilename);
        }

        fs::create_dir_all(self.root.join(&dir)).await?;
        let relative = dir.join(format!("{}.{extension}", Uuid::now_v7()));
        fs::write(self.root.join(&relative), data).await?;

        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        debug!(path = %relative_path, size = data.len(), "Stored file");

        Ok(StoredFile {
            relative_path,
            file_name,
            size: data.len(),
        })
    }

    /// Resolve a stored relative path, refusing anything that escapes the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(relative);
        if relative.is_empty()
            || !path
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::NotFound);
        }
        Ok(self.root.join(path))
    }

    /// Open a stored file for streaming. Returns the file and its length.
    pub async fn open(&self, relative: &str) -> Result<(fs::File, u64), StorageError> {
        let path = self.resolve(relative)?;
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StorageError::NotFound),
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> Result<(), StorageError> {
        let path = self.resolve(relative)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of a file; failures are logged.
    pub async fn remove_quietly(&self, relative: &str) {
        if let Err(e) = self.remove(relative).await {
            warn!(path = %relative, error = %e, "Failed to remove stored file");
        }
    }

    /// Best-effort removal of every file submitted to an assignment.
    pub async fn remove_assignment_files(&self, assignment_id: Uuid) {
        let dir = self.root.join("assignments").join(assignment_id.to_string());
        match fs::remove_dir_all(&dir).await {
            Ok(()) => debug!(assignment_id = %assignment_id, "Removed assignment files"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                assignment_id = %assignment_id,
                error = %e,
                "Failed to remove assignment files"
            ),
        }
    }
}

/// Lowercase extension of a filename, if it has a non-empty one.
fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| !e.is_empty())
}

/// Keep only the final path component and a safe character set.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or("");

    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .take(255)
        .collect::<String>()
        .trim()
        .to_string()
}
