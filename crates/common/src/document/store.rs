//! Upload directory access

use super::pdf::extract_document;
use super::Document;
use crate::errors::{AppError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Validate an uploaded filename and normalize spaces to underscores
pub fn sanitize_filename(raw: &str) -> Result<String> {
    let name = raw.trim().replace(' ', "_");
    validate_name(&name)?;

    let is_pdf = Path::new(&name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err(AppError::UnsupportedFileType { filename: name });
    }

    Ok(name)
}

/// Reject names that could escape the upload directory
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AppError::Validation {
            message: "Filename must not be empty".into(),
            field: Some("filename".into()),
        });
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(AppError::Validation {
            message: format!("Invalid filename: {}", name),
            field: Some("filename".into()),
        });
    }
    Ok(())
}

/// Flat directory of uploaded PDFs
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if missing
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// True when the directory exists and is not read-only
    pub async fn is_writable(&self) -> bool {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
            Err(_) => false,
        }
    }

    /// Path of an existing upload
    pub async fn resolve(&self, filename: &str) -> Result<PathBuf> {
        validate_name(filename)?;
        let path = self.root.join(filename);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(AppError::DocumentNotFound {
                filename: filename.to_string(),
            });
        }
        Ok(path)
    }

    /// Store upload bytes, replacing any file of the same name
    pub async fn save(&self, raw_name: &str, bytes: &[u8]) -> Result<String> {
        let filename = sanitize_filename(raw_name)?;
        self.ensure_dir().await?;

        let path = self.root.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Upload {
                message: format!("Failed to write {}: {}", filename, e),
            })?;

        crate::metrics::record_upload(bytes.len());
        info!(file = %filename, bytes = bytes.len(), "Upload stored");
        Ok(filename)
    }

    /// Extract the text of a stored upload on the blocking pool
    pub async fn load(&self, filename: &str) -> Result<Document> {
        let path = self.resolve(filename).await?;
        debug!(path = %path.display(), "Loading document");

        tokio::task::spawn_blocking(move || extract_document(&path))
            .await
            .map_err(|e| AppError::Internal {
                message: format!("Extraction task failed: {}", e),
            })
    }
}
