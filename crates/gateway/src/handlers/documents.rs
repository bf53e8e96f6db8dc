//! Upload handler

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use pdfintellect_common::errors::{AppError, Result};

/// Multipart field carrying the PDF
const FILE_FIELD: &str = "file";

#[derive(Serialize)]
pub struct UploadResponse {
    pub upload_id: Uuid,
    pub filename: String,
    pub status: String,
    pub message: String,
    pub size_bytes: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Store an uploaded PDF under its sanitized name
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let upload_id = Uuid::new_v4();
    let limit = state.config.server.max_upload_size;

    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::InvalidFormat {
        message: format!("Failed to read multipart field: {}", e),
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let raw_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::MissingField {
                field: "file.filename".to_string(),
            })?;

        let data = field.bytes().await.map_err(|e| AppError::Upload {
            message: format!("Failed to read file: {}", e),
        })?;

        if data.len() > limit {
            return Err(AppError::PayloadTooLarge {
                size: data.len(),
                limit,
            });
        }

        let filename = state.store.save(&raw_name, &data).await?;

        tracing::info!(
            upload_id = %upload_id,
            file = %filename,
            bytes = data.len(),
            "PDF uploaded"
        );

        return Ok(Json(UploadResponse {
            upload_id,
            message: format!("File {} uploaded successfully", filename),
            filename,
            status: "success".to_string(),
            size_bytes: data.len(),
            uploaded_at: Utc::now(),
        }));
    }

    Err(AppError::MissingField {
        field: FILE_FIELD.to_string(),
    })
}
