//! Axum route handlers for the Generation API.

use std::path::{Path as FsPath, PathBuf};

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::FILE_PREFIX;
use crate::generation::generator::{generate_documents, validate_request};
use crate::models::resume::{ExportFormat, ExportedFile, ResumeRequest};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FileLink {
    pub file_name: String,
    pub path: PathBuf,
    pub format: ExportFormat,
    pub download_url: String,
}

impl From<ExportedFile> for FileLink {
    fn from(file: ExportedFile) -> Self {
        Self {
            download_url: format!("/api/v1/files/{}", file.file_name),
            file_name: file.file_name,
            path: file.path,
            format: file.format,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Correlates the response with the server log lines for this submission.
    pub request_id: Uuid,
    pub resume: String,
    pub cover_letter: String,
    pub pdf: FileLink,
    pub docx: FileLink,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/generate
///
/// Drafts the résumé (and optionally a cover letter), exports PDF + DOCX,
/// and returns the texts alongside download links.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<ResumeRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    validate_request(&request)?;

    let request_id = Uuid::new_v4();
    let documents = generate_documents(state.llm.as_ref(), &state.export, &request)
        .instrument(tracing::info_span!("generate", %request_id))
        .await?;
    info!(%request_id, "Generation complete");

    Ok(Json(GenerateResponse {
        request_id,
        resume: documents.resume,
        cover_letter: documents.cover_letter,
        pdf: documents.pdf.into(),
        docx: documents.docx.into(),
    }))
}

/// GET /api/v1/files/:file_name
///
/// Serves a previously exported file from the export directory.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    let (path, format) = resolve_export_path(&state.export.dir, &file_name)?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("File {file_name} not found")));
        }
        Err(e) => return Err(AppError::Internal(e.into())),
    };

    let headers = [
        (header::CONTENT_TYPE, format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ),
    ];
    Ok((headers, Bytes::from(bytes)).into_response())
}

/// Maps a requested name onto the export directory. Only names this service
/// could have produced are accepted, which also rules out path traversal.
fn resolve_export_path(dir: &FsPath, file_name: &str) -> Result<(PathBuf, ExportFormat), AppError> {
    let well_formed = file_name.starts_with(FILE_PREFIX)
        && !file_name.contains("..")
        && file_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !well_formed {
        return Err(AppError::Validation(format!("invalid file name '{file_name}'")));
    }

    let format = FsPath::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ExportFormat::from_extension)
        .ok_or_else(|| AppError::Validation(format!("unsupported file type '{file_name}'")))?;

    Ok((dir.join(file_name), format))
}
