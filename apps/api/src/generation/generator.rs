//! Résumé generation pipeline.
//!
//! Flow: build prompt → résumé completion → (optional) cover-letter completion
//!       → PDF export → DOCX export → response.
//!
//! Completion calls run one after the other because the cover letter embeds the
//! résumé. Exports run afterwards inside a single `spawn_blocking` task. The
//! first failure anywhere aborts the request; nothing partial is returned.

use tracing::info;

use crate::errors::AppError;
use crate::export::{export_docx, export_pdf, ExportSettings};
use crate::generation::prompts::{
    build_cover_letter_prompt, build_resume_prompt, COVER_LETTER_MAX_TOKENS, RESUME_MAX_TOKENS,
};
use crate::llm_client::prompts::{COVER_LETTER_WRITER_SYSTEM, RESUME_WRITER_SYSTEM};
use crate::llm_client::{CompletionRequest, CompletionService};
use crate::models::resume::{GeneratedDocuments, ResumeRequest};

/// Text produced by the completion step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    pub resume: String,
    /// Empty when no cover letter was requested.
    pub cover_letter: String,
}

/// Rejects submissions that cannot produce a meaningful résumé.
pub fn validate_request(request: &ResumeRequest) -> Result<(), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    let email = request.email.trim();
    if !email.is_empty() && !email.contains('@') {
        return Err(AppError::Validation(format!(
            "email '{email}' is not a valid address"
        )));
    }
    Ok(())
}

/// Runs one or two completion calls for a submission.
pub async fn generate_text(
    llm: &dyn CompletionService,
    request: &ResumeRequest,
) -> Result<GeneratedText, AppError> {
    info!("Generating {} resume", request.template);
    let resume = llm
        .complete(&CompletionRequest {
            system: RESUME_WRITER_SYSTEM.to_string(),
            prompt: build_resume_prompt(request),
            max_output_tokens: RESUME_MAX_TOKENS,
        })
        .await?;
    info!("Resume generated ({} chars)", resume.len());

    let cover_letter = if request.need_cover_letter {
        let letter = llm
            .complete(&CompletionRequest {
                system: COVER_LETTER_WRITER_SYSTEM.to_string(),
                prompt: build_cover_letter_prompt(&resume),
                max_output_tokens: COVER_LETTER_MAX_TOKENS,
            })
            .await?;
        info!("Cover letter generated ({} chars)", letter.len());
        letter
    } else {
        String::new()
    };

    Ok(GeneratedText {
        resume,
        cover_letter,
    })
}

/// Full pipeline: generate text, then export the résumé as PDF and DOCX.
pub async fn generate_documents(
    llm: &dyn CompletionService,
    settings: &ExportSettings,
    request: &ResumeRequest,
) -> Result<GeneratedDocuments, AppError> {
    let GeneratedText {
        resume,
        cover_letter,
    } = generate_text(llm, request).await?;

    let text = resume.clone();
    let settings = settings.clone();
    let (pdf, docx) = tokio::task::spawn_blocking(move || {
        let pdf = export_pdf(&text, &settings.dir, &settings.layout, settings.pdf)?;
        let docx = export_docx(&text, &settings.dir)?;
        Ok::<_, crate::export::ExportError>((pdf, docx))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in export: {e}")))??;

    info!(
        "Exported {} and {}",
        pdf.path.display(),
        docx.path.display()
    );

    Ok(GeneratedDocuments {
        resume,
        cover_letter,
        pdf,
        docx,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
