// Document exporters: résumé text → PDF / DOCX temp files.
// Both follow paragraph-per-line rendering: every non-blank line becomes exactly
// one paragraph, in order. Rendering is CPU-bound; async callers go through
// tokio::task::spawn_blocking.

pub mod docx;
pub mod font_metrics;
pub mod markup;
pub mod pdf;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::resume::{ExportFormat, ExportedFile};

pub use docx::export_docx;
pub use font_metrics::{default_pdf_layout, PdfLayout};
pub use pdf::{export_pdf, PdfOptions};

/// Every exported file name starts with this prefix; the download route relies on it.
pub const FILE_PREFIX: &str = "resume-";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("DOCX archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Paragraph markup error: {0}")]
    Markup(String),

    #[error("Text cannot be stored in the document: {0}")]
    InvalidText(String),
}

/// Where and how exported files are rendered. Built once at startup.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub dir: PathBuf,
    pub layout: PdfLayout,
    pub pdf: PdfOptions,
}

/// Yields the lines that become paragraphs: blank and whitespace-only lines are
/// skipped, a trailing `\r` from CRLF input is dropped, everything else is kept verbatim.
pub fn paragraph_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
}

/// Creates `resume-<random>.<ext>` in `dir`, hands the open file to `write`, then
/// flushes and syncs it.
///
/// The file is detached from tempfile's delete-on-drop guard before anything is
/// written: nothing here ever removes it, including after a failed render.
pub(crate) fn write_temp_file<F>(
    dir: &Path,
    format: ExportFormat,
    write: F,
) -> Result<ExportedFile, ExportError>
where
    F: FnOnce(&mut File) -> Result<(), ExportError>,
{
    let suffix = format!(".{}", format.extension());
    let (mut file, path) = tempfile::Builder::new()
        .prefix(FILE_PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)?
        .keep()
        .map_err(|e| e.error)?;

    write(&mut file)?;
    file.flush()?;
    file.sync_all()?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ExportedFile {
        path,
        file_name,
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_lines_skips_blank_lines() {
        let lines: Vec<&str> = paragraph_lines("Line one\n\nLine two").collect();
        assert_eq!(lines, vec!["Line one", "Line two"]);
    }

    #[test]
    fn test_paragraph_lines_whitespace_only_input() {
        assert_eq!(paragraph_lines("\n   \n\t\n").count(), 0);
        assert_eq!(paragraph_lines("").count(), 0);
    }

    #[test]
    fn test_paragraph_lines_keeps_inner_whitespace_and_handles_crlf() {
        let lines: Vec<&str> = paragraph_lines("  - indented \r\n\r\nnext\r\n").collect();
        assert_eq!(lines, vec!["  - indented ", "next"]);
    }

    #[test]
    fn test_write_temp_file_names_and_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let exported = write_temp_file(dir.path(), ExportFormat::Pdf, |file| {
            file.write_all(b"%PDF-1.5")?;
            Ok(())
        })
        .unwrap();

        assert!(exported.file_name.starts_with(FILE_PREFIX));
        assert!(exported.file_name.ends_with(".pdf"));
        assert_eq!(std::fs::read(&exported.path).unwrap(), b"%PDF-1.5");
    }

    #[test]
    fn test_write_temp_file_leaves_partial_file_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_temp_file(dir.path(), ExportFormat::Docx, |file| {
            file.write_all(b"PK")?;
            Err(ExportError::Xml("boom".into()))
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
