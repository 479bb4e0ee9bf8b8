use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Style label the user picks for the generated résumé.
/// Only flows into the prompt; the exporters render every template the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResumeTemplate {
    #[default]
    #[serde(rename = "Modern Tech")]
    ModernTech,
    #[serde(rename = "Classic Professional")]
    ClassicProfessional,
    #[serde(rename = "Minimal ATS")]
    MinimalAts,
}

impl ResumeTemplate {
    pub const fn label(self) -> &'static str {
        match self {
            ResumeTemplate::ModernTech => "Modern Tech",
            ResumeTemplate::ClassicProfessional => "Classic Professional",
            ResumeTemplate::MinimalAts => "Minimal ATS",
        }
    }
}

impl fmt::Display for ResumeTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One form submission. All text fields are opaque; absent fields become empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResumeRequest {
    pub name: String,
    pub location: String,
    pub email: String,
    pub template: ResumeTemplate,
    pub experience: String,
    pub skills: String,
    pub projects: String,
    pub need_cover_letter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(ExportFormat::Pdf),
            "docx" => Some(ExportFormat::Docx),
            _ => None,
        }
    }
}

/// A freshly written temp file. Never deleted by this service.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub format: ExportFormat,
}

/// Everything one submission produces.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocuments {
    pub resume: String,
    /// Empty when no cover letter was requested.
    pub cover_letter: String,
    pub pdf: ExportedFile,
    pub docx: ExportedFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_missing_fields_default_to_empty() {
        let request: ResumeRequest =
            serde_json::from_value(serde_json::json!({ "name": "Jane Doe" })).unwrap();
        assert_eq!(request.name, "Jane Doe");
        assert_eq!(request.email, "");
        assert_eq!(request.template, ResumeTemplate::ModernTech);
        assert!(!request.need_cover_letter);
    }

    #[test]
    fn test_template_uses_display_labels_on_the_wire() {
        let request: ResumeRequest = serde_json::from_value(serde_json::json!({
            "name": "Jane Doe",
            "template": "Minimal ATS",
            "need_cover_letter": true
        }))
        .unwrap();
        assert_eq!(request.template, ResumeTemplate::MinimalAts);
        assert_eq!(request.template.to_string(), "Minimal ATS");
        assert!(request.need_cover_letter);
    }

    #[test]
    fn test_unknown_template_is_rejected() {
        let result: Result<ResumeRequest, _> =
            serde_json::from_value(serde_json::json!({ "template": "Baroque" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_export_format_extension_round_trip() {
        for format in [ExportFormat::Pdf, ExportFormat::Docx] {
            assert_eq!(ExportFormat::from_extension(format.extension()), Some(format));
        }
        assert_eq!(ExportFormat::from_extension("txt"), None);
    }
}
