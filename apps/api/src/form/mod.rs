//! The submission form served at `GET /`.
//!
//! Fields are data, not code: `FORM_FIELDS` lists every input with its kind,
//! default and constraints, and the page is rendered from that table. The page
//! posts JSON to `/api/v1/generate` and shows the texts plus download links.

use axum::response::Html;
use quick_xml::escape::escape;

use crate::models::resume::ResumeTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line text input.
    Text,
    /// Multi-line text area with a visible height in rows.
    TextArea { rows: u8 },
    /// One of a fixed set of labels.
    Choice { options: &'static [&'static str] },
    Checkbox,
}

#[derive(Debug, Clone, Copy)]
pub struct FormField {
    /// JSON key in `ResumeRequest`.
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Initial value; `"true"` / `"false"` for checkboxes.
    pub default: &'static str,
    pub required: bool,
}

const TEMPLATE_LABELS: [&str; 3] = [
    ResumeTemplate::ModernTech.label(),
    ResumeTemplate::ClassicProfessional.label(),
    ResumeTemplate::MinimalAts.label(),
];

pub static FORM_FIELDS: [FormField; 8] = [
    FormField {
        name: "name",
        label: "Full Name",
        kind: FieldKind::Text,
        default: "Habib Rahimi",
        required: true,
    },
    FormField {
        name: "location",
        label: "Location",
        kind: FieldKind::Text,
        default: "Boise, ID",
        required: false,
    },
    FormField {
        name: "email",
        label: "Email",
        kind: FieldKind::Text,
        default: "habib@email.com",
        required: false,
    },
    FormField {
        name: "template",
        label: "Resume Template",
        kind: FieldKind::Choice {
            options: &TEMPLATE_LABELS,
        },
        default: "Modern Tech",
        required: true,
    },
    FormField {
        name: "experience",
        label: "Experience",
        kind: FieldKind::TextArea { rows: 6 },
        default: "- Web Developer — Python & WordPress\n- Integrated AI APIs\n- Freelance for small businesses",
        required: false,
    },
    FormField {
        name: "skills",
        label: "Skills",
        kind: FieldKind::Text,
        default: "Python, WordPress, OpenAI API, Gradio, Streamlit, GitHub",
        required: false,
    },
    FormField {
        name: "projects",
        label: "Projects (with links if possible)",
        kind: FieldKind::TextArea { rows: 4 },
        default: "- AI Resume Generator\n- WordPress Business Site\n- Streamlit AI App",
        required: false,
    },
    FormField {
        name: "need_cover_letter",
        label: "Generate Cover Letter",
        kind: FieldKind::Checkbox,
        default: "true",
        required: false,
    },
];

const PAGE_TITLE: &str = "AI Resume & Cover Letter Generator";
const PAGE_DESCRIPTION: &str =
    "Portfolio-grade resume builder with PDF + Word export. ATS-safe. Unicode-safe.";

/// GET /
pub async fn handle_form_page() -> Html<String> {
    Html(render_page(&FORM_FIELDS))
}

fn render_field(field: &FormField) -> String {
    let label = escape(field.label);
    let default = escape(field.default);
    let required = if field.required { " required" } else { "" };

    let input = match field.kind {
        FieldKind::Text => format!(
            r#"<input type="text" id="{name}" name="{name}" value="{default}"{required}>"#,
            name = field.name,
        ),
        FieldKind::TextArea { rows } => format!(
            r#"<textarea id="{name}" name="{name}" rows="{rows}"{required}>{default}</textarea>"#,
            name = field.name,
        ),
        FieldKind::Choice { options } => {
            let options: String = options
                .iter()
                .map(|option| {
                    let selected = if *option == field.default { " selected" } else { "" };
                    format!(
                        r#"<option value="{value}"{selected}>{value}</option>"#,
                        value = escape(*option)
                    )
                })
                .collect();
            format!(
                r#"<select id="{name}" name="{name}"{required}>{options}</select>"#,
                name = field.name,
            )
        }
        FieldKind::Checkbox => {
            let checked = if field.default == "true" { " checked" } else { "" };
            format!(
                r#"<input type="checkbox" id="{name}" name="{name}"{checked}>"#,
                name = field.name,
            )
        }
    };

    format!(
        r#"<div class="field"><label for="{name}">{label}</label>{input}</div>"#,
        name = field.name,
    )
}

/// Renders the full HTML page for a field table.
pub fn render_page(fields: &[FormField]) -> String {
    let inputs: String = fields.iter().map(render_field).collect();
    let title = escape(PAGE_TITLE);
    let description = escape(PAGE_DESCRIPTION);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; }}
.field {{ display: flex; flex-direction: column; margin-bottom: 0.75rem; }}
textarea, input[type=text], select {{ font: inherit; padding: 0.4rem; }}
pre {{ white-space: pre-wrap; background: #f5f5f5; padding: 1rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>{description}</p>
<form id="resume-form">
{inputs}
<button type="submit">Submit</button>
</form>
<p id="status"></p>
<h2>Resume Preview</h2>
<pre id="resume"></pre>
<h2>Cover Letter</h2>
<pre id="cover_letter"></pre>
<p><a id="pdf" hidden>Download PDF</a> <a id="docx" hidden>Download DOCX</a></p>
<script>
document.getElementById("resume-form").addEventListener("submit", async (event) => {{
  event.preventDefault();
  const form = event.target;
  const body = {{}};
  for (const element of form.elements) {{
    if (!element.name) continue;
    body[element.name] = element.type === "checkbox" ? element.checked : element.value;
  }}
  const status = document.getElementById("status");
  status.textContent = "Generating...";
  const response = await fetch("/api/v1/generate", {{
    method: "POST",
    headers: {{ "Content-Type": "application/json" }},
    body: JSON.stringify(body),
  }});
  const payload = await response.json();
  if (!response.ok) {{
    status.textContent = "Error: " + payload.error.message;
    return;
  }}
  status.textContent = "";
  document.getElementById("resume").textContent = payload.resume;
  document.getElementById("cover_letter").textContent = payload.cover_letter;
  for (const format of ["pdf", "docx"]) {{
    const link = document.getElementById(format);
    link.href = payload[format].download_url;
    link.hidden = false;
  }}
}});
</script>
</body>
</html>
"#
    )
}
