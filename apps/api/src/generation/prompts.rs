// Instruction builders for the two completion calls.
// Fields are embedded verbatim: no escaping, no trimming.

use crate::models::resume::ResumeRequest;

/// Output cap for the résumé call.
pub const RESUME_MAX_TOKENS: u32 = 900;
/// Output cap for the cover-letter call.
pub const COVER_LETTER_MAX_TOKENS: u32 = 500;

/// Builds the résumé instruction from a form submission.
pub fn build_resume_prompt(request: &ResumeRequest) -> String {
    format!(
        "
Create a {template} professional resume in clean Markdown.
Make it ATS-optimized, concise, and impactful.

Name: {name}
Location: {location}
Email: {email}

Experience:
{experience}

Skills:
{skills}

Projects:
{projects}
",
        template = request.template,
        name = request.name,
        location = request.location,
        email = request.email,
        experience = request.experience,
        skills = request.skills,
        projects = request.projects,
    )
}

/// Builds the cover-letter instruction around an already generated résumé.
pub fn build_cover_letter_prompt(resume: &str) -> String {
    format!("Write a tailored cover letter for this resume:\n{resume}")
}
