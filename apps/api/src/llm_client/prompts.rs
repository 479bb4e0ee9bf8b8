// Role framings sent as the system message of each completion call.
// Instruction templates live next to the code that fills them (generation/prompts.rs).

/// System prompt for the résumé call.
pub const RESUME_WRITER_SYSTEM: &str = "You are an expert technical resume writer.";

/// System prompt for the optional cover-letter call.
pub const COVER_LETTER_WRITER_SYSTEM: &str = "You write professional cover letters.";
