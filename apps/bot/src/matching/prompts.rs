//! Prompt construction for the scoring oracle. Prompts live beside their
//! consumer; no other module builds oracle prompts.

use crate::models::Posting;

/// Resume prefix sent with a match-scoring prompt. Truncation is a lossy,
/// accepted approximation to respect oracle input limits.
pub const MATCH_RESUME_CHARS: usize = 2000;
/// Resume prefix sent with an analysis prompt.
pub const ANALYSIS_RESUME_CHARS: usize = 3000;

/// Builds the match-scoring prompt: resume prefix + job fields + the
/// `Score:` output contract the parser relies on.
pub fn match_prompt(posting: &Posting, resume_text: &str) -> String {
    format!(
        "Resume:\n{resume}\n\n\
         Job Details:\n\
         Title: {title}\n\
         Company: {company}\n\
         Location: {location}\n\n\
         Task: Evaluate how well this candidate's profile matches the job.\n\n\
         Please provide:\n\
         1. A numerical match score (0-100)\n\
         2. 3-5 key strengths that make this candidate suitable\n\
         3. 1-2 potential gaps in the candidate's profile\n\
         4. 2-3 specific suggestions to improve candidacy for this role\n\n\
         Format your response as:\n\
         Score: [number]\n\
         Strengths: [bullet points]\n\
         Gaps: [bullet points]\n\
         Suggestions: [bullet points]",
        resume = truncate_chars(resume_text, MATCH_RESUME_CHARS),
        title = posting.title,
        company = posting.company,
        location = posting.location,
    )
}

/// Builds the resume-improvement prompt used by `/analyze`.
pub fn analysis_prompt(resume_text: &str, keywords: &[String]) -> String {
    format!(
        "Resume:\n{resume}\n\n\
         Job Keywords: {keywords}\n\n\
         Task: Provide specific suggestions to improve this resume for jobs \
         related to the keywords.\n\n\
         Please provide:\n\
         1. 3-5 specific improvements to make the resume more effective\n\
         2. 2-3 skills or experiences that should be highlighted more prominently\n\
         3. Any formatting or structure suggestions\n\n\
         Format your response as:\n\
         Improvements:\n- [improvement]\n\n\
         Skills to Highlight:\n- [skill]\n\n\
         Formatting Suggestions:\n- [suggestion]",
        resume = truncate_chars(resume_text, ANALYSIS_RESUME_CHARS),
        keywords = keywords.join(", "),
    )
}

/// Char-boundary-safe prefix.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
