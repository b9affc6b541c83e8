// Cross-cutting prompt fragments shared by capability prompt templates.

/// Instruction fragment for calls whose output is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction fragment for calls that must return a single question.
pub const SINGLE_QUESTION_INSTRUCTION: &str =
    "Return ONLY the question text — no numbering, no preamble, no commentary.";

/// Default system prompt for recruitment-facing generation calls.
pub const RECRUITMENT_SYSTEM: &str = "You are an experienced technical recruiter \
    assisting a hiring team. Be professional, specific, and concise.";
