// All generation prompt constants for the interview flow.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for question-generation calls.
pub const INTERVIEWER_SYSTEM: &str = "You are an expert technical interviewer \
    conducting a structured interview with a job candidate. \
    Ask one question at a time.";

/// First-question prompt. Replace `{cv_summary}` and `{job_description}`.
pub const FIRST_QUESTION_PROMPT_TEMPLATE: &str = r#"The following is a professional summary of a candidate's CV:

"""
{cv_summary}
"""

The candidate is interviewing for this role:

"""
{job_description}
"""

Ask the FIRST interview question. It must be entry-level, welcoming, and free
of technical jargon — something any candidate could start talking about.

{single_question_instruction}"#;

/// Follow-up question prompt. Replace `{cv_summary}`, `{job_description}`,
/// and `{transcript}`.
pub const NEXT_QUESTION_PROMPT_TEMPLATE: &str = r#"You are continuing an interview.

Candidate CV summary:
"""
{cv_summary}
"""

Role:
"""
{job_description}
"""

Conversation so far:
{transcript}

Based on the candidate's last answer, ask the next question. Each question
must be strictly more technically demanding than the one before it, and you
must NEVER repeat or rephrase a question already asked above.

{single_question_instruction}"#;

/// System prompt for the evaluation call. The strict-JSON instruction
/// fragment is appended at call time.
pub const EVALUATION_SYSTEM: &str =
    "You are a senior technical interviewer scoring a completed interview.";

/// Evaluation prompt. Replace `{transcript}` and `{violations}`.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"The following is a completed interview transcript.

Interview Transcript:
{transcript}

Policy violations observed during the interview:
{violations}

Evaluate each individual answer. For every question in the transcript, produce:
- "question": the question asked
- "answer": the candidate's answer
- "score": an integer from 0 to 20
- "feedback": 1-2 sentences of feedback on that specific answer
- "masked": true if the answer appears copied, scripted, or evasive, else false

Then also include:
- "total_score": the sum of the individual scores (out of 100)
- "overall_feedback": a 2-3 sentence summary of the candidate's performance,
  taking the violations above into account

Return ONLY a valid JSON object exactly like this, with NO extra commentary:

{
  "questions": [
    {"question": "...", "answer": "...", "score": 18, "feedback": "...", "masked": false}
  ],
  "total_score": 84,
  "overall_feedback": "..."
}"#;

/// Fixed questions used when the generation backend is unreachable. The
/// interview flow never hard-stops on a transient generation failure.
pub const FALLBACK_QUESTIONS: [&str; 5] = [
    "Tell me about yourself.",
    "What motivates you?",
    "Describe a challenge you overcame.",
    "Where do you see yourself in 5 years?",
    "Why do you want this role?",
];
