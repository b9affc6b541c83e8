// Generation prompt constants for the document-facing capabilities.

/// CV summarization prompt. Replace `{cv_text}` before sending.
pub const CV_SUMMARY_PROMPT_TEMPLATE: &str = r#"Analyze this candidate's CV and create a comprehensive summary:

CV CONTENT:
{cv_text}

Provide a detailed candidate summary covering:

1. PERSONAL INFORMATION: full name, contact information, professional title
2. PROFESSIONAL SUMMARY: years of experience, industry expertise, key specializations
3. TECHNICAL SKILLS: programming languages, frameworks and technologies, tools and platforms
4. WORK EXPERIENCE: current or most recent position, key achievements, notable projects
5. EDUCATION: degrees, institutions, relevant certifications
6. STRENGTHS: technical strengths, soft skills, growth potential

Provide a comprehensive, professional summary:"#;

/// Job-match analysis prompt. Replace `{cv_summary}` and `{job_summary}`.
/// The scored extraction downstream keys off the literal
/// `OVERALL MATCH SCORE:` marker — keep the heading wording stable.
pub const MATCH_PROMPT_TEMPLATE: &str = r#"Analyze the compatibility between this candidate and job position:

CANDIDATE PROFILE:
{cv_summary}

JOB REQUIREMENTS:
{job_summary}

Provide a comprehensive matching analysis:

1. OVERALL MATCH SCORE: [0-100%]

2. SKILL ALIGNMENT:
   - Perfectly Matching Skills: [list]
   - Partially Matching Skills: [list]
   - Missing Critical Skills: [list]

3. EXPERIENCE ANALYSIS:
   - Years of Experience Match: [Excellent/Good/Fair/Poor]
   - Industry Experience: [Relevant/Somewhat Relevant/Not Relevant]
   - Role Level Match: [Overqualified/Perfect Fit/Underqualified]

4. HIRING RECOMMENDATION:
   - Decision: [Strong Hire/Hire/Maybe/No Hire]
   - Confidence Level: [High/Medium/Low]
   - Reasons for recommendation

Provide detailed analysis:"#;

/// Recruitment email prompt. Replace `{job_title}`, `{job_description}`,
/// `{interview_date}`, `{closing_date}`, `{candidate_name}`,
/// `{candidate_email}`.
pub const EMAIL_PROMPT_TEMPLATE: &str = r#"You are an HR assistant writing a professional email from the company to the candidate regarding their job application.

Use the following details:

Job Title: {job_title}
Job Description: {job_description}
Interview Date: {interview_date}
Application Closing Date: {closing_date}
Candidate Name: {candidate_name}
Candidate Email: {candidate_email}

Write a formal recruitment email inviting the candidate to an interview on the
scheduled interview date. Include a polite greeting, confirmation of the
interview date and the position applied for, brief preparation instructions,
contact information for questions, and a professional closing, signed by the
Hiring Manager.

Format the email with a subject line and a professional body.

Generate the complete email below:"#;
