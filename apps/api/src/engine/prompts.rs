// All LLM prompt constants for the assessment engine. Prompts live next to
// the gateway that sends them; llm_client stays prompt-free.

use crate::models::session::{Sender, TranscriptEntry};

/// System prompt for next-question generation — plain text output.
pub const NEXT_QUESTION_SYSTEM: &str = "You are an AI technical interviewer. \
    You ask one professional, concise, challenging but fair interview \
    question at a time. \
    Output ONLY the question text — no numbering, no preamble, no markdown.";

/// Next-question prompt template. Replace `{job_role}` and `{history}`
/// before sending.
pub const NEXT_QUESTION_PROMPT_TEMPLATE: &str = r#"You are interviewing a candidate for the role of {job_role}.

Interview History:
{history}

Based on the history (or starting from scratch if it is empty), generate the next interview question.
- If this is the start, ask a relevant opening question about their background or core skills.
- If the candidate just answered, ask a follow-up or move to the next relevant topic.
- Keep the question professional, concise, and challenging but fair.
- Do NOT repeat questions.
- Output ONLY the question text."#;

/// System prompt for answer evaluation — enforces JSON-only output.
pub const EVALUATION_SYSTEM: &str = "You are a rigorous technical interview \
    evaluator. You score candidate answers on a 0-10 scale. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Evaluation prompt template. Replace `{job_role}`, `{question}`,
/// `{answer}`.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Role: {job_role}
Question: "{question}"
Candidate Answer: "{answer}"

Evaluate the answer based on:
1. Relevance (0-10)
2. Clarity (0-10)
3. Technical Correctness (0-10)

Provide a JSON output ONLY:
{
  "score": 7,
  "feedback": "One or two sentences of feedback.",
  "metrics": {
    "relevance": 7,
    "clarity": 7,
    "correctness": 7
  }
}

"score" is the overall 0-10 score for the answer."#;

/// System prompt for final report synthesis — enforces JSON-only output.
pub const REPORT_SYSTEM: &str = "You are a senior technical recruiter and \
    career coach writing final interview assessment reports. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Report prompt template. Replace `{job_role}`, `{transcript}`,
/// `{evaluations_json}`.
pub const REPORT_PROMPT_TEMPLATE: &str = r#"Job Role: {job_role}

Interview Transcript:
{transcript}

Per-Question Evaluations:
{evaluations_json}

Generate a final assessment report in JSON format ONLY:
{
    "metrics": {
        "strengths": ["string", "string"],
        "weaknesses": ["string", "string"],
        "communicationScore": 7
    },
    "candidateReport": "Constructive feedback for the candidate (2 paragraphs)",
    "recruiterReport": "Summary for the hiring manager (2 paragraphs)"
}

"communicationScore" is a 0-10 score."#;

/// Renders the transcript the way every prompt embeds it: one line per turn,
/// AI turns labeled `Interviewer`, candidate turns labeled `Candidate`.
pub fn format_transcript(transcript: &[TranscriptEntry]) -> String {
    transcript
        .iter()
        .map(|t| {
            let label = match t.sender {
                Sender::Ai => "Interviewer",
                Sender::User => "Candidate",
            };
            format!("{label}: {}", t.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn turn(sender: Sender, content: &str) -> TranscriptEntry {
        TranscriptEntry {
            sender,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_format_transcript_labels_turns() {
        let transcript = vec![
            turn(Sender::Ai, "What is borrowing?"),
            turn(Sender::User, "Taking a reference."),
        ];
        let rendered = format_transcript(&transcript);
        assert_eq!(
            rendered,
            "Interviewer: What is borrowing?\nCandidate: Taking a reference."
        );
    }

    #[test]
    fn test_format_transcript_empty_is_empty_string() {
        assert_eq!(format_transcript(&[]), "");
    }

    #[test]
    fn test_templates_carry_their_placeholders() {
        assert!(NEXT_QUESTION_PROMPT_TEMPLATE.contains("{job_role}"));
        assert!(NEXT_QUESTION_PROMPT_TEMPLATE.contains("{history}"));
        assert!(EVALUATION_PROMPT_TEMPLATE.contains("{question}"));
        assert!(EVALUATION_PROMPT_TEMPLATE.contains("{answer}"));
        assert!(REPORT_PROMPT_TEMPLATE.contains("{transcript}"));
        assert!(REPORT_PROMPT_TEMPLATE.contains("{evaluations_json}"));
    }
}
