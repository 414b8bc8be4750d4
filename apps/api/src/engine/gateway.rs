//! Model Gateway — the three request/response contracts against the hosted
//! generative-language provider.
//!
//! Every operation is TOTAL: a failed call, a timeout, unparsable output, or
//! an out-of-range score all collapse into a fixed fallback value. The
//! interview flow is never blocked or crashed by the provider; availability
//! is deliberately prioritized over AI quality.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::warn;

use crate::engine::prompts::{
    format_transcript, EVALUATION_PROMPT_TEMPLATE, EVALUATION_SYSTEM, NEXT_QUESTION_PROMPT_TEMPLATE,
    NEXT_QUESTION_SYSTEM, REPORT_PROMPT_TEMPLATE, REPORT_SYSTEM,
};
use crate::llm_client::LlmClient;
use crate::models::session::{Evaluation, EvaluationMetrics, TranscriptEntry};

/// Hard bound on every provider call. A stalled call is indistinguishable
/// from a failed one: both yield the fallback.
const GATEWAY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Question used whenever next-question generation is unavailable.
pub const FALLBACK_QUESTION: &str =
    "Could you tell me about your experience with this technology?";

const FALLBACK_FEEDBACK: &str = "Evaluation unavailable at this moment.";
const FALLBACK_REPORT: &str = "Report generation unavailable.";

// ────────────────────────────────────────────────────────────────────────────
// Report contract
// ────────────────────────────────────────────────────────────────────────────

/// Final report synthesized at completion. `metrics` is copied into the
/// session's aggregate metrics; the two narratives are stored verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub metrics: ReportMetrics,
    pub candidate_report: String,
    pub recruiter_report: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetrics {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub communication_score: f64,
}

impl Report {
    fn is_within_range(&self) -> bool {
        (0.0..=10.0).contains(&self.metrics.communication_score)
    }
}

/// Neutral evaluation substituted when the provider cannot score an answer.
pub fn fallback_evaluation() -> Evaluation {
    Evaluation {
        score: 5.0,
        feedback: FALLBACK_FEEDBACK.to_string(),
        metrics: EvaluationMetrics {
            relevance: 5.0,
            clarity: 5.0,
            correctness: 5.0,
        },
    }
}

/// Fixed report substituted when report synthesis is unavailable.
pub fn fallback_report() -> Report {
    Report {
        metrics: ReportMetrics {
            strengths: vec!["N/A".to_string()],
            weaknesses: vec!["N/A".to_string()],
            communication_score: 0.0,
        },
        candidate_report: FALLBACK_REPORT.to_string(),
        recruiter_report: FALLBACK_REPORT.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gateway trait
// ────────────────────────────────────────────────────────────────────────────

/// Capability object the orchestrator talks to. Constructed once at process
/// start and injected through app state — no global singleton. The methods
/// are infallible by contract; degradation is expressed through fallback
/// values, never through errors.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn next_question(&self, job_role: &str, transcript: &[TranscriptEntry]) -> String;

    async fn evaluate(&self, question: &str, answer: &str, job_role: &str) -> Evaluation;

    async fn report(
        &self,
        job_role: &str,
        transcript: &[TranscriptEntry],
        evaluations: &[Evaluation],
    ) -> Report;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini-backed implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct GeminiGateway {
    llm: LlmClient,
}

impl GeminiGateway {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    async fn next_question(&self, job_role: &str, transcript: &[TranscriptEntry]) -> String {
        let prompt = NEXT_QUESTION_PROMPT_TEMPLATE
            .replace("{job_role}", job_role)
            .replace("{history}", &format_transcript(transcript));

        match timeout(GATEWAY_TIMEOUT, self.llm.call(&prompt, NEXT_QUESTION_SYSTEM)).await {
            Ok(Ok(text)) => {
                let question = text.trim();
                if question.is_empty() {
                    warn!("Next-question call returned empty text, using fallback");
                    FALLBACK_QUESTION.to_string()
                } else {
                    question.to_string()
                }
            }
            Ok(Err(e)) => {
                warn!("Next-question call failed: {e}, using fallback");
                FALLBACK_QUESTION.to_string()
            }
            Err(_) => {
                warn!("Next-question call timed out, using fallback");
                FALLBACK_QUESTION.to_string()
            }
        }
    }

    async fn evaluate(&self, question: &str, answer: &str, job_role: &str) -> Evaluation {
        let prompt = EVALUATION_PROMPT_TEMPLATE
            .replace("{job_role}", job_role)
            .replace("{question}", question)
            .replace("{answer}", answer);

        match timeout(
            GATEWAY_TIMEOUT,
            self.llm.call_json::<Evaluation>(&prompt, EVALUATION_SYSTEM),
        )
        .await
        {
            Ok(Ok(evaluation)) if evaluation.is_within_range() => evaluation,
            Ok(Ok(_)) => {
                warn!("Evaluation scores out of 0-10 range, using fallback");
                fallback_evaluation()
            }
            Ok(Err(e)) => {
                warn!("Evaluation call failed: {e}, using fallback");
                fallback_evaluation()
            }
            Err(_) => {
                warn!("Evaluation call timed out, using fallback");
                fallback_evaluation()
            }
        }
    }

    async fn report(
        &self,
        job_role: &str,
        transcript: &[TranscriptEntry],
        evaluations: &[Evaluation],
    ) -> Report {
        let evaluations_json =
            serde_json::to_string_pretty(evaluations).unwrap_or_else(|_| "[]".to_string());
        let prompt = REPORT_PROMPT_TEMPLATE
            .replace("{job_role}", job_role)
            .replace("{transcript}", &format_transcript(transcript))
            .replace("{evaluations_json}", &evaluations_json);

        match timeout(
            GATEWAY_TIMEOUT,
            self.llm.call_json::<Report>(&prompt, REPORT_SYSTEM),
        )
        .await
        {
            Ok(Ok(report)) if report.is_within_range() => report,
            Ok(Ok(_)) => {
                warn!("Report communication score out of 0-10 range, using fallback");
                fallback_report()
            }
            Ok(Err(e)) => {
                warn!("Report call failed: {e}, using fallback");
                fallback_report()
            }
            Err(_) => {
                warn!("Report call timed out, using fallback");
                fallback_report()
            }
        }
    }
}
