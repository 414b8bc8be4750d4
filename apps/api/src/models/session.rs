//! Persisted shapes of an assessment session.
//!
//! The session is stored as one whole-document row; transcript, responses,
//! and metrics live in JSONB sub-documents. The mutation rules over these
//! shapes (the state machine proper) live in `engine::session`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Status state machine
// ────────────────────────────────────────────────────────────────────────────

/// Session lifecycle state. Transitions are monotonic and forward-only:
/// `initialized → in-progress → completed`, with `expired` terminal and
/// reachable from either live state by time-based logic. No state is ever
/// revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Initialized,
    InProgress,
    Completed,
    Expired,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initialized => "initialized",
            SessionStatus::InProgress => "in-progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Expired => "expired",
        }
    }

    /// Terminal states accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Expired)
    }

    /// Whether `next` is a legal forward transition from `self`.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Initialized, SessionStatus::InProgress)
                | (SessionStatus::Initialized, SessionStatus::Expired)
                | (SessionStatus::InProgress, SessionStatus::Completed)
                | (SessionStatus::InProgress, SessionStatus::Expired)
        )
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initialized" => Ok(SessionStatus::Initialized),
            "in-progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            "expired" => Ok(SessionStatus::Expired),
            other => Err(anyhow::anyhow!("Unknown session status '{other}'")),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transcript
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Ai,
    User,
}

/// One conversational turn. The transcript is append-only and never
/// reordered or truncated; it is the full conversational ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Responses and evaluations
// ────────────────────────────────────────────────────────────────────────────

/// Per-answer evaluation produced by the model gateway. All scores are on a
/// 0–10 scale; values outside that range are rejected at the gateway and
/// replaced by the neutral fallback, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: f64,
    pub feedback: String,
    pub metrics: EvaluationMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub relevance: f64,
    pub clarity: f64,
    pub correctness: f64,
}

impl Evaluation {
    /// Strict range check on parsed model output: every score must sit
    /// within 0–10. A violation is treated exactly like a parse failure.
    pub fn is_within_range(&self) -> bool {
        let in_range = |v: f64| (0.0..=10.0).contains(&v);
        in_range(self.score)
            && in_range(self.metrics.relevance)
            && in_range(self.metrics.clarity)
            && in_range(self.metrics.correctness)
    }
}

/// One candidate answer plus its evaluation, recorded after evaluation
/// completes. Append-only, one entry per answered question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub question_id: Uuid,
    pub question_text: String,
    pub answer_text: String,
    pub evaluation: Option<Evaluation>,
    pub timestamp: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregate metrics
// ────────────────────────────────────────────────────────────────────────────

/// Write-once aggregate metrics, populated only at completion — never
/// partially.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub communication_score: Option<f64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Row
// ────────────────────────────────────────────────────────────────────────────

/// Raw session row. `engine::store` converts between this and the typed
/// `SessionDocument` exactly once at the load/save boundary.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub candidate_id: Uuid,
    pub status: String,
    pub version: i64,
    pub transcript: Json<Vec<TranscriptEntry>>,
    pub responses: Json<Vec<ResponseRecord>>,
    pub metrics: Json<SessionMetrics>,
    pub candidate_report: Option<String>,
    pub recruiter_report: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::InProgress).unwrap(),
            r#""in-progress""#
        );
        assert_eq!(
            serde_json::to_string(&SessionStatus::Completed).unwrap(),
            r#""completed""#
        );
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            SessionStatus::Initialized,
            SessionStatus::InProgress,
            SessionStatus::Completed,
            SessionStatus::Expired,
        ] {
            assert_eq!(SessionStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(SessionStatus::from_str("paused").is_err());
    }

    #[test]
    fn test_forward_transitions_are_legal() {
        use SessionStatus::*;
        assert!(Initialized.can_transition_to(InProgress));
        assert!(Initialized.can_transition_to(Expired));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Expired));
    }

    #[test]
    fn test_no_transition_reverses_or_leaves_terminal() {
        use SessionStatus::*;
        for terminal in [Completed, Expired] {
            assert!(terminal.is_terminal());
            for next in [Initialized, InProgress, Completed, Expired] {
                assert!(!terminal.can_transition_to(next));
            }
        }
        assert!(!InProgress.can_transition_to(Initialized));
        assert!(!Initialized.can_transition_to(Completed));
    }

    #[test]
    fn test_sender_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sender::Ai).unwrap(), r#""ai""#);
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), r#""user""#);
    }

    #[test]
    fn test_evaluation_range_check() {
        let mut eval = Evaluation {
            score: 7.0,
            feedback: "Solid answer.".to_string(),
            metrics: EvaluationMetrics {
                relevance: 8.0,
                clarity: 6.0,
                correctness: 7.0,
            },
        };
        assert!(eval.is_within_range());

        eval.score = 11.0;
        assert!(!eval.is_within_range());

        eval.score = 7.0;
        eval.metrics.clarity = -1.0;
        assert!(!eval.is_within_range());
    }

    #[test]
    fn test_response_record_wire_shape_is_camel_case() {
        let record = ResponseRecord {
            question_id: Uuid::new_v4(),
            question_text: "What is ownership?".to_string(),
            answer_text: "A move semantics model.".to_string(),
            evaluation: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("questionText").is_some());
        assert!(json.get("answerText").is_some());
        assert!(json.get("question_text").is_none());
    }

    #[test]
    fn test_metrics_default_is_empty() {
        let metrics: SessionMetrics = serde_json::from_str("{}").unwrap();
        assert!(metrics.overall_score.is_none());
        assert!(metrics.strengths.is_empty());
        assert!(metrics.weaknesses.is_empty());
        assert!(metrics.communication_score.is_none());
    }
}
