//! The assessment session document and its mutation rules.
//!
//! Everything here is pure: the orchestrator loads a document, applies these
//! mutators in memory, and persists the result in a single version-checked
//! write. Keeping the state machine synchronous makes every invariant in
//! this file unit-testable without a database or a model backend.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::gateway::Report;
use crate::models::session::{
    Evaluation, ResponseRecord, Sender, SessionMetrics, SessionStatus, TranscriptEntry,
};

/// Fixed question quota: recording the answer that reaches this count forces
/// completion within the same operation.
pub const QUESTION_QUOTA: usize = 5;

/// Sessions expire one hour after they start.
pub const SESSION_TTL_SECS: i64 = 3600;

/// Defensive default used when no AI question precedes an answer. Should not
/// occur in practice: `start` always seeds the transcript with one AI turn.
pub const DEFAULT_CURRENT_QUESTION: &str = "Tell me about yourself.";

/// Session metadata timestamps. `completed_at` is set exactly once, on the
/// transition to `completed`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

/// One candidate's attempt at one assessment — the central mutable entity.
/// Serializes as the full session snapshot returned by the session endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub candidate_id: Uuid,
    pub status: SessionStatus,
    /// Optimistic-concurrency counter; storage concern, not part of the wire
    /// snapshot.
    #[serde(skip)]
    pub version: i64,
    pub transcript: Vec<TranscriptEntry>,
    pub responses: Vec<ResponseRecord>,
    pub metrics: SessionMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recruiter_report: Option<String>,
    pub metadata: SessionMetadata,
}

impl SessionDocument {
    /// Creates a fresh session directly in `in-progress` — the flow moves
    /// straight from creation to active, there is no observable
    /// `initialized` rest state.
    pub fn create(assessment_id: Uuid, candidate_id: Uuid, now: DateTime<Utc>) -> Self {
        SessionDocument {
            id: Uuid::new_v4(),
            assessment_id,
            candidate_id,
            status: SessionStatus::InProgress,
            version: 1,
            transcript: Vec::new(),
            responses: Vec::new(),
            metrics: SessionMetrics::default(),
            candidate_report: None,
            recruiter_report: None,
            metadata: SessionMetadata {
                started_at: now,
                completed_at: None,
                expires_at: now + Duration::seconds(SESSION_TTL_SECS),
            },
        }
    }

    /// Attempts the transition to `next`, refusing anything that is not a
    /// legal forward move. Returns whether the transition happened.
    pub fn transition_to(&mut self, next: SessionStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    pub fn append_ai_turn(&mut self, content: &str, now: DateTime<Utc>) {
        self.transcript.push(TranscriptEntry {
            sender: Sender::Ai,
            content: content.to_string(),
            timestamp: now,
        });
    }

    pub fn append_user_turn(&mut self, content: &str, now: DateTime<Utc>) {
        self.transcript.push(TranscriptEntry {
            sender: Sender::User,
            content: content.to_string(),
            timestamp: now,
        });
    }

    /// The most recent AI transcript entry, scanning backward. O(n) is fine:
    /// the transcript is bounded by the question quota (≤ ~11 entries).
    pub fn last_ai_question(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|t| t.sender == Sender::Ai)
            .map(|t| t.content.as_str())
    }

    /// The question the candidate is currently answering.
    pub fn current_question(&self) -> &str {
        self.last_ai_question().unwrap_or(DEFAULT_CURRENT_QUESTION)
    }

    /// Appends one answered-question record. The record carries a freshly
    /// generated question id and is created only after evaluation completed.
    pub fn record_response(
        &mut self,
        question: &str,
        answer: &str,
        evaluation: Option<Evaluation>,
        now: DateTime<Utc>,
    ) {
        self.responses.push(ResponseRecord {
            question_id: Uuid::new_v4(),
            question_text: question.to_string(),
            answer_text: answer.to_string(),
            evaluation,
            timestamp: now,
        });
    }

    pub fn quota_reached(&self) -> bool {
        self.responses.len() >= QUESTION_QUOTA
    }

    /// Arithmetic mean of recorded evaluation scores; a missing evaluation
    /// counts as 0.
    pub fn overall_score(&self) -> f64 {
        if self.responses.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .responses
            .iter()
            .map(|r| r.evaluation.as_ref().map(|e| e.score).unwrap_or(0.0))
            .sum();
        total / self.responses.len() as f64
    }

    /// All recorded evaluations, in answer order. Input to report synthesis.
    pub fn evaluations(&self) -> Vec<Evaluation> {
        self.responses
            .iter()
            .filter_map(|r| r.evaluation.clone())
            .collect()
    }

    /// Completion: transitions to `completed` and stamps `completed_at`,
    /// aggregate metrics, and both narrative reports together — the document
    /// is never observable with a partial completion.
    pub fn complete(&mut self, overall_score: f64, report: Report, now: DateTime<Utc>) -> bool {
        if !self.transition_to(SessionStatus::Completed) {
            return false;
        }
        self.metadata.completed_at = Some(now);
        self.metrics.overall_score = Some(overall_score);
        self.metrics.strengths = report.metrics.strengths;
        self.metrics.weaknesses = report.metrics.weaknesses;
        self.metrics.communication_score = Some(report.metrics.communication_score);
        self.candidate_report = Some(report.candidate_report);
        self.recruiter_report = Some(report.recruiter_report);
        true
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.metadata.expires_at
    }

    /// Time-based terminal transition. Legal only from the live states.
    pub fn expire(&mut self) -> bool {
        self.transition_to(SessionStatus::Expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::gateway::{Report, ReportMetrics};
    use crate::models::session::EvaluationMetrics;

    fn evaluation(score: f64) -> Evaluation {
        Evaluation {
            score,
            feedback: "ok".to_string(),
            metrics: EvaluationMetrics {
                relevance: score,
                clarity: score,
                correctness: score,
            },
        }
    }

    fn report() -> Report {
        Report {
            metrics: ReportMetrics {
                strengths: vec!["Clear communication".to_string()],
                weaknesses: vec!["Shallow on internals".to_string()],
                communication_score: 8.0,
            },
            candidate_report: "You did well.".to_string(),
            recruiter_report: "Strong candidate.".to_string(),
        }
    }

    fn fresh_session() -> SessionDocument {
        SessionDocument::create(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_create_starts_in_progress_with_one_hour_ttl() {
        let now = Utc::now();
        let session = SessionDocument::create(Uuid::new_v4(), Uuid::new_v4(), now);
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.version, 1);
        assert!(session.transcript.is_empty());
        assert!(session.responses.is_empty());
        assert_eq!(session.metadata.started_at, now);
        assert_eq!(
            session.metadata.expires_at - session.metadata.started_at,
            Duration::seconds(SESSION_TTL_SECS)
        );
        assert!(session.metadata.completed_at.is_none());
    }

    #[test]
    fn test_last_ai_question_scans_backward() {
        let now = Utc::now();
        let mut session = fresh_session();
        session.append_ai_turn("First question?", now);
        session.append_user_turn("First answer.", now);
        session.append_ai_turn("Second question?", now);
        session.append_user_turn("Second answer.", now);
        assert_eq!(session.last_ai_question(), Some("Second question?"));
    }

    #[test]
    fn test_current_question_falls_back_when_no_ai_turn() {
        let now = Utc::now();
        let mut session = fresh_session();
        assert_eq!(session.current_question(), DEFAULT_CURRENT_QUESTION);
        session.append_user_turn("Unprompted answer.", now);
        assert_eq!(session.current_question(), DEFAULT_CURRENT_QUESTION);
    }

    #[test]
    fn test_transcript_never_shorter_than_responses() {
        let now = Utc::now();
        let mut session = fresh_session();
        session.append_ai_turn("Q1?", now);
        session.append_user_turn("A1.", now);
        session.record_response("Q1?", "A1.", Some(evaluation(7.0)), now);
        assert!(session.transcript.len() >= session.responses.len());
    }

    #[test]
    fn test_response_records_get_unique_question_ids() {
        let now = Utc::now();
        let mut session = fresh_session();
        session.record_response("Q1?", "A1.", Some(evaluation(5.0)), now);
        session.record_response("Q2?", "A2.", Some(evaluation(5.0)), now);
        assert_ne!(
            session.responses[0].question_id,
            session.responses[1].question_id
        );
    }

    #[test]
    fn test_overall_score_is_arithmetic_mean() {
        let now = Utc::now();
        let mut session = fresh_session();
        for score in [8.0, 6.0, 7.0, 9.0, 5.0] {
            session.record_response("Q?", "A.", Some(evaluation(score)), now);
        }
        assert!((session.overall_score() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overall_score_treats_missing_evaluation_as_zero() {
        let now = Utc::now();
        let mut session = fresh_session();
        session.record_response("Q1?", "A1.", Some(evaluation(10.0)), now);
        session.record_response("Q2?", "A2.", None, now);
        assert!((session.overall_score() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quota_reached_at_five_responses() {
        let now = Utc::now();
        let mut session = fresh_session();
        for i in 0..QUESTION_QUOTA {
            assert!(!session.quota_reached(), "quota hit early at {i}");
            session.record_response("Q?", "A.", Some(evaluation(5.0)), now);
        }
        assert!(session.quota_reached());
    }

    #[test]
    fn test_complete_stamps_everything_atomically() {
        let now = Utc::now();
        let mut session = fresh_session();
        for _ in 0..QUESTION_QUOTA {
            session.record_response("Q?", "A.", Some(evaluation(6.0)), now);
        }
        let overall = session.overall_score();
        assert!(session.complete(overall, report(), now));

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.metadata.completed_at, Some(now));
        assert_eq!(session.metrics.overall_score, Some(6.0));
        assert_eq!(session.metrics.strengths, vec!["Clear communication"]);
        assert_eq!(session.metrics.weaknesses, vec!["Shallow on internals"]);
        assert_eq!(session.metrics.communication_score, Some(8.0));
        assert_eq!(session.candidate_report.as_deref(), Some("You did well."));
        assert_eq!(
            session.recruiter_report.as_deref(),
            Some("Strong candidate.")
        );
    }

    #[test]
    fn test_complete_refused_from_terminal_state() {
        let now = Utc::now();
        let mut session = fresh_session();
        assert!(session.complete(5.0, report(), now));

        let before = session.metrics.clone();
        assert!(!session.complete(9.0, report(), now));
        // second attempt must leave the document untouched
        assert_eq!(session.metrics.overall_score, before.overall_score);
        assert_eq!(session.status, SessionStatus::Completed);
    }

    #[test]
    fn test_expire_only_from_live_states() {
        let mut session = fresh_session();
        assert!(session.expire());
        assert_eq!(session.status, SessionStatus::Expired);
        assert!(!session.expire());

        let now = Utc::now();
        let mut done = fresh_session();
        assert!(done.complete(5.0, report(), now));
        assert!(!done.expire());
        assert_eq!(done.status, SessionStatus::Completed);
    }

    #[test]
    fn test_is_expired_at_uses_expiry_timestamp() {
        let now = Utc::now();
        let session = SessionDocument::create(Uuid::new_v4(), Uuid::new_v4(), now);
        assert!(!session.is_expired_at(now));
        assert!(!session.is_expired_at(now + Duration::seconds(SESSION_TTL_SECS)));
        assert!(session.is_expired_at(now + Duration::seconds(SESSION_TTL_SECS + 1)));
    }

    /// Full interview simulation at the document level: one seeded AI turn,
    /// then five answer rounds exactly as the orchestrator applies them.
    #[test]
    fn test_five_answer_flow_completes_with_bounded_transcript() {
        let now = Utc::now();
        let mut session = fresh_session();
        session.append_ai_turn("Opening question?", now);

        for round in 1..=QUESTION_QUOTA {
            session.append_user_turn("Answer.", now);
            let question = session.current_question().to_string();
            session.record_response(&question, "Answer.", Some(evaluation(7.0)), now);

            if session.quota_reached() {
                let overall = session.overall_score();
                assert!(session.complete(overall, report(), now));
            } else {
                session.append_ai_turn(&format!("Question {}?", round + 1), now);
            }
        }

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.responses.len(), QUESTION_QUOTA);
        // 1 opening AI turn + 5 user turns + 4 follow-up AI turns
        assert_eq!(session.transcript.len(), 10);
        assert!(session.transcript.len() >= session.responses.len());
    }

    #[test]
    fn test_snapshot_serializes_camel_case_with_nested_metadata() {
        let session = fresh_session();
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("assessmentId").is_some());
        assert!(json.get("candidateId").is_some());
        assert_eq!(json["status"], "in-progress");
        assert!(json["metadata"].get("startedAt").is_some());
        assert!(json["metadata"].get("expiresAt").is_some());
        // storage-only field stays off the wire
        assert!(json.get("version").is_none());
    }
}
