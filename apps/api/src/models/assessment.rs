use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Recruiter-authored interview template. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRow {
    pub id: Uuid,
    pub job_role: String,
    /// Recruiter-authored seed question bank. The AI-driven flow does not
    /// consume these turn-by-turn; they seed assessment intent.
    pub questions: Vec<String>,
    pub config: Json<AssessmentConfig>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Assessment configuration: interview type, difficulty, interviewer persona.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentConfig {
    #[serde(rename = "type", default)]
    pub assessment_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub persona: Option<String>,
}
