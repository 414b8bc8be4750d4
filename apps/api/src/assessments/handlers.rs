//! Axum route handlers for recruiter-authored assessments.
//!
//! Assessments are immutable after creation: there is no update or delete
//! surface, the engine only ever reads them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use tracing::info;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::errors::AppError;
use crate::models::assessment::{AssessmentConfig, AssessmentRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentRequest {
    pub job_role: String,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub config: AssessmentConfig,
}

/// POST /assessments
pub async fn handle_create_assessment(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<CreateAssessmentRequest>,
) -> Result<(StatusCode, Json<AssessmentRow>), AppError> {
    if request.job_role.trim().is_empty() {
        return Err(AppError::Validation("jobRole cannot be empty".to_string()));
    }

    let assessment = AssessmentRow {
        id: Uuid::new_v4(),
        job_role: request.job_role.trim().to_string(),
        questions: request.questions,
        config: SqlJson(request.config),
        created_by: caller.0,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO assessments (id, job_role, questions, config, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(assessment.id)
    .bind(&assessment.job_role)
    .bind(&assessment.questions)
    .bind(&assessment.config)
    .bind(assessment.created_by)
    .bind(assessment.created_at)
    .execute(&state.db)
    .await?;

    info!(
        "Recruiter {} created assessment {} ({})",
        assessment.created_by, assessment.id, assessment.job_role
    );

    Ok((StatusCode::CREATED, Json(assessment)))
}

/// GET /assessments/:assessment_id
pub async fn handle_get_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<Uuid>,
) -> Result<Json<AssessmentRow>, AppError> {
    let assessment =
        sqlx::query_as::<_, AssessmentRow>("SELECT * FROM assessments WHERE id = $1")
            .bind(assessment_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assessment {assessment_id} not found")))?;

    Ok(Json(assessment))
}
