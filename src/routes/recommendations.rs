use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{CareerGoalId, RecommendationRequest, RecommendationsResponse, StudentId},
    routes::AppState,
    services::recommend_courses,
};

/// Query string of the per-student endpoint
#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub career_goal_id: Option<CareerGoalId>,
    pub k: Option<usize>,
    pub enforce_prereqs: Option<bool>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationsResponse>> {
    run(state, request_id, request).await
}

/// Handler for `GET /students/:student_id/recommendations`
pub async fn recommend_for_student(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(student_id): Path<StudentId>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationsResponse>> {
    let request = RecommendationRequest {
        student_id,
        career_goal_id: query.career_goal_id,
        k: query.k,
        enforce_prereqs: query.enforce_prereqs,
    };
    run(state, request_id, request).await
}

async fn run(
    state: AppState,
    request_id: RequestId,
    request: RecommendationRequest,
) -> AppResult<Json<RecommendationsResponse>> {
    tracing::info!(
        request_id = %request_id,
        student_id = request.student_id,
        career_goal_id = ?request.career_goal_id,
        k = ?request.k,
        "Processing recommendation request"
    );

    let response = recommend_courses(state.store.as_ref(), &state.engine, request).await?;

    tracing::info!(
        request_id = %request_id,
        recommendations = response.recommendations.len(),
        blocked = response.blocked_reason.is_some(),
        "Recommendation completed"
    );

    Ok(Json(response))
}
