//! Course recommendation engine
//!
//! Ranks catalog courses for a student by blending three scores:
//! technical fit with a career goal (`role_fit`), similarity to completed
//! courses (`affinity`) and smoothed review quality (`quality`). A human-skill
//! readiness gate (`readiness`) can block the request before any scoring.

pub mod affinity;
pub mod fetcher;
pub mod quality;
pub mod ranker;
pub mod readiness;
pub mod role_fit;

use tracing::instrument;

pub use fetcher::{fetch_context, RecommendationContext};
pub use ranker::{rank, RankOptions, RecommendationOutcome};

use crate::{
    config::EngineConfig,
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{RecommendationRequest, RecommendationsResponse},
};

impl RankOptions {
    /// Applies defaults and checks `k` against the configured ceiling
    pub fn resolve(request: &RecommendationRequest, config: &EngineConfig) -> AppResult<Self> {
        let k = request.k.unwrap_or(config.default_k);
        if k == 0 || k > config.max_k {
            return Err(AppError::InvalidInput(format!(
                "k must be between 1 and {}, got {}",
                config.max_k, k
            )));
        }

        Ok(Self {
            k,
            enforce_prereqs: request.enforce_prereqs.unwrap_or(true),
        })
    }
}

/// Generates explained course recommendations for one student
///
/// Loads a fresh catalog snapshot, runs the readiness gate and ranks every
/// eligible course. Nothing is cached between calls.
#[instrument(skip(store, config), fields(student_id = request.student_id))]
pub async fn recommend_courses(
    store: &dyn CatalogStore,
    config: &EngineConfig,
    request: RecommendationRequest,
) -> AppResult<RecommendationsResponse> {
    let options = RankOptions::resolve(&request, config)?;
    let ctx = fetch_context(store, request.student_id, request.career_goal_id).await?;

    let outcome = rank(&ctx, &options, config);
    Ok(outcome.into())
}
