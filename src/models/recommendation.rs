use serde::{Deserialize, Serialize};

use super::{CareerGoalId, CourseId, SkillId, StudentId};

/// Request for course recommendations
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecommendationRequest {
    pub student_id: StudentId,
    /// Defaults to the student's own career goal
    #[serde(default)]
    pub career_goal_id: Option<CareerGoalId>,
    #[serde(default)]
    pub k: Option<usize>,
    #[serde(default)]
    pub enforce_prereqs: Option<bool>,
}

/// Skill reference with its display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillInfo {
    pub skill_id: SkillId,
    pub name: String,
}

/// Goal-required technical skill that a course covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill_id: SkillId,
    pub name: String,
    pub relevance_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub s_role: f64,
    pub s_affinity: f64,
    pub q_smoothed: f64,
}

/// One completed course contributing to a candidate's affinity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityContribution {
    pub completed_course_id: CourseId,
    pub completed_course_name: String,
    pub similarity_score: f64,
    pub cluster_matched: bool,
    pub tech_overlap_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityExplanation {
    pub top_contributing_courses: Vec<AffinityContribution>,
}

/// A ranked course with its score breakdown and explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecommendation {
    pub course_id: CourseId,
    pub name: String,
    pub final_score: f64,
    pub breakdown: ScoreBreakdown,
    /// Mean review score on the 1..=10 scale, absent for unreviewed courses
    pub avg_score_raw: Option<f64>,
    pub review_count: i64,
    pub matched_technical_skills: Vec<SkillMatch>,
    pub missing_technical_skills: Vec<SkillId>,
    pub affinity_explanation: Option<AffinityExplanation>,
}

/// Course withheld because the student lacks some of its prerequisites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedCourse {
    pub course_id: CourseId,
    pub course_name: String,
    pub missing_prereqs: Vec<CourseId>,
}

/// Response body for the recommendation endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub soft_readiness: f64,
    pub overlap_human_skills: Vec<SkillInfo>,
    pub missing_human_skills: Vec<SkillInfo>,
    pub recommendations: Vec<CourseRecommendation>,
    pub blocked_reason: Option<String>,
    pub blocked_courses: Option<Vec<BlockedCourse>>,
}
