use crate::{
    error::AppResult,
    models::{
        CareerGoalId, Course, CourseCluster, CourseSkill, GoalRequirements, Prerequisite,
        ReviewStats, Skill, StudentId, StudentProgress, StudentRecord,
    },
};

/// Bulk read access to the course catalog and student profiles
///
/// Every method answers for the whole catalog (or one student/goal) in a single
/// round trip, so a recommendation request costs a fixed number of queries no
/// matter how many courses or skills exist. Implementations own retries; callers
/// surface failures as `NotFound` or `DataUnavailable`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn student(&self, student_id: StudentId) -> AppResult<Option<StudentRecord>>;

    /// Goal with its weighted technical and unweighted human skill requirements
    async fn career_goal(&self, goal_id: CareerGoalId) -> AppResult<Option<GoalRequirements>>;

    /// Completed course ids (status `completed` only) and human skill ids
    async fn student_progress(&self, student_id: StudentId) -> AppResult<StudentProgress>;

    async fn courses(&self) -> AppResult<Vec<Course>>;

    async fn skills(&self) -> AppResult<Vec<Skill>>;

    /// Course/skill relevance rows restricted to technical skills
    async fn course_technical_skills(&self) -> AppResult<Vec<CourseSkill>>;

    async fn course_clusters(&self) -> AppResult<Vec<CourseCluster>>;

    async fn review_stats(&self) -> AppResult<ReviewStats>;

    async fn prerequisites(&self) -> AppResult<Vec<Prerequisite>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
