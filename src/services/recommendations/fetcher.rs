use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::instrument;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{
        CareerGoalId, ClusterId, Course, CourseCluster, CourseId, CourseSkill, GoalRequirements,
        Prerequisite, ReviewAggregate, ReviewStats, Skill, SkillId, StudentId, StudentProgress,
    },
};

/// Everything one recommendation request reads, keyed by id
///
/// Built once per request from a fixed set of bulk queries and never mutated
/// afterwards; every scorer is a pure function over it.
#[derive(Debug, Clone, Default)]
pub struct RecommendationContext {
    pub student_id: StudentId,
    pub goal: GoalRequirements,
    pub completed: BTreeSet<CourseId>,
    pub human_skills: HashSet<SkillId>,
    pub courses: BTreeMap<CourseId, Course>,
    pub skill_names: HashMap<SkillId, String>,
    /// Technical skill relevance per course
    pub course_skills: HashMap<CourseId, HashMap<SkillId, f64>>,
    pub course_clusters: HashMap<CourseId, HashSet<ClusterId>>,
    pub reviews: HashMap<CourseId, ReviewAggregate>,
    /// Mean of every review score in the system, on the 1..=10 scale
    pub global_mean_score: Option<f64>,
    pub prerequisites: HashMap<CourseId, BTreeSet<CourseId>>,
}

impl RecommendationContext {
    pub fn skill_name(&self, skill_id: SkillId) -> String {
        self.skill_names.get(&skill_id).cloned().unwrap_or_default()
    }

    pub fn course_name(&self, course_id: CourseId) -> String {
        self.courses
            .get(&course_id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    pub fn technical_skills(&self, course_id: CourseId) -> Option<&HashMap<SkillId, f64>> {
        self.course_skills.get(&course_id)
    }

    pub fn clusters(&self, course_id: CourseId) -> Option<&HashSet<ClusterId>> {
        self.course_clusters.get(&course_id)
    }
}

/// Bulk-loads the catalog snapshot for one student and career goal
///
/// The goal is `requested_goal` when given, otherwise the student's own goal.
/// Nine store calls are made regardless of catalog size; the seven catalog-wide
/// ones run concurrently once the student and goal are known to exist. A
/// backend may spend more than one query on a call, but never a per-course one.
#[instrument(skip(store), fields(backend = store.name()))]
pub async fn fetch_context(
    store: &dyn CatalogStore,
    student_id: StudentId,
    requested_goal: Option<CareerGoalId>,
) -> AppResult<RecommendationContext> {
    let student = store
        .student(student_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student {} not found", student_id)))?;

    let goal_id = requested_goal.or(student.career_goal_id).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Student {} has no career goal; pass career_goal_id",
            student_id
        ))
    })?;

    let goal = store
        .career_goal(goal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Career goal {} not found", goal_id)))?;

    let (progress, courses, skills, course_skills, clusters, reviews, prerequisites) = tokio::try_join!(
        store.student_progress(student_id),
        store.courses(),
        store.skills(),
        store.course_technical_skills(),
        store.course_clusters(),
        store.review_stats(),
        store.prerequisites(),
    )?;

    tracing::debug!(
        courses = courses.len(),
        skills = skills.len(),
        course_skill_rows = course_skills.len(),
        cluster_rows = clusters.len(),
        reviewed_courses = reviews.per_course.len(),
        prerequisite_rows = prerequisites.len(),
        completed = progress.completed_course_ids.len(),
        "Catalog snapshot loaded"
    );

    Ok(build_context(
        student_id,
        goal,
        progress,
        courses,
        skills,
        course_skills,
        clusters,
        reviews,
        prerequisites,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_context(
    student_id: StudentId,
    goal: GoalRequirements,
    progress: StudentProgress,
    courses: Vec<Course>,
    skills: Vec<Skill>,
    course_skills: Vec<CourseSkill>,
    clusters: Vec<CourseCluster>,
    reviews: ReviewStats,
    prerequisites: Vec<Prerequisite>,
) -> RecommendationContext {
    let mut skill_map: HashMap<CourseId, HashMap<SkillId, f64>> = HashMap::new();
    for row in course_skills {
        skill_map
            .entry(row.course_id)
            .or_default()
            .insert(row.skill_id, row.relevance);
    }

    let mut cluster_map: HashMap<CourseId, HashSet<ClusterId>> = HashMap::new();
    for row in clusters {
        cluster_map
            .entry(row.course_id)
            .or_default()
            .insert(row.cluster_id);
    }

    let mut prereq_map: HashMap<CourseId, BTreeSet<CourseId>> = HashMap::new();
    for row in prerequisites {
        prereq_map
            .entry(row.course_id)
            .or_default()
            .insert(row.required_course_id);
    }

    RecommendationContext {
        student_id,
        goal,
        completed: progress.completed_course_ids.into_iter().collect(),
        human_skills: progress.human_skill_ids.into_iter().collect(),
        courses: courses.into_iter().map(|c| (c.id, c)).collect(),
        skill_names: skills.into_iter().map(|s| (s.id, s.name)).collect(),
        course_skills: skill_map,
        course_clusters: cluster_map,
        reviews: reviews
            .per_course
            .into_iter()
            .map(|r| (r.course_id, r))
            .collect(),
        global_mean_score: reviews.global_mean,
        prerequisites: prereq_map,
    }
}
