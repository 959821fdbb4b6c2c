use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::path::Path;

use anyhow::{bail, ensure};
use serde::Deserialize;

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::{
        CareerGoalId, Course, CourseCluster, CourseId, CourseSkill, GoalRequirements,
        Prerequisite, ReviewAggregate, ReviewStats, Skill, SkillId, SkillType, StudentId,
        StudentProgress, StudentRecord,
    },
};

/// Progress of a student through a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Completed,
    InProgress,
    Planned,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentSeed {
    pub course_id: CourseId,
    pub status: EnrollmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentSeed {
    pub id: StudentId,
    #[serde(default)]
    pub career_goal_id: Option<CareerGoalId>,
    #[serde(default)]
    pub courses: Vec<EnrollmentSeed>,
    #[serde(default)]
    pub human_skill_ids: Vec<SkillId>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReviewSeed {
    pub course_id: CourseId,
    pub final_score: f64,
}

/// JSON layout of a catalog snapshot for the memory backend
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSeed {
    pub skills: Vec<Skill>,
    pub courses: Vec<Course>,
    pub course_skills: Vec<CourseSkill>,
    pub course_clusters: Vec<CourseCluster>,
    pub prerequisites: Vec<Prerequisite>,
    pub career_goals: Vec<GoalRequirements>,
    pub students: Vec<StudentSeed>,
    pub reviews: Vec<ReviewSeed>,
}

/// Immutable catalog held in memory
///
/// Serves local runs without a database. Review aggregates are computed once
/// on construction, the same way the SQL store aggregates them per query.
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    skills: Vec<Skill>,
    courses: Vec<Course>,
    course_skills: Vec<CourseSkill>,
    course_clusters: Vec<CourseCluster>,
    prerequisites: Vec<Prerequisite>,
    career_goals: HashMap<CareerGoalId, GoalRequirements>,
    students: HashMap<StudentId, StudentSeed>,
    review_stats: ReviewStats,
}

impl InMemoryCatalog {
    /// Builds the catalog, rejecting seeds the SQL schema would refuse
    pub fn from_seed(seed: CatalogSeed) -> anyhow::Result<Self> {
        validate_seed(&seed)?;

        let technical: HashMap<SkillId, bool> = seed
            .skills
            .iter()
            .map(|s| (s.id, s.skill_type == SkillType::Technical))
            .collect();

        // Rows for skills that are not technical (or unknown) never reach the scorers
        let course_skills = seed
            .course_skills
            .into_iter()
            .filter(|cs| technical.get(&cs.skill_id).copied().unwrap_or(false))
            .collect();

        let mut courses = seed.courses;
        courses.sort_by_key(|c| c.id);

        Ok(Self {
            skills: seed.skills,
            courses,
            course_skills,
            course_clusters: seed.course_clusters,
            prerequisites: seed.prerequisites,
            career_goals: seed.career_goals.into_iter().map(|g| (g.id, g)).collect(),
            students: seed.students.into_iter().map(|s| (s.id, s)).collect(),
            review_stats: aggregate_reviews(&seed.reviews),
        })
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let seed: CatalogSeed = serde_json::from_str(json)?;
        Self::from_seed(seed)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read seed {}: {}", path.display(), e))?;
        let catalog = Self::from_json_str(&json)?;

        tracing::info!(
            path = %path.display(),
            courses = catalog.courses.len(),
            students = catalog.students.len(),
            "Loaded in-memory catalog"
        );

        Ok(catalog)
    }
}

fn validate_seed(seed: &CatalogSeed) -> anyhow::Result<()> {
    unique_keys("skill", seed.skills.iter().map(|s| s.id))?;
    unique_keys("course", seed.courses.iter().map(|c| c.id))?;
    unique_keys("career goal", seed.career_goals.iter().map(|g| g.id))?;
    unique_keys("student", seed.students.iter().map(|s| s.id))?;
    unique_keys(
        "course skill",
        seed.course_skills.iter().map(|cs| (cs.course_id, cs.skill_id)),
    )?;
    unique_keys(
        "course cluster",
        seed.course_clusters.iter().map(|cc| (cc.course_id, cc.cluster_id)),
    )?;
    unique_keys(
        "prerequisite",
        seed.prerequisites
            .iter()
            .map(|p| (p.course_id, p.required_course_id)),
    )?;

    for cs in &seed.course_skills {
        ensure!(
            is_unit(cs.relevance),
            "Relevance {} of skill {} in course {} is outside [0, 1]",
            cs.relevance,
            cs.skill_id,
            cs.course_id
        );
    }

    for goal in &seed.career_goals {
        unique_keys(
            "career goal technical skill",
            goal.technical.iter().map(|r| (goal.id, r.skill_id)),
        )?;
        unique_keys(
            "career goal human skill",
            goal.human.iter().map(|id| (goal.id, *id)),
        )?;
        for required in &goal.technical {
            ensure!(
                is_unit(required.weight),
                "Weight {} of skill {} in career goal {} is outside [0, 1]",
                required.weight,
                required.skill_id,
                goal.id
            );
        }
    }

    for review in &seed.reviews {
        ensure!(
            (1.0..=10.0).contains(&review.final_score),
            "Review score {} for course {} is outside 1..=10",
            review.final_score,
            review.course_id
        );
    }

    Ok(())
}

fn is_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn unique_keys<K>(what: &str, keys: impl IntoIterator<Item = K>) -> anyhow::Result<()>
where
    K: Eq + Hash + Copy + Debug,
{
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            bail!("Duplicate {} {:?} in seed", what, key);
        }
    }
    Ok(())
}

fn aggregate_reviews(reviews: &[ReviewSeed]) -> ReviewStats {
    if reviews.is_empty() {
        return ReviewStats::default();
    }

    let mut sums: BTreeMap<CourseId, (i64, f64)> = BTreeMap::new();
    for review in reviews {
        let entry = sums.entry(review.course_id).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += review.final_score;
    }

    let per_course = sums
        .into_iter()
        .map(|(course_id, (count, total))| ReviewAggregate {
            course_id,
            count,
            mean_score: total / count as f64,
        })
        .collect();

    let total: f64 = reviews.iter().map(|r| r.final_score).sum();

    ReviewStats {
        per_course,
        global_mean: Some(total / reviews.len() as f64),
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn student(&self, student_id: StudentId) -> AppResult<Option<StudentRecord>> {
        Ok(self.students.get(&student_id).map(|s| StudentRecord {
            id: s.id,
            career_goal_id: s.career_goal_id,
        }))
    }

    async fn career_goal(&self, goal_id: CareerGoalId) -> AppResult<Option<GoalRequirements>> {
        Ok(self.career_goals.get(&goal_id).cloned())
    }

    async fn student_progress(&self, student_id: StudentId) -> AppResult<StudentProgress> {
        let Some(student) = self.students.get(&student_id) else {
            return Ok(StudentProgress::default());
        };

        let mut completed_course_ids: Vec<CourseId> = student
            .courses
            .iter()
            .filter(|e| e.status == EnrollmentStatus::Completed)
            .map(|e| e.course_id)
            .collect();
        completed_course_ids.sort_unstable();
        completed_course_ids.dedup();

        let mut human_skill_ids = student.human_skill_ids.clone();
        human_skill_ids.sort_unstable();
        human_skill_ids.dedup();

        Ok(StudentProgress {
            completed_course_ids,
            human_skill_ids,
        })
    }

    async fn courses(&self) -> AppResult<Vec<Course>> {
        Ok(self.courses.clone())
    }

    async fn skills(&self) -> AppResult<Vec<Skill>> {
        Ok(self.skills.clone())
    }

    async fn course_technical_skills(&self) -> AppResult<Vec<CourseSkill>> {
        Ok(self.course_skills.clone())
    }

    async fn course_clusters(&self) -> AppResult<Vec<CourseCluster>> {
        Ok(self.course_clusters.clone())
    }

    async fn review_stats(&self) -> AppResult<ReviewStats> {
        Ok(self.review_stats.clone())
    }

    async fn prerequisites(&self) -> AppResult<Vec<Prerequisite>> {
        Ok(self.prerequisites.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
