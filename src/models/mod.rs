use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod recommendation;

pub use recommendation::*;

pub type StudentId = i64;
pub type CourseId = i64;
pub type SkillId = i64;
pub type ClusterId = i64;
pub type CareerGoalId = i64;

/// Whether a skill is a hard/domain skill or a soft skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Technical,
    Human,
}

impl FromStr for SkillType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "technical" => Ok(SkillType::Technical),
            "human" => Ok(SkillType::Human),
            other => Err(format!("unknown skill type '{}'", other)),
        }
    }
}

/// Reference skill data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
}

/// Catalog course as seen by the recommender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    #[serde(default)]
    pub workload: Option<i32>,
    #[serde(default)]
    pub credits: Option<i32>,
}

/// Technical skill taught by a course, with its relevance in [0,1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseSkill {
    pub course_id: CourseId,
    pub skill_id: SkillId,
    pub relevance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CourseCluster {
    pub course_id: CourseId,
    pub cluster_id: ClusterId,
}

/// `course_id` can only be taken once `required_course_id` is completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Prerequisite {
    pub course_id: CourseId,
    pub required_course_id: CourseId,
}

/// Student identity and their own career goal, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentRecord {
    pub id: StudentId,
    #[serde(default)]
    pub career_goal_id: Option<CareerGoalId>,
}

/// Completed courses and possessed human skills of one student
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentProgress {
    pub completed_course_ids: Vec<CourseId>,
    pub human_skill_ids: Vec<SkillId>,
}

/// Technical skill a career goal requires, weighted in [0,1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RequiredSkill {
    pub skill_id: SkillId,
    pub weight: f64,
}

/// A career goal with its technical and human skill requirements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalRequirements {
    pub id: CareerGoalId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technical: Vec<RequiredSkill>,
    #[serde(default)]
    pub human: Vec<SkillId>,
}

/// Review count and mean final score (1..=10) for one course
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewAggregate {
    pub course_id: CourseId,
    pub count: i64,
    pub mean_score: f64,
}

/// Per-course review aggregates plus the mean over every review in the system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub per_course: Vec<ReviewAggregate>,
    pub global_mean: Option<f64>,
}
