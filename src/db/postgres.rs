use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::{
        CareerGoalId, Course, CourseCluster, CourseSkill, GoalRequirements, Prerequisite,
        RequiredSkill, ReviewAggregate, ReviewStats, Skill, SkillType, StudentId, StudentProgress,
        StudentRecord,
    },
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Catalog store backed by PostgreSQL
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalogStore {
    async fn student(&self, student_id: StudentId) -> AppResult<Option<StudentRecord>> {
        let student = sqlx::query_as::<_, StudentRecord>(
            "SELECT id, career_goal_id FROM students WHERE id = $1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    async fn career_goal(&self, goal_id: CareerGoalId) -> AppResult<Option<GoalRequirements>> {
        let goal = sqlx::query_as::<_, (i64, String, Option<String>)>(
            "SELECT id, name, description FROM career_goals WHERE id = $1",
        )
        .bind(goal_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, name, description)) = goal else {
            return Ok(None);
        };

        let technical = sqlx::query_as::<_, RequiredSkill>(
            r#"
            SELECT skill_id, weight
            FROM career_goal_technical_skills
            WHERE career_goal_id = $1
            ORDER BY skill_id
            "#,
        )
        .bind(goal_id)
        .fetch_all(&self.pool)
        .await?;

        let human = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT skill_id
            FROM career_goal_human_skills
            WHERE career_goal_id = $1
            ORDER BY skill_id
            "#,
        )
        .bind(goal_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(GoalRequirements {
            id,
            name,
            description,
            technical,
            human,
        }))
    }

    async fn student_progress(&self, student_id: StudentId) -> AppResult<StudentProgress> {
        let completed_course_ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT course_id
            FROM student_courses
            WHERE student_id = $1 AND status = 'completed'
            ORDER BY course_id
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let human_skill_ids = sqlx::query_scalar::<_, i64>(
            "SELECT skill_id FROM student_human_skills WHERE student_id = $1 ORDER BY skill_id",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(StudentProgress {
            completed_course_ids,
            human_skill_ids,
        })
    }

    async fn courses(&self) -> AppResult<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT id, name, workload, credits FROM courses ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    async fn skills(&self) -> AppResult<Vec<Skill>> {
        let rows = sqlx::query_as::<_, (i64, String, String)>("SELECT id, name, type FROM skills")
            .fetch_all(&self.pool)
            .await?;

        let skills = rows
            .into_iter()
            .filter_map(|(id, name, raw_type)| match raw_type.parse::<SkillType>() {
                Ok(skill_type) => Some(Skill {
                    id,
                    name,
                    skill_type,
                }),
                Err(e) => {
                    tracing::warn!(skill_id = id, error = %e, "Skipping skill with unknown type");
                    None
                }
            })
            .collect();

        Ok(skills)
    }

    async fn course_technical_skills(&self) -> AppResult<Vec<CourseSkill>> {
        let rows = sqlx::query_as::<_, CourseSkill>(
            r#"
            SELECT cs.course_id, cs.skill_id, COALESCE(cs.relevance_score, 0)::float8 AS relevance
            FROM course_skills cs
            JOIN skills s ON s.id = cs.skill_id
            WHERE s.type = 'technical'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn course_clusters(&self) -> AppResult<Vec<CourseCluster>> {
        let rows =
            sqlx::query_as::<_, CourseCluster>("SELECT course_id, cluster_id FROM course_clusters")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }

    async fn review_stats(&self) -> AppResult<ReviewStats> {
        let per_course = sqlx::query_as::<_, ReviewAggregate>(
            r#"
            SELECT course_id, COUNT(*) AS count, AVG(final_score)::float8 AS mean_score
            FROM course_reviews
            GROUP BY course_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let global_mean =
            sqlx::query_scalar::<_, Option<f64>>("SELECT AVG(final_score)::float8 FROM course_reviews")
                .fetch_one(&self.pool)
                .await?;

        Ok(ReviewStats {
            per_course,
            global_mean,
        })
    }

    async fn prerequisites(&self) -> AppResult<Vec<Prerequisite>> {
        let rows = sqlx::query_as::<_, Prerequisite>(
            "SELECT course_id, required_course_id FROM course_prerequisites",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
