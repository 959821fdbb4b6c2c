//! Blends the component scores, filters, ranks and explains.

use crate::{
    config::EngineConfig,
    models::{
        AffinityContribution, AffinityExplanation, BlockedCourse, Course, CourseId,
        CourseRecommendation, RecommendationsResponse, ScoreBreakdown, SkillId, SkillInfo,
        SkillMatch,
    },
};

use super::{
    affinity::{self, AffinityScore},
    fetcher::RecommendationContext,
    quality,
    readiness::{self, ReadinessReport, BLOCKED_REASON},
    role_fit,
};

/// Per-request ranking options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOptions {
    pub k: usize,
    pub enforce_prereqs: bool,
}

/// Student lacks every required human skill; nothing was scored
#[derive(Debug, Clone, PartialEq)]
pub struct BlockedOutcome {
    pub soft_readiness: f64,
    pub overlap_human_skills: Vec<SkillInfo>,
    pub missing_human_skills: Vec<SkillInfo>,
    pub reason: String,
    pub enforce_prereqs: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedOutcome {
    pub soft_readiness: f64,
    pub overlap_human_skills: Vec<SkillInfo>,
    pub missing_human_skills: Vec<SkillInfo>,
    /// Best first; may be empty when no course is eligible
    pub recommendations: Vec<CourseRecommendation>,
    /// `None` unless prerequisites were enforced
    pub blocked_courses: Option<Vec<BlockedCourse>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    Blocked(BlockedOutcome),
    Ranked(RankedOutcome),
}

impl From<RecommendationOutcome> for RecommendationsResponse {
    fn from(outcome: RecommendationOutcome) -> Self {
        match outcome {
            RecommendationOutcome::Blocked(blocked) => Self {
                soft_readiness: blocked.soft_readiness,
                overlap_human_skills: blocked.overlap_human_skills,
                missing_human_skills: blocked.missing_human_skills,
                recommendations: Vec::new(),
                blocked_reason: Some(blocked.reason),
                blocked_courses: blocked.enforce_prereqs.then(Vec::new),
            },
            RecommendationOutcome::Ranked(ranked) => Self {
                soft_readiness: ranked.soft_readiness,
                overlap_human_skills: ranked.overlap_human_skills,
                missing_human_skills: ranked.missing_human_skills,
                recommendations: ranked.recommendations,
                blocked_reason: None,
                blocked_courses: ranked.blocked_courses,
            },
        }
    }
}

struct ScoredCourse<'a> {
    course: &'a Course,
    breakdown: ScoreBreakdown,
    final_score: f64,
    affinity: AffinityScore,
}

/// Runs the gate, then scores every eligible course and keeps the best `k`
///
/// Completed courses are never candidates. With `enforce_prereqs`, courses
/// whose prerequisites are not all completed are reported in
/// `blocked_courses` instead of being scored. Ties on the final score are
/// broken by ascending course id.
pub fn rank(
    ctx: &RecommendationContext,
    options: &RankOptions,
    config: &EngineConfig,
) -> RecommendationOutcome {
    let readiness = readiness::evaluate(&ctx.goal.human, &ctx.human_skills);
    let report = readiness.report();
    let soft_readiness = report.soft_readiness;
    let (overlap_human_skills, missing_human_skills) = human_skill_lists(ctx, report);

    if readiness.is_blocked() {
        tracing::info!(
            student_id = ctx.student_id,
            goal_id = ctx.goal.id,
            missing_human_skills = missing_human_skills.len(),
            "Recommendations blocked: no human skill overlap"
        );
        return RecommendationOutcome::Blocked(BlockedOutcome {
            soft_readiness,
            overlap_human_skills,
            missing_human_skills,
            reason: BLOCKED_REASON.to_string(),
            enforce_prereqs: options.enforce_prereqs,
        });
    }

    let (candidates, blocked_courses) = eligible_candidates(ctx, options.enforce_prereqs);
    let baseline = quality::baseline(ctx.global_mean_score, config.fallback_quality);

    let mut scored: Vec<ScoredCourse> = candidates
        .into_iter()
        .map(|course| score_course(ctx, course, baseline, config))
        .collect();

    scored.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then(a.course.id.cmp(&b.course.id))
    });
    let eligible = scored.len();
    scored.truncate(options.k);

    tracing::debug!(
        student_id = ctx.student_id,
        eligible,
        returned = scored.len(),
        prerequisite_blocked = blocked_courses.as_ref().map_or(0, |b| b.len()),
        "Candidates ranked"
    );

    let recommendations = scored
        .into_iter()
        .map(|scored| explain(ctx, scored))
        .collect();

    RecommendationOutcome::Ranked(RankedOutcome {
        soft_readiness,
        overlap_human_skills,
        missing_human_skills,
        recommendations,
        blocked_courses,
    })
}

/// `w1 * s_role + w2 * s_affinity + w3 * q_smoothed`
pub fn final_score(breakdown: &ScoreBreakdown, config: &EngineConfig) -> f64 {
    config.role_weight * breakdown.s_role
        + config.affinity_weight * breakdown.s_affinity
        + config.quality_weight * breakdown.q_smoothed
}

fn human_skill_lists(
    ctx: &RecommendationContext,
    report: &ReadinessReport,
) -> (Vec<SkillInfo>, Vec<SkillInfo>) {
    let info = |ids: &[SkillId]| -> Vec<SkillInfo> {
        ids.iter()
            .map(|&skill_id| SkillInfo {
                skill_id,
                name: ctx.skill_name(skill_id),
            })
            .collect()
    };
    (info(&report.overlap), info(&report.missing))
}

fn eligible_candidates(
    ctx: &RecommendationContext,
    enforce_prereqs: bool,
) -> (Vec<&Course>, Option<Vec<BlockedCourse>>) {
    let open = ctx
        .courses
        .values()
        .filter(|course| !ctx.completed.contains(&course.id));

    if !enforce_prereqs {
        return (open.collect(), None);
    }

    let mut candidates = Vec::new();
    let mut blocked = Vec::new();
    for course in open {
        let missing_prereqs: Vec<CourseId> = ctx
            .prerequisites
            .get(&course.id)
            .map(|reqs| reqs.difference(&ctx.completed).copied().collect())
            .unwrap_or_default();

        if missing_prereqs.is_empty() {
            candidates.push(course);
        } else {
            blocked.push(BlockedCourse {
                course_id: course.id,
                course_name: course.name.clone(),
                missing_prereqs,
            });
        }
    }

    (candidates, Some(blocked))
}

fn score_course<'a>(
    ctx: &RecommendationContext,
    course: &'a Course,
    baseline: f64,
    config: &EngineConfig,
) -> ScoredCourse<'a> {
    let s_role = role_fit::role_fit(&ctx.goal.technical, ctx.technical_skills(course.id));
    let affinity = affinity::affinity(ctx, course.id, config);
    let q_smoothed = quality::smoothed(
        ctx.reviews.get(&course.id),
        baseline,
        config.prior_strength,
    );

    let breakdown = ScoreBreakdown {
        s_role,
        s_affinity: affinity.score,
        q_smoothed,
    };

    ScoredCourse {
        course,
        final_score: final_score(&breakdown, config),
        breakdown,
        affinity,
    }
}

fn explain(ctx: &RecommendationContext, scored: ScoredCourse) -> CourseRecommendation {
    let course = scored.course;
    let coverage = role_fit::coverage(&ctx.goal.technical, ctx.technical_skills(course.id));

    let matched_technical_skills = coverage
        .matched
        .into_iter()
        .map(|(skill_id, relevance_score)| SkillMatch {
            skill_id,
            name: ctx.skill_name(skill_id),
            relevance_score,
        })
        .collect();

    let affinity_explanation = (!scored.affinity.top.is_empty()).then(|| AffinityExplanation {
        top_contributing_courses: scored
            .affinity
            .top
            .iter()
            .map(|pair| AffinityContribution {
                completed_course_id: pair.completed_course_id,
                completed_course_name: ctx.course_name(pair.completed_course_id),
                similarity_score: pair.similarity,
                cluster_matched: pair.cluster_matched,
                tech_overlap_score: pair.tech_overlap,
            })
            .collect(),
    });

    let review = ctx.reviews.get(&course.id).filter(|r| r.count > 0);

    CourseRecommendation {
        course_id: course.id,
        name: course.name.clone(),
        final_score: scored.final_score,
        breakdown: scored.breakdown,
        avg_score_raw: review.map(|r| r.mean_score),
        review_count: review.map_or(0, |r| r.count),
        matched_technical_skills,
        missing_technical_skills: coverage.missing,
        affinity_explanation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoalRequirements, RequiredSkill, ReviewAggregate};
    use std::collections::HashMap;

    fn course(id: CourseId, name: &str) -> (CourseId, Course) {
        (
            id,
            Course {
                id,
                name: name.to_string(),
                workload: None,
                credits: None,
            },
        )
    }

    fn options(k: usize, enforce_prereqs: bool) -> RankOptions {
        RankOptions { k, enforce_prereqs }
    }

    fn ranked(outcome: RecommendationOutcome) -> RankedOutcome {
        match outcome {
            RecommendationOutcome::Ranked(ranked) => ranked,
            RecommendationOutcome::Blocked(b) => panic!("unexpectedly blocked: {:?}", b),
        }
    }

    /// Goal needs SQL (id 1, weight 1.0) and Python (id 2, weight 0.5),
    /// plus Teamwork (id 50) which the student has.
    fn context() -> RecommendationContext {
        let mut ctx = RecommendationContext {
            student_id: 1,
            goal: GoalRequirements {
                id: 1,
                name: "Data Engineer".to_string(),
                description: None,
                technical: vec![
                    RequiredSkill {
                        skill_id: 1,
                        weight: 1.0,
                    },
                    RequiredSkill {
                        skill_id: 2,
                        weight: 0.5,
                    },
                ],
                human: vec![50],
            },
            human_skills: [50].into_iter().collect(),
            global_mean_score: Some(7.0),
            ..RecommendationContext::default()
        };
        ctx.skill_names = [
            (1, "SQL".to_string()),
            (2, "Python".to_string()),
            (50, "Teamwork".to_string()),
        ]
        .into_iter()
        .collect();
        ctx.courses = [
            course(10, "Intro to Programming"),
            course(20, "Databases"),
            course(30, "Data Pipelines"),
            course(40, "Art History"),
        ]
        .into_iter()
        .collect();
        ctx.completed = [10].into_iter().collect();
        ctx.course_skills = HashMap::from([
            (10, HashMap::from([(2, 0.6)])),
            (20, HashMap::from([(1, 0.9)])),
            (30, HashMap::from([(1, 0.7), (2, 0.8)])),
        ]);
        ctx
    }

    #[test]
    fn test_final_score_example() {
        let breakdown = ScoreBreakdown {
            s_role: 0.8,
            s_affinity: 0.5,
            q_smoothed: 0.7,
        };
        let score = final_score(&breakdown, &EngineConfig::default());
        assert!((score - 0.72).abs() < 1e-9);
    }

    #[test]
    fn test_completed_courses_are_not_recommended() {
        let outcome = ranked(rank(&context(), &options(10, true), &EngineConfig::default()));
        let ids: Vec<CourseId> = outcome.recommendations.iter().map(|r| r.course_id).collect();
        assert!(!ids.contains(&10));
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_sorted_by_final_score_then_id() {
        let outcome = ranked(rank(&context(), &options(10, false), &EngineConfig::default()));
        let recs = &outcome.recommendations;

        for pair in recs.windows(2) {
            assert!(pair[0].final_score >= pair[1].final_score);
            if pair[0].final_score == pair[1].final_score {
                assert!(pair[0].course_id < pair[1].course_id);
            }
        }
        assert_eq!(recs[0].course_id, 30);
        assert_eq!(recs[2].course_id, 40);
    }

    #[test]
    fn test_equal_scores_break_ties_by_course_id() {
        let mut ctx = context();
        ctx.course_skills.clear();
        ctx.completed.clear();
        let outcome = ranked(rank(&ctx, &options(10, false), &EngineConfig::default()));
        let ids: Vec<CourseId> = outcome.recommendations.iter().map(|r| r.course_id).collect();
        assert_eq!(ids, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_truncates_to_k() {
        let outcome = ranked(rank(&context(), &options(2, false), &EngineConfig::default()));
        assert_eq!(outcome.recommendations.len(), 2);
    }

    #[test]
    fn test_breakdown_and_explanation() {
        let outcome = ranked(rank(&context(), &options(10, false), &EngineConfig::default()));
        let pipelines = outcome
            .recommendations
            .iter()
            .find(|r| r.course_id == 30)
            .unwrap();

        // (1.0*0.7 + 0.5*0.8) / 2
        assert!((pipelines.breakdown.s_role - 0.55).abs() < 1e-9);
        // Jaccard({1,2}, {2}) = 0.5, no shared cluster: 0.4 * 0.5
        assert!((pipelines.breakdown.s_affinity - 0.2).abs() < 1e-9);
        // Unreviewed: global mean 7.0 / 10
        assert!((pipelines.breakdown.q_smoothed - 0.7).abs() < 1e-9);
        assert!((pipelines.final_score - (0.6 * 0.55 + 0.2 * 0.2 + 0.2 * 0.7)).abs() < 1e-9);

        assert_eq!(pipelines.review_count, 0);
        assert_eq!(pipelines.avg_score_raw, None);
        assert_eq!(pipelines.matched_technical_skills.len(), 2);
        assert_eq!(pipelines.matched_technical_skills[0].name, "SQL");
        assert!(pipelines.missing_technical_skills.is_empty());

        let explanation = pipelines.affinity_explanation.as_ref().unwrap();
        let top = &explanation.top_contributing_courses[0];
        assert_eq!(top.completed_course_id, 10);
        assert_eq!(top.completed_course_name, "Intro to Programming");
        assert!(!top.cluster_matched);
        assert!((top.tech_overlap_score - 0.5).abs() < 1e-9);

        let art = outcome
            .recommendations
            .iter()
            .find(|r| r.course_id == 40)
            .unwrap();
        assert_eq!(art.breakdown.s_role, 0.0);
        assert_eq!(art.missing_technical_skills, vec![1, 2]);
    }

    #[test]
    fn test_review_snapshot_is_reported() {
        let mut ctx = context();
        ctx.reviews.insert(
            20,
            ReviewAggregate {
                course_id: 20,
                count: 10,
                mean_score: 9.0,
            },
        );
        ctx.global_mean_score = Some(7.5);

        let outcome = ranked(rank(&ctx, &options(10, false), &EngineConfig::default()));
        let databases = outcome
            .recommendations
            .iter()
            .find(|r| r.course_id == 20)
            .unwrap();

        assert_eq!(databases.review_count, 10);
        assert_eq!(databases.avg_score_raw, Some(9.0));
        assert!((databases.breakdown.q_smoothed - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_no_reviews_anywhere_uses_fallback_quality() {
        let mut ctx = context();
        ctx.global_mean_score = None;
        let outcome = ranked(rank(&ctx, &options(10, false), &EngineConfig::default()));
        assert!(outcome
            .recommendations
            .iter()
            .all(|r| r.breakdown.q_smoothed == 0.5));
    }

    #[test]
    fn test_no_completed_courses_means_no_affinity() {
        let mut ctx = context();
        ctx.completed.clear();
        let outcome = ranked(rank(&ctx, &options(10, false), &EngineConfig::default()));
        assert!(outcome.recommendations.iter().all(|r| {
            r.breakdown.s_affinity == 0.0 && r.affinity_explanation.is_none()
        }));
    }

    #[test]
    fn test_prerequisites_block_courses() {
        let mut ctx = context();
        ctx.prerequisites.insert(30, [10, 20].into_iter().collect());

        let outcome = ranked(rank(&ctx, &options(10, true), &EngineConfig::default()));
        assert!(outcome.recommendations.iter().all(|r| r.course_id != 30));

        let blocked = outcome.blocked_courses.unwrap();
        assert_eq!(
            blocked,
            vec![BlockedCourse {
                course_id: 30,
                course_name: "Data Pipelines".to_string(),
                missing_prereqs: vec![20],
            }]
        );
    }

    #[test]
    fn test_missing_prerequisites_listed_ascending() {
        let mut ctx = context();
        ctx.completed.clear();
        ctx.prerequisites.insert(30, [20, 15].into_iter().collect());

        let outcome = ranked(rank(&ctx, &options(10, true), &EngineConfig::default()));
        let blocked = outcome.blocked_courses.unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].course_id, 30);
        assert_eq!(blocked[0].missing_prereqs, vec![15, 20]);
    }

    #[test]
    fn test_prerequisites_ignored_when_not_enforced() {
        let mut ctx = context();
        ctx.prerequisites.insert(30, [10, 20].into_iter().collect());

        let outcome = ranked(rank(&ctx, &options(10, false), &EngineConfig::default()));
        assert!(outcome.recommendations.iter().any(|r| r.course_id == 30));
        assert_eq!(outcome.blocked_courses, None);
    }

    #[test]
    fn test_gate_blocks_without_scoring() {
        let mut ctx = context();
        ctx.human_skills.clear();

        let outcome = rank(&ctx, &options(10, true), &EngineConfig::default());
        let response = RecommendationsResponse::from(outcome);

        assert!(response.recommendations.is_empty());
        assert_eq!(response.blocked_reason.as_deref(), Some(BLOCKED_REASON));
        assert_eq!(response.soft_readiness, 0.0);
        assert_eq!(
            response.missing_human_skills,
            vec![SkillInfo {
                skill_id: 50,
                name: "Teamwork".to_string()
            }]
        );
        assert_eq!(response.blocked_courses, Some(vec![]));
    }

    #[test]
    fn test_blocked_without_prereq_enforcement_has_null_blocked_courses() {
        let mut ctx = context();
        ctx.human_skills.clear();

        let response =
            RecommendationsResponse::from(rank(&ctx, &options(10, false), &EngineConfig::default()));
        assert_eq!(response.blocked_courses, None);
    }

    #[test]
    fn test_goal_without_human_skills_is_fully_ready() {
        let mut ctx = context();
        ctx.goal.human.clear();
        ctx.human_skills.clear();

        let outcome = ranked(rank(&ctx, &options(10, true), &EngineConfig::default()));
        assert_eq!(outcome.soft_readiness, 1.0);
        assert!(!outcome.recommendations.is_empty());
    }

    #[test]
    fn test_everything_completed_is_empty_not_blocked() {
        let mut ctx = context();
        ctx.completed = [10, 20, 30, 40].into_iter().collect();

        let response =
            RecommendationsResponse::from(rank(&ctx, &options(10, true), &EngineConfig::default()));
        assert!(response.recommendations.is_empty());
        assert_eq!(response.blocked_reason, None);
        assert_eq!(response.blocked_courses, Some(vec![]));
    }

    #[test]
    fn test_custom_weights() {
        let config = EngineConfig {
            role_weight: 0.0,
            affinity_weight: 0.0,
            quality_weight: 1.0,
            ..EngineConfig::default()
        };
        let outcome = ranked(rank(&context(), &options(10, false), &config));
        assert!(outcome
            .recommendations
            .iter()
            .all(|r| (r.final_score - r.breakdown.q_smoothed).abs() < 1e-12));
    }
}
