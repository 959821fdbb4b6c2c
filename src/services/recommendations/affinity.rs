//! Similarity of a candidate course to the student's completed courses
//! (`S_affinity`).

use std::collections::{HashMap, HashSet};

use crate::config::EngineConfig;
use crate::models::{ClusterId, CourseId, SkillId};

use super::fetcher::RecommendationContext;

/// Similarity between a candidate and one completed course
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSimilarity {
    pub completed_course_id: CourseId,
    pub similarity: f64,
    pub cluster_matched: bool,
    pub tech_overlap: f64,
}

/// Affinity score with the completed courses that produced it, best first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffinityScore {
    pub score: f64,
    pub top: Vec<PairSimilarity>,
}

/// Intersection over union of two courses' technical skill ids
///
/// Two courses without any technical skills overlap by zero.
pub fn jaccard(a: Option<&HashMap<SkillId, f64>>, b: Option<&HashMap<SkillId, f64>>) -> f64 {
    let (a_len, b_len) = (a.map_or(0, |m| m.len()), b.map_or(0, |m| m.len()));
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };

    let (small, large) = if a_len <= b_len { (a, b) } else { (b, a) };
    let intersection = small.keys().filter(|k| large.contains_key(*k)).count();
    let union = a_len + b_len - intersection;

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

pub fn share_cluster(a: Option<&HashSet<ClusterId>>, b: Option<&HashSet<ClusterId>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => !a.is_disjoint(b),
        _ => false,
    }
}

/// `alpha * cluster_match + (1 - alpha) * jaccard`
pub fn blend(alpha: f64, cluster_matched: bool, tech_overlap: f64) -> f64 {
    let cluster = if cluster_matched { 1.0 } else { 0.0 };
    alpha * cluster + (1.0 - alpha) * tech_overlap
}

pub fn pair_similarity(
    ctx: &RecommendationContext,
    candidate: CourseId,
    completed: CourseId,
    alpha: f64,
) -> PairSimilarity {
    let cluster_matched = share_cluster(ctx.clusters(candidate), ctx.clusters(completed));
    let tech_overlap = jaccard(ctx.technical_skills(candidate), ctx.technical_skills(completed));

    PairSimilarity {
        completed_course_id: completed,
        similarity: blend(alpha, cluster_matched, tech_overlap),
        cluster_matched,
        tech_overlap,
    }
}

/// Mean of the `top_k_similar` best similarities to completed courses
///
/// Completed ids missing from the catalog are ignored. Ties keep the lower
/// completed course id first. No completed courses means zero affinity.
pub fn affinity(
    ctx: &RecommendationContext,
    candidate: CourseId,
    config: &EngineConfig,
) -> AffinityScore {
    let mut sims: Vec<PairSimilarity> = ctx
        .completed
        .iter()
        .filter(|id| ctx.courses.contains_key(*id))
        .map(|&completed| pair_similarity(ctx, candidate, completed, config.alpha))
        .collect();

    if sims.is_empty() {
        return AffinityScore::default();
    }

    sims.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then(a.completed_course_id.cmp(&b.completed_course_id))
    });
    sims.truncate(config.top_k_similar.max(1));

    let score = sims.iter().map(|s| s.similarity).sum::<f64>() / sims.len() as f64;

    AffinityScore { score, top: sims }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Course;

    fn skills(ids: &[SkillId]) -> HashMap<SkillId, f64> {
        ids.iter().map(|&id| (id, 1.0)).collect()
    }

    fn course(id: CourseId) -> (CourseId, Course) {
        (
            id,
            Course {
                id,
                name: format!("Course {}", id),
                workload: None,
                credits: None,
            },
        )
    }

    #[test]
    fn test_jaccard() {
        let a = skills(&[1, 2, 3]);
        let b = skills(&[2, 3, 4, 5]);
        // |{2,3}| / |{1,2,3,4,5}|
        assert!((jaccard(Some(&a), Some(&b)) - 0.4).abs() < 1e-9);
        assert_eq!(jaccard(Some(&a), Some(&a)), 1.0);
        assert_eq!(jaccard(None, Some(&b)), 0.0);
        assert_eq!(jaccard(Some(&HashMap::new()), Some(&HashMap::new())), 0.0);
    }

    #[test]
    fn test_blend_shared_cluster() {
        let sim = blend(0.6, true, 0.4);
        assert!((sim - 0.76).abs() < 1e-9);
        assert!((blend(0.6, false, 0.4) - 0.16).abs() < 1e-9);
    }

    #[test]
    fn test_share_cluster() {
        let a: HashSet<ClusterId> = [1, 2].into_iter().collect();
        let b: HashSet<ClusterId> = [2, 3].into_iter().collect();
        let c: HashSet<ClusterId> = [4].into_iter().collect();
        assert!(share_cluster(Some(&a), Some(&b)));
        assert!(!share_cluster(Some(&a), Some(&c)));
        assert!(!share_cluster(Some(&a), None));
    }

    #[test]
    fn test_disjoint_skills_still_similar_through_cluster() {
        let mut ctx = RecommendationContext::default();
        ctx.courses = [course(1), course(2)].into_iter().collect();
        ctx.completed = [1].into_iter().collect();
        ctx.course_skills.insert(1, skills(&[10]));
        ctx.course_skills.insert(2, skills(&[20]));
        ctx.course_clusters.insert(1, [7].into_iter().collect());
        ctx.course_clusters.insert(2, [7].into_iter().collect());

        let pair = pair_similarity(&ctx, 2, 1, 0.6);
        assert!(pair.cluster_matched);
        assert_eq!(pair.tech_overlap, 0.0);
        assert!((pair.similarity - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_affinity_averages_top_k() {
        let mut ctx = RecommendationContext::default();
        ctx.courses = (1..=5).map(course).collect();
        ctx.completed = [1, 2, 3, 4].into_iter().collect();
        ctx.course_skills.insert(5, skills(&[1, 2]));
        ctx.course_skills.insert(1, skills(&[1, 2])); // jaccard 1.0
        ctx.course_skills.insert(2, skills(&[1])); // 0.5
        ctx.course_skills.insert(3, skills(&[1, 2, 3, 4])); // 0.5
        ctx.course_skills.insert(4, skills(&[9])); // 0.0

        let config = EngineConfig {
            alpha: 0.0,
            top_k_similar: 3,
            ..EngineConfig::default()
        };
        let result = affinity(&ctx, 5, &config);

        assert!((result.score - 2.0 / 3.0).abs() < 1e-9);
        let ids: Vec<CourseId> = result.top.iter().map(|p| p.completed_course_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_affinity_with_fewer_completed_than_k() {
        let mut ctx = RecommendationContext::default();
        ctx.courses = [course(1), course(2)].into_iter().collect();
        ctx.completed = [1].into_iter().collect();
        ctx.course_skills.insert(1, skills(&[1, 2]));
        ctx.course_skills.insert(2, skills(&[2, 3]));

        let result = affinity(&ctx, 2, &EngineConfig::default());
        // Single pair: 0.4 * (1/3), averaged over one course
        assert!((result.score - 0.4 / 3.0).abs() < 1e-9);
        assert_eq!(result.top.len(), 1);
    }

    #[test]
    fn test_no_completed_courses_gives_zero() {
        let mut ctx = RecommendationContext::default();
        ctx.courses = [course(1)].into_iter().collect();

        let result = affinity(&ctx, 1, &EngineConfig::default());
        assert_eq!(result.score, 0.0);
        assert!(result.top.is_empty());
    }

    #[test]
    fn test_completed_course_missing_from_catalog_is_ignored() {
        let mut ctx = RecommendationContext::default();
        ctx.courses = [course(1)].into_iter().collect();
        ctx.completed = [42].into_iter().collect();

        let result = affinity(&ctx, 1, &EngineConfig::default());
        assert_eq!(result, AffinityScore::default());
    }
}
