//! Career-goal technical fit (`S_role`).

use std::collections::{HashMap, HashSet};

use crate::models::{RequiredSkill, SkillId};

/// Mean of `weight * relevance` over every technical skill the goal requires
///
/// Skills the course does not list contribute zero. A goal without technical
/// requirements scores every course as zero. A skill listed twice counts once,
/// with the weight of its first entry.
pub fn role_fit(required: &[RequiredSkill], course_skills: Option<&HashMap<SkillId, f64>>) -> f64 {
    let mut seen = HashSet::new();
    let unique: Vec<&RequiredSkill> = required
        .iter()
        .filter(|r| seen.insert(r.skill_id))
        .collect();

    if unique.is_empty() {
        return 0.0;
    }

    let total: f64 = unique
        .iter()
        .map(|r| r.weight * relevance(course_skills, r.skill_id))
        .sum();

    total / unique.len() as f64
}

/// Goal-required skills split into those a course covers and those it lacks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillCoverage {
    /// `(skill_id, relevance)` for skills the course teaches with relevance > 0
    pub matched: Vec<(SkillId, f64)>,
    pub missing: Vec<SkillId>,
}

pub fn coverage(
    required: &[RequiredSkill],
    course_skills: Option<&HashMap<SkillId, f64>>,
) -> SkillCoverage {
    let mut ids: Vec<SkillId> = required.iter().map(|r| r.skill_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let mut result = SkillCoverage::default();
    for skill_id in ids {
        let score = relevance(course_skills, skill_id);
        if score > 0.0 {
            result.matched.push((skill_id, score));
        } else {
            result.missing.push(skill_id);
        }
    }
    result
}

fn relevance(course_skills: Option<&HashMap<SkillId, f64>>, skill_id: SkillId) -> f64 {
    course_skills
        .and_then(|skills| skills.get(&skill_id))
        .copied()
        .unwrap_or(0.0)
}
