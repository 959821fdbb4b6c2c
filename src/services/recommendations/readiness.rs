//! Human-skill readiness and the hard eligibility gate.

use std::collections::{BTreeSet, HashSet};

use crate::models::SkillId;

pub const BLOCKED_REASON: &str =
    "No overlap between student's human skills and required human skills for this goal";

#[derive(Debug, Clone, PartialEq)]
pub struct ReadinessReport {
    /// Share of required human skills the student has; 1.0 when none are required
    pub soft_readiness: f64,
    pub overlap: Vec<SkillId>,
    pub missing: Vec<SkillId>,
}

/// Gate result: a blocked student gets no per-course scoring at all
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    Ready(ReadinessReport),
    Blocked(ReadinessReport),
}

impl Readiness {
    pub fn report(&self) -> &ReadinessReport {
        match self {
            Readiness::Ready(report) | Readiness::Blocked(report) => report,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Readiness::Blocked(_))
    }
}

pub fn evaluate(required: &[SkillId], possessed: &HashSet<SkillId>) -> Readiness {
    let required: BTreeSet<SkillId> = required.iter().copied().collect();
    if required.is_empty() {
        return Readiness::Ready(ReadinessReport {
            soft_readiness: 1.0,
            overlap: Vec::new(),
            missing: Vec::new(),
        });
    }

    let (overlap, missing): (Vec<SkillId>, Vec<SkillId>) =
        required.iter().partition(|id| possessed.contains(*id));

    let report = ReadinessReport {
        soft_readiness: overlap.len() as f64 / required.len() as f64,
        overlap,
        missing,
    };

    if report.overlap.is_empty() {
        Readiness::Blocked(report)
    } else {
        Readiness::Ready(report)
    }
}
