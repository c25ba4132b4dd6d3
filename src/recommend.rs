use std::collections::{HashMap, HashSet};

use rand::Rng;
use tracing::debug;

use crate::eligibility;
use crate::error::{Error, Result};
use crate::gened::GenEdIndex;
use crate::matches::{self, ComparisonPair};
use crate::models::{Affiliation, CourseId, CourseRecord, Judgment, UserProfile};
use crate::ranker;
use crate::selector;

/// Checks the selections needed before a recommendation can be made.
pub fn validate_profile(profile: &UserProfile) -> Result<()> {
    let Some(affiliation) = profile.affiliation else {
        return Err(Error::InvalidProfile(
            "Please set your preferences first!".to_string(),
        ));
    };

    if profile.terms.is_empty() {
        return Err(Error::InvalidProfile(
            "Please select at least one term preference first!".to_string(),
        ));
    }

    let complete = match affiliation {
        Affiliation::College => profile.year.is_some(),
        Affiliation::Other => !profile.schools.is_empty(),
    };
    if !complete {
        return Err(Error::InvalidProfile(
            "Please complete your profile preferences first!".to_string(),
        ));
    }

    Ok(())
}

/// Next course to show, or `None` when nothing eligible remains.
pub fn get_next_course<R: Rng + ?Sized>(
    profile: &UserProfile,
    candidates: &[CourseRecord],
    seen_ids: &HashSet<CourseId>,
    gened: &GenEdIndex,
    rng: &mut R,
) -> Result<Option<CourseRecord>> {
    validate_profile(profile)?;

    let eligible = eligibility::eligible(profile, candidates, seen_ids, gened);
    let picked = selector::select(profile, &eligible, rng);
    debug!(
        eligible = eligible.len(),
        picked = picked.as_ref().map(|course| course.id),
        "recommendation drawn"
    );
    Ok(picked)
}

pub fn get_ranking(courses: &[CourseRecord], judgments: &[Judgment]) -> HashMap<CourseId, usize> {
    let ids: Vec<CourseId> = courses.iter().map(|course| course.id).collect();
    ranker::rank(&ids, judgments)
}

pub fn get_comparison_pair<R: Rng + ?Sized>(
    courses: &[CourseRecord],
    judgments: &[Judgment],
    rng: &mut R,
) -> Option<ComparisonPair> {
    matches::comparison_pair(courses, judgments, rng)
}
