use rand::distributions::WeightedIndex;
use rand::prelude::*;
use tracing::debug;

use crate::classify::{classify, is_first_year_seminar, CourseLevel};
use crate::models::{Affiliation, CourseRecord, UserProfile, Year};

pub const FIRST_YEAR_SEMINAR_WEIGHT: u32 = 3;
pub const ALPHA_WEIGHT: u32 = 4;

/// Draw weight for a course of `level` shown to a student in `year`.
pub fn level_weight(year: Year, level: CourseLevel) -> u32 {
    use CourseLevel::*;

    match (year, level) {
        (Year::Freshman, UgIntro) => 8,
        (Year::Sophomore, UgIntro) => 5,
        (Year::Junior, UgIntro) => 2,
        (Year::Senior, UgIntro) => 1,

        (Year::Freshman, UgMid) => 2,
        (Year::Sophomore, UgMid) => 5,
        (Year::Junior, UgMid) => 8,
        (Year::Senior, UgMid) => 7,

        (Year::Junior, GradLow) => 3,
        (Year::Senior, GradLow) => 6,

        (_, Alpha) => ALPHA_WEIGHT,

        (Year::Sophomore, SophomoreTutorial)
        | (Year::Junior, JuniorTutorial)
        | (Year::Senior, SeniorTutorial) => 2,
        (Year::Sophomore | Year::Junior | Year::Senior, SpecialSeminar | ReadingResearch) => 2,

        _ => 0,
    }
}

/// Weight of `course` for `year`; a missing year weighs everything at zero.
pub fn course_weight(year: Option<Year>, course: &CourseRecord) -> u32 {
    let Some(year) = year else {
        return 0;
    };

    if is_first_year_seminar(&course.course_number) {
        return if year == Year::Freshman {
            FIRST_YEAR_SEMINAR_WEIGHT
        } else {
            0
        };
    }

    level_weight(year, classify(&course.course_number))
}

/// Picks the next course to show from an already-eligible set.
///
/// College students draw with probability proportional to [`course_weight`];
/// everyone else draws uniformly.
pub fn select<R: Rng + ?Sized>(
    profile: &UserProfile,
    eligible: &[CourseRecord],
    rng: &mut R,
) -> Option<CourseRecord> {
    if profile.affiliation != Some(Affiliation::College) {
        return eligible.choose(rng).cloned();
    }

    let weighted: Vec<(&CourseRecord, u32)> = eligible
        .iter()
        .map(|course| (course, course_weight(profile.year, course)))
        .filter(|(_, weight)| *weight > 0)
        .collect();

    let total: u32 = weighted.iter().map(|(_, weight)| weight).sum();
    debug!(
        eligible = eligible.len(),
        weighted = weighted.len(),
        total_weight = total,
        "built weighted pool"
    );

    if weighted.is_empty() {
        return None;
    }

    let index = WeightedIndex::new(weighted.iter().map(|(_, weight)| *weight)).ok()?;
    Some(weighted[index.sample(rng)].0.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn course(id: i64, number: &str) -> CourseRecord {
        CourseRecord {
            id,
            course_number: number.to_string(),
            title: number.to_string(),
            term: "2025 Fall".to_string(),
            ..CourseRecord::default()
        }
    }

    fn college(year: Year) -> UserProfile {
        UserProfile {
            affiliation: Some(Affiliation::College),
            year: Some(year),
            terms: vec!["2025 Fall".to_string()],
            ..UserProfile::default()
        }
    }

    #[test]
    fn weight_table_matches_year_preferences() {
        use CourseLevel::*;

        let expected = [
            (UgIntro, [8, 5, 2, 1]),
            (UgMid, [2, 5, 8, 7]),
            (GradLow, [0, 0, 3, 6]),
            (GradResearch, [0, 0, 0, 0]),
            (Alpha, [4, 4, 4, 4]),
            (SpecialSeminar, [0, 2, 2, 2]),
            (ReadingResearch, [0, 2, 2, 2]),
            (SophomoreTutorial, [0, 2, 0, 0]),
            (JuniorTutorial, [0, 0, 2, 0]),
            (SeniorTutorial, [0, 0, 0, 2]),
            (Unknown, [0, 0, 0, 0]),
        ];

        for (level, weights) in expected {
            let years = [Year::Freshman, Year::Sophomore, Year::Junior, Year::Senior];
            for (year, weight) in years.into_iter().zip(weights) {
                assert_eq!(level_weight(year, level), weight, "{year:?} {level:?}");
            }
        }
    }

    #[test]
    fn first_year_seminars_only_weigh_for_freshmen() {
        let seminar = course(1, "FYSEMR 23M");
        assert_eq!(course_weight(Some(Year::Freshman), &seminar), 3);
        assert_eq!(course_weight(Some(Year::Junior), &seminar), 0);
        assert_eq!(course_weight(None, &course(2, "COMPSCI 50")), 0);
    }

    #[test]
    fn never_selects_zero_weight_courses() {
        let candidates = vec![
            course(1, "COMPSCI 50"),
            course(2, "COMPSCI 2420"),
            course(3, "FYSEMR 23M"),
            course(4, "COMPSCI 124"),
        ];
        let profile = college(Year::Sophomore);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            let picked = select(&profile, &candidates, &mut rng).unwrap();
            assert!(picked.id == 1 || picked.id == 4, "picked {}", picked.course_number);
        }
    }

    #[test]
    fn draws_follow_weights() {
        let candidates = vec![course(1, "COMPSCI 50"), course(2, "COMPSCI 124")];
        let profile = college(Year::Freshman);
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<i64, usize> = HashMap::new();

        for _ in 0..5000 {
            let picked = select(&profile, &candidates, &mut rng).unwrap();
            *counts.entry(picked.id).or_default() += 1;
        }

        // 8:2 split
        let intro_share = counts[&1] as f64 / 5000.0;
        assert!((intro_share - 0.8).abs() < 0.03, "intro share {intro_share}");
    }

    #[test]
    fn empty_pool_yields_none() {
        let profile = college(Year::Freshman);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select(&profile, &[], &mut rng).is_none());
        assert!(select(&profile, &[course(1, "STAT 2010")], &mut rng).is_none());
    }

    #[test]
    fn other_affiliation_draws_uniformly() {
        let profile = UserProfile {
            affiliation: Some(Affiliation::Other),
            terms: vec!["2025 Fall".to_string()],
            schools: vec!["Harvard Law School".to_string()],
            ..UserProfile::default()
        };
        let candidates = vec![course(1, "HLS 3000"), course(2, "HLS 2000")];
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();

        for _ in 0..200 {
            seen.insert(select(&profile, &candidates, &mut rng).unwrap().id);
        }
        assert_eq!(seen.len(), 2);
    }
}
