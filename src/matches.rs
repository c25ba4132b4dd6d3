use std::collections::{BTreeMap, HashMap, HashSet};

use rand::prelude::*;

use crate::models::{CourseId, CourseRecord, Judgment, PreferenceStatus, SavedCourse};
use crate::ranker;

/// Bucket for courses without a term label.
pub const OTHER_TERM: &str = "Other";

pub fn term_label(course: &CourseRecord) -> &str {
    if course.term.is_empty() {
        OTHER_TERM
    } else {
        &course.term
    }
}

/// Judgments a term needs before its ranked order is trusted.
pub fn required_judgments(course_count: usize) -> usize {
    if course_count > 1 {
        (course_count - 1).clamp(3, 10)
    } else {
        0
    }
}

/// Judgments whose two courses are both present and share a term, keyed by term.
pub fn judgments_by_term(
    courses: &[&CourseRecord],
    judgments: &[Judgment],
) -> BTreeMap<String, Vec<Judgment>> {
    let terms: HashMap<CourseId, &str> = courses
        .iter()
        .map(|course| (course.id, term_label(course)))
        .collect();

    let mut grouped: BTreeMap<String, Vec<Judgment>> = BTreeMap::new();
    for judgment in judgments {
        match (terms.get(&judgment.winner), terms.get(&judgment.loser)) {
            (Some(winner_term), Some(loser_term)) if winner_term == loser_term => {
                grouped
                    .entry(winner_term.to_string())
                    .or_default()
                    .push(*judgment);
            }
            _ => {}
        }
    }
    grouped
}

#[derive(Debug, Clone)]
pub struct BoardEntry {
    pub saved: SavedCourse,
    /// 1-based position once the term is ranked.
    pub position: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct TermBoard {
    pub term: String,
    pub entries: Vec<BoardEntry>,
    pub judgment_count: usize,
    pub required_judgments: usize,
    pub ranked: bool,
}

/// Saved courses grouped by term, each term ranked from its own judgments.
///
/// A term shows its ranked order only once it has enough judgments; until then
/// starred courses come first, then catalog number order.
pub fn build_boards(saved: &[SavedCourse], judgments: &[Judgment]) -> Vec<TermBoard> {
    let mut by_term: BTreeMap<String, Vec<SavedCourse>> = BTreeMap::new();
    for entry in saved {
        by_term
            .entry(term_label(&entry.course).to_string())
            .or_default()
            .push(entry.clone());
    }

    let courses: Vec<&CourseRecord> = saved.iter().map(|entry| &entry.course).collect();
    let scoped = judgments_by_term(&courses, judgments);

    by_term
        .into_iter()
        .map(|(term, mut entries)| {
            let term_judgments = scoped.get(&term).map(Vec::as_slice).unwrap_or(&[]);
            let required = required_judgments(entries.len());
            let rankings = if term_judgments.is_empty() {
                HashMap::new()
            } else {
                let ids: Vec<CourseId> = entries.iter().map(|entry| entry.course.id).collect();
                ranker::rank(&ids, term_judgments)
            };
            let ranked = term_judgments.len() >= required && !rankings.is_empty();

            if ranked {
                entries.sort_by_key(|entry| {
                    rankings
                        .get(&entry.course.id)
                        .copied()
                        .unwrap_or(usize::MAX)
                });
            } else {
                entries.sort_by(|a, b| {
                    let a_key = (a.status != PreferenceStatus::Star, &a.course.course_number);
                    let b_key = (b.status != PreferenceStatus::Star, &b.course.course_number);
                    a_key.cmp(&b_key)
                });
            }

            let entries = entries
                .into_iter()
                .map(|saved| {
                    let position = if ranked {
                        rankings.get(&saved.course.id).map(|rank| rank + 1)
                    } else {
                        None
                    };
                    BoardEntry { saved, position }
                })
                .collect();

            TermBoard {
                term,
                entries,
                judgment_count: term_judgments.len(),
                required_judgments: required,
                ranked,
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ComparisonPair {
    pub term: String,
    pub first: CourseRecord,
    pub second: CourseRecord,
}

/// Two same-term courses to judge next, preferring a pair not yet judged.
pub fn comparison_pair<R: Rng + ?Sized>(
    courses: &[CourseRecord],
    judgments: &[Judgment],
    rng: &mut R,
) -> Option<ComparisonPair> {
    let mut by_term: BTreeMap<&str, Vec<&CourseRecord>> = BTreeMap::new();
    for course in courses {
        by_term.entry(term_label(course)).or_default().push(course);
    }
    by_term.retain(|_, term_courses| term_courses.len() >= 2);
    if by_term.is_empty() {
        return None;
    }

    let all: Vec<&CourseRecord> = courses.iter().collect();
    let scoped = judgments_by_term(&all, judgments);

    let mut open: BTreeMap<&str, Vec<(&CourseRecord, &CourseRecord)>> = BTreeMap::new();
    for (term, term_courses) in &by_term {
        let judged: HashSet<(CourseId, CourseId)> = scoped
            .get(*term)
            .into_iter()
            .flatten()
            .flat_map(|j| [(j.winner, j.loser), (j.loser, j.winner)])
            .collect();

        let pairs: Vec<(&CourseRecord, &CourseRecord)> = term_courses
            .iter()
            .enumerate()
            .flat_map(|(i, first)| {
                term_courses[i + 1..]
                    .iter()
                    .map(move |second| (*first, *second))
            })
            .filter(|(first, second)| !judged.contains(&(first.id, second.id)))
            .collect();

        if !pairs.is_empty() {
            open.insert(*term, pairs);
        }
    }

    if !open.is_empty() {
        let terms: Vec<&str> = open.keys().copied().collect();
        let term = *terms.choose(rng)?;
        let (first, second) = *open.get(term)?.choose(rng)?;
        return Some(ComparisonPair {
            term: term.to_string(),
            first: first.clone(),
            second: second.clone(),
        });
    }

    let terms: Vec<&str> = by_term.keys().copied().collect();
    let term = *terms.choose(rng)?;
    let picked: Vec<&&CourseRecord> = by_term.get(term)?.choose_multiple(rng, 2).collect();
    match picked.as_slice() {
        [first, second] => Some(ComparisonPair {
            term: term.to_string(),
            first: (**first).clone(),
            second: (**second).clone(),
        }),
        _ => None,
    }
}
