//! Incremental pairwise ranking.
//!
//! Judgments ("winner beats loser") form a partial order that may be
//! incomplete or even cyclic. [`rank_ids`] completes it into a total order by
//! binary insertion, asking a [`Comparator`] for a three-valued verdict at each
//! midpoint. Unknown verdicts place the newcomer after the midpoint, which
//! keeps the result deterministic for a given input order and judgment list.

use std::collections::HashMap;

use crate::models::{CourseId, Judgment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Better,
    Worse,
    Unknown,
}

pub trait Comparator {
    /// How `a` compares to `b`.
    fn compare(&self, a: CourseId, b: CourseId) -> Verdict;
}

/// Direct judgments first, net win count second.
#[derive(Debug, Clone, Default)]
pub struct JudgmentComparator {
    wins: HashMap<CourseId, i64>,
    direct: HashMap<(CourseId, CourseId), bool>,
}

impl JudgmentComparator {
    pub fn new(judgments: &[Judgment]) -> Self {
        let mut comparator = Self::default();

        for judgment in judgments {
            *comparator.wins.entry(judgment.winner).or_insert(0) += 1;
            *comparator.wins.entry(judgment.loser).or_insert(0) -= 1;
        }

        // Later judgments on the same pair overwrite earlier ones.
        for judgment in judgments {
            comparator
                .direct
                .insert((judgment.winner, judgment.loser), true);
            comparator
                .direct
                .insert((judgment.loser, judgment.winner), false);
        }

        comparator
    }

    pub fn net_wins(&self, id: CourseId) -> i64 {
        self.wins.get(&id).copied().unwrap_or(0)
    }
}

impl Comparator for JudgmentComparator {
    fn compare(&self, a: CourseId, b: CourseId) -> Verdict {
        match self.direct.get(&(a, b)) {
            Some(true) => return Verdict::Better,
            Some(false) => return Verdict::Worse,
            None => {}
        }

        match self.net_wins(a).cmp(&self.net_wins(b)) {
            std::cmp::Ordering::Greater => Verdict::Better,
            std::cmp::Ordering::Less => Verdict::Worse,
            std::cmp::Ordering::Equal => Verdict::Unknown,
        }
    }
}

/// Best-first order of `ids`, inserting each in turn by binary search.
pub fn rank_ids<C: Comparator + ?Sized>(ids: &[CourseId], comparator: &C) -> Vec<CourseId> {
    let mut sorted: Vec<CourseId> = Vec::with_capacity(ids.len());

    for &id in ids {
        let mut low = 0;
        let mut high = sorted.len();

        while low < high {
            let mid = (low + high) / 2;
            match comparator.compare(id, sorted[mid]) {
                Verdict::Better => high = mid,
                Verdict::Worse | Verdict::Unknown => low = mid + 1,
            }
        }

        sorted.insert(low, id);
    }

    sorted
}

/// Rank position per course, 0 being the best.
pub fn rank(ids: &[CourseId], judgments: &[Judgment]) -> HashMap<CourseId, usize> {
    match ids {
        [] => return HashMap::new(),
        [only] => return HashMap::from([(*only, 0)]),
        _ => {}
    }

    let comparator = JudgmentComparator::new(judgments);

    let mut initial = ids.to_vec();
    initial.sort_by_key(|id| std::cmp::Reverse(comparator.net_wins(*id)));

    rank_ids(&initial, &comparator)
        .into_iter()
        .enumerate()
        .map(|(position, id)| (id, position))
        .collect()
}
