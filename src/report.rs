use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::matches::{ComparisonPair, TermBoard};
use crate::models::PreferenceStatus;

#[derive(Debug, Serialize)]
struct BoardRow<'a> {
    term: &'a str,
    position: Option<usize>,
    course_number: &'a str,
    title: &'a str,
    status: &'a str,
    ranked: bool,
}

pub fn build_report(
    username: &str,
    generated_on: NaiveDate,
    boards: &[TermBoard],
    next_pair: Option<&ComparisonPair>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Saved Course Rankings");
    let _ = writeln!(output, "Generated for {} on {}", username, generated_on);

    if boards.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No saved courses yet. Heart or star courses to rank them.");
        return output;
    }

    for board in boards {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", board.term);

        if board.ranked {
            let _ = writeln!(
                output,
                "Ranked from {} comparisons.",
                board.judgment_count
            );
        } else {
            let _ = writeln!(
                output,
                "Provisional order ({} of {} comparisons needed to rank).",
                board.judgment_count, board.required_judgments
            );
        }

        for entry in &board.entries {
            let course = &entry.saved.course;
            let marker = if entry.saved.status == PreferenceStatus::Star {
                " ★"
            } else {
                ""
            };
            match entry.position {
                Some(position) => {
                    let _ = writeln!(
                        output,
                        "{}. {}: {}{}",
                        position, course.course_number, course.title, marker
                    );
                }
                None => {
                    let _ = writeln!(
                        output,
                        "- {}: {}{}",
                        course.course_number, course.title, marker
                    );
                }
            }
        }
    }

    if let Some(pair) = next_pair {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Next Comparison");
        let _ = writeln!(
            output,
            "{} ({}) vs {} ({}) for {}",
            pair.first.course_number,
            pair.first.id,
            pair.second.course_number,
            pair.second.id,
            pair.term
        );
    }

    output
}

pub fn write_csv<W: std::io::Write>(writer: W, boards: &[TermBoard]) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0usize;

    for board in boards {
        for entry in &board.entries {
            csv_writer.serialize(BoardRow {
                term: &board.term,
                position: entry.position,
                course_number: &entry.saved.course.course_number,
                title: &entry.saved.course.title,
                status: entry.saved.status.as_str(),
                ranked: board.ranked,
            })?;
            written += 1;
        }
    }

    csv_writer.flush()?;
    Ok(written)
}
