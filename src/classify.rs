/// Difficulty/category tag derived from a catalog number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseLevel {
    UgIntro,
    UgMid,
    GradLow,
    GradResearch,
    SophomoreTutorial,
    JuniorTutorial,
    SeniorTutorial,
    SpecialSeminar,
    ReadingResearch,
    Alpha,
    Unknown,
}

impl CourseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::UgIntro => "UG_intro",
            CourseLevel::UgMid => "UG_mid",
            CourseLevel::GradLow => "Grad_low",
            CourseLevel::GradResearch => "Grad_research",
            CourseLevel::SophomoreTutorial => "SophomoreTutorial",
            CourseLevel::JuniorTutorial => "JuniorTutorial",
            CourseLevel::SeniorTutorial => "SeniorTutorial",
            CourseLevel::SpecialSeminar => "SpecialSeminar",
            CourseLevel::ReadingResearch => "ReadingResearch",
            CourseLevel::Alpha => "Alpha",
            CourseLevel::Unknown => "Unknown",
        }
    }
}

pub const FIRST_YEAR_SEMINAR_PREFIX: &str = "FYSEMR";

fn last_segment(catalog_number: &str) -> Option<&str> {
    catalog_number.split_whitespace().last()
}

/// Numeric part of the last whitespace-delimited segment ("COMPSCI 50A" -> 50).
pub fn extract_course_number(catalog_number: &str) -> Option<u32> {
    let digits: String = last_segment(catalog_number)?
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return None;
    }

    digits.parse().ok()
}

pub fn classify(catalog_number: &str) -> CourseLevel {
    let segment = last_segment(catalog_number).unwrap_or("");
    if !segment.chars().any(|c| c.is_ascii_digit()) {
        return if segment.chars().any(char::is_alphabetic) {
            CourseLevel::Alpha
        } else {
            CourseLevel::Unknown
        };
    }

    // Digits that overflow are past every catalog range.
    let Some(number) = extract_course_number(catalog_number) else {
        return CourseLevel::Unknown;
    };

    match number {
        97 | 970 => CourseLevel::SophomoreTutorial,
        98 | 980 => CourseLevel::JuniorTutorial,
        99 | 990 => CourseLevel::SeniorTutorial,
        96 | 960 => CourseLevel::SpecialSeminar,
        91 | 910 => CourseLevel::ReadingResearch,
        1..=99 | 1000..=1099 => CourseLevel::UgIntro,
        100..=199 | 1100..=1999 => CourseLevel::UgMid,
        200..=299 | 2000..=2999 => CourseLevel::GradLow,
        300..=399 | 3000..=3999 => CourseLevel::GradResearch,
        _ => CourseLevel::Unknown,
    }
}

pub fn is_first_year_seminar(catalog_number: &str) -> bool {
    catalog_number.starts_with(FIRST_YEAR_SEMINAR_PREFIX)
}
