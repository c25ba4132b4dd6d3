use std::collections::HashSet;

use tracing::debug;

use crate::classify::{classify, extract_course_number, is_first_year_seminar, CourseLevel};
use crate::gened::GenEdIndex;
use crate::models::{Affiliation, CourseId, CourseRecord, Requirement, School, UserProfile, Year};

const FACULTY_OF_ARTS_AND_SCIENCES: &str = "Faculty of Arts & Sciences";

const LANGUAGE_PREFIXES: [&str; 35] = [
    "FRENCH", "SPANISH", "ITALIAN", "PORTUGUESE", "GERMAN", "CHINESE", "JAPANESE", "KOREAN",
    "ARABIC", "HEBREW", "RUSSIAN", "LATIN", "GREEK", "SANSKRIT", "SWAHILI", "YIDDISH",
    "VIETNAMESE", "THAI", "HINDI", "URDU", "TURKISH", "POLISH", "CZECH", "UKRAINIAN", "SWEDISH",
    "NORWEGIAN", "DANISH", "FINNISH", "DUTCH", "INDONESIAN", "TAGALOG", "AMHARIC", "BENGALI",
    "PERSIAN", "TAMIL",
];

const INTRO_LANGUAGE_NUMBERS: [u32; 3] = [1, 2, 3];
const INTRO_LANGUAGE_LETTERS: [&str; 4] = ["A", "B", "AA", "BA"];

/// Concentration names whose catalog department is spelled differently.
pub fn concentration_department(concentration: &str) -> &str {
    match concentration {
        "Applied Math" => "Applied Mathematics",
        "Classics" => "Classics, The",
        "Comparative Study of Religion" => "Religion, The Study of",
        "Germanic Languages and Literature" => "Germanic Languages and Literatures",
        "History and Science" => "History of Science",
        "Romance Languages and Literature" => "Romance Languages and Literatures",
        "Slavic Literatures and Cultures" => "Slavic Languages and Literatures",
        "Studies of Women, Gender, and Sexuality" => "Women, Gender, and Sexuality, Studies of",
        other => other,
    }
}

fn school_matches(school: School, catalog_school: &str) -> bool {
    let expected = match school {
        School::Business => return catalog_school.contains("Business School"),
        School::ArtsAndSciences => FACULTY_OF_ARTS_AND_SCIENCES,
        School::DentalMedicine => "School of Dental Medicine",
        School::PublicHealth => "Harvard Chan School",
        School::Design => "Graduate School of Design",
        School::Divinity => "Harvard Divinity School",
        School::Education => "Graduate School of Education",
        School::Kennedy => "Harvard Kennedy School",
        School::Law => "Harvard Law School",
        School::Medical => "Harvard Medical School",
    };
    catalog_school == expected
}

fn is_graduate_number(number: u32) -> bool {
    matches!(number, 200..=299 | 300..=399 | 2000..=2999 | 3000..=3999)
}

/// Tutorial component, or "tutorial" anywhere in the title.
pub fn is_tutorial(course: &CourseRecord) -> bool {
    course.course_component.as_deref() == Some("Tutorial")
        || course.title.to_lowercase().contains("tutorial")
}

pub fn is_language_course(course: &CourseRecord) -> bool {
    if course.flags.language_requirement {
        return true;
    }
    let upper = course.course_number.to_uppercase();
    LANGUAGE_PREFIXES
        .iter()
        .any(|prefix| upper.starts_with(prefix))
}

pub fn is_intro_language_course(course: &CourseRecord) -> bool {
    let segments: Vec<&str> = course.course_number.split_whitespace().collect();
    if segments.len() > 1 {
        let last = segments[segments.len() - 1].to_uppercase();
        if INTRO_LANGUAGE_LETTERS.contains(&last.as_str()) {
            return true;
        }
    }

    extract_course_number(&course.course_number)
        .map(|number| INTRO_LANGUAGE_NUMBERS.contains(&number))
        .unwrap_or(false)
}

fn excluded_levels(year: Option<Year>) -> &'static [CourseLevel] {
    match year {
        Some(Year::Freshman) => &[
            CourseLevel::ReadingResearch,
            CourseLevel::SpecialSeminar,
            CourseLevel::SophomoreTutorial,
            CourseLevel::JuniorTutorial,
            CourseLevel::SeniorTutorial,
            CourseLevel::GradLow,
            CourseLevel::GradResearch,
        ],
        Some(Year::Sophomore) => &[CourseLevel::JuniorTutorial, CourseLevel::SeniorTutorial],
        Some(Year::Junior) => &[CourseLevel::SophomoreTutorial, CourseLevel::SeniorTutorial],
        Some(Year::Senior) => &[CourseLevel::SophomoreTutorial, CourseLevel::JuniorTutorial],
        None => &[],
    }
}

/// Grade-level gating for a single course.
pub fn year_admits(year: Option<Year>, course: &CourseRecord) -> bool {
    let level = classify(&course.course_number);
    if level == CourseLevel::GradResearch || excluded_levels(year).contains(&level) {
        return false;
    }
    !(year == Some(Year::Freshman) && course.title.contains("Tutorial"))
}

/// Admissible subset of `candidates` for `profile`.
///
/// Courses already seen or outside the selected terms never pass. The result
/// keeps candidate order, with First Year Seminars pulled in by the
/// requirement appended after the main matches.
pub fn eligible(
    profile: &UserProfile,
    candidates: &[CourseRecord],
    seen_ids: &HashSet<CourseId>,
    gened: &GenEdIndex,
) -> Vec<CourseRecord> {
    let pool: Vec<&CourseRecord> = candidates
        .iter()
        .filter(|course| !seen_ids.contains(&course.id))
        .filter(|course| profile.terms.iter().any(|term| *term == course.term))
        .collect();

    let admitted = match profile.affiliation {
        Some(Affiliation::College) => eligible_for_college(profile, &pool, gened),
        Some(Affiliation::Other) => eligible_for_other(profile, &pool),
        None => Vec::new(),
    };

    debug!(
        candidates = candidates.len(),
        in_scope = pool.len(),
        admitted = admitted.len(),
        "eligibility filter applied"
    );

    admitted.into_iter().cloned().collect()
}

struct MainFilter<'a> {
    departments: Vec<&'a str>,
    gened_codes: HashSet<String>,
    flags: Vec<Requirement>,
}

impl MainFilter<'_> {
    fn is_active(&self) -> bool {
        !self.departments.is_empty() || !self.gened_codes.is_empty() || !self.flags.is_empty()
    }

    fn matches(&self, course: &CourseRecord) -> bool {
        self.departments.contains(&course.department.as_str())
            || self.gened_codes.contains(&course.course_number)
            || self.flags.iter().any(|req| course.flags.satisfies(*req))
    }
}

fn eligible_for_college<'a>(
    profile: &'a UserProfile,
    pool: &[&'a CourseRecord],
    gened: &GenEdIndex,
) -> Vec<&'a CourseRecord> {
    let year = profile.year;
    let mut requirements: Vec<Requirement> = profile
        .requirements
        .iter()
        .filter_map(|label| Requirement::from_label(label))
        .collect();

    let wants_seminars = requirements.contains(&Requirement::FirstYearSeminar);
    requirements.retain(|req| *req != Requirement::FirstYearSeminar);

    let seminars: Vec<&CourseRecord> = if wants_seminars {
        pool.iter()
            .copied()
            .filter(|course| is_first_year_seminar(&course.course_number))
            .collect()
    } else {
        Vec::new()
    };

    if wants_seminars && profile.concentrations.is_empty() && requirements.is_empty() {
        return seminars;
    }

    let mut filter = MainFilter {
        departments: profile
            .concentrations
            .iter()
            .map(|name| concentration_department(name))
            .collect(),
        gened_codes: HashSet::new(),
        flags: Vec::new(),
    };

    for req in &requirements {
        if req.is_gen_ed() {
            let codes = gened.codes_for(req.label(), &profile.terms);
            if codes.is_empty() {
                debug!(category = req.label(), "no Gen-Ed codes, using requirement flag");
                filter.flags.push(*req);
            } else {
                filter.gened_codes.extend(codes);
            }
        } else if *req != Requirement::LanguageRequirement {
            filter.flags.push(*req);
        }
    }

    let has_gened_codes = !filter.gened_codes.is_empty();
    let divisional = requirements.iter().any(Requirement::is_divisional);
    let language = requirements.contains(&Requirement::LanguageRequirement);
    let freshman_tutorials_hidden = !has_gened_codes && year == Some(Year::Freshman);

    let mut admitted: Vec<&CourseRecord> = pool
        .iter()
        .copied()
        .filter(|course| !filter.is_active() || filter.matches(course))
        .filter(|course| !(divisional && is_tutorial(course)))
        .filter(|course| !(freshman_tutorials_hidden && is_tutorial(course)))
        .collect();

    let admitted_ids: HashSet<CourseId> = admitted.iter().map(|course| course.id).collect();
    admitted.extend(
        seminars
            .into_iter()
            .filter(|course| !admitted_ids.contains(&course.id)),
    );

    admitted.retain(|course| {
        if is_first_year_seminar(&course.course_number) {
            return true;
        }

        let is_gened_course = has_gened_codes && filter.gened_codes.contains(&course.course_number);
        if !is_gened_course && !year_admits(year, course) {
            return false;
        }

        if language {
            return is_language_course(course) && is_intro_language_course(course);
        }
        true
    });

    admitted
}

fn eligible_for_other<'a>(
    profile: &UserProfile,
    pool: &[&'a CourseRecord],
) -> Vec<&'a CourseRecord> {
    let schools: Vec<School> = profile
        .schools
        .iter()
        .filter_map(|label| School::from_label(label))
        .collect();
    if schools.is_empty() {
        return Vec::new();
    }

    let graduate_only = schools.contains(&School::ArtsAndSciences);

    pool.iter()
        .copied()
        .filter(|course| {
            let catalog_school = course.catalog_school_description.as_deref().unwrap_or("");
            schools
                .iter()
                .any(|school| school_matches(*school, catalog_school))
        })
        .filter(|course| {
            if !graduate_only
                || course.catalog_school_description.as_deref()
                    != Some(FACULTY_OF_ARTS_AND_SCIENCES)
            {
                return true;
            }
            extract_course_number(&course.course_number)
                .map(is_graduate_number)
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gened::GenEdEntry;

    fn course(id: CourseId, number: &str, department: &str) -> CourseRecord {
        CourseRecord {
            id,
            course_number: number.to_string(),
            title: format!("{number} lecture"),
            department: department.to_string(),
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

    fn numbers(courses: &[CourseRecord]) -> Vec<String> {
        let mut values: Vec<String> = courses.iter().map(|c| c.course_number.clone()).collect();
        values.sort();
        values
    }

    fn run(profile: &UserProfile, candidates: &[CourseRecord]) -> Vec<CourseRecord> {
        eligible(profile, candidates, &HashSet::new(), &GenEdIndex::new())
    }

    #[test]
    fn freshman_language_requirement_keeps_only_intro_language() {
        let mut profile = college(Year::Freshman);
        profile.requirements = vec!["Language Requirement".to_string()];
        let candidates = vec![
            course(1, "FRENCH 1", "Romance Languages and Literatures"),
            course(2, "FRENCH 10", "Romance Languages and Literatures"),
            course(3, "MATH 101", "Mathematics"),
        ];

        assert_eq!(numbers(&run(&profile, &candidates)), vec!["FRENCH 1"]);
    }

    #[test]
    fn letter_language_courses_count_as_introductory() {
        let mut profile = college(Year::Sophomore);
        profile.requirements = vec!["Language Requirement".to_string()];
        let mut flagged = course(4, "ANCIENT 120", "Classics, The");
        flagged.flags.language_requirement = true;
        let candidates = vec![
            course(1, "ARABIC A", "Near Eastern Languages"),
            course(2, "SPANISH BA", "Romance Languages and Literatures"),
            course(3, "CHINESE C", "East Asian Languages"),
            flagged,
        ];

        assert_eq!(
            numbers(&run(&profile, &candidates)),
            vec!["ARABIC A", "SPANISH BA"]
        );
    }

    #[test]
    fn graduate_school_keeps_only_graduate_numbers() {
        let profile = UserProfile {
            affiliation: Some(Affiliation::Other),
            terms: vec!["2025 Fall".to_string()],
            schools: vec!["Graduate School of Arts and Sciences".to_string()],
            ..UserProfile::default()
        };
        let mut undergrad = course(1, "101", "History");
        undergrad.catalog_school_description = Some(FACULTY_OF_ARTS_AND_SCIENCES.to_string());
        let mut research = course(2, "301", "History");
        research.catalog_school_description = Some(FACULTY_OF_ARTS_AND_SCIENCES.to_string());
        let mut unnumbered = course(3, "HIST CRR", "History");
        unnumbered.catalog_school_description = Some(FACULTY_OF_ARTS_AND_SCIENCES.to_string());
        let mut law = course(4, "LAW 2000", "Law");
        law.catalog_school_description = Some("Harvard Law School".to_string());

        let result = run(&profile, &[undergrad, research, unnumbered, law]);
        assert_eq!(numbers(&result), vec!["301"]);
    }

    #[test]
    fn business_school_matches_by_substring() {
        let profile = UserProfile {
            affiliation: Some(Affiliation::Other),
            terms: vec!["2025 Fall".to_string()],
            schools: vec![
                "Harvard Business School".to_string(),
                "Harvard Law School".to_string(),
            ],
            ..UserProfile::default()
        };
        let mut mba = course(1, "HBS 1010", "Business");
        mba.catalog_school_description = Some("Business School MBA".to_string());
        let mut law = course(2, "HLS 2000", "Law");
        law.catalog_school_description = Some("Harvard Law School".to_string());
        let mut design = course(3, "GSD 1100", "Design");
        design.catalog_school_description = Some("Graduate School of Design".to_string());

        assert_eq!(
            numbers(&run(&profile, &[mba, law, design])),
            vec!["HBS 1010", "HLS 2000"]
        );
    }

    #[test]
    fn other_affiliation_without_known_schools_is_empty() {
        let mut profile = UserProfile {
            affiliation: Some(Affiliation::Other),
            terms: vec!["2025 Fall".to_string()],
            ..UserProfile::default()
        };
        let mut law = course(1, "HLS 2000", "Law");
        law.catalog_school_description = Some("Harvard Law School".to_string());
        assert!(run(&profile, &[law.clone()]).is_empty());

        profile.schools = vec!["Hogwarts".to_string()];
        assert!(run(&profile, &[law]).is_empty());
    }

    #[test]
    fn filtering_is_order_independent() {
        let mut profile = college(Year::Sophomore);
        profile.concentrations = vec!["Computer Science".to_string()];
        profile.requirements = vec!["Quantitative Reasoning".to_string()];
        let mut stat = course(4, "STAT 110", "Statistics");
        stat.flags.quantitative_reasoning = true;
        let candidates = vec![
            course(1, "COMPSCI 50", "Computer Science"),
            course(2, "COMPSCI 98", "Computer Science"),
            course(3, "HIST 10", "History"),
            stat,
            course(5, "COMPSCI 2420", "Computer Science"),
        ];
        let mut reversed = candidates.clone();
        reversed.reverse();

        let forward = numbers(&run(&profile, &candidates));
        assert_eq!(forward, numbers(&run(&profile, &reversed)));
        assert_eq!(forward, vec!["COMPSCI 2420", "COMPSCI 50", "STAT 110"]);
        assert_eq!(forward, numbers(&run(&profile, &run(&profile, &candidates))));
    }

    #[test]
    fn seen_courses_and_other_terms_are_excluded() {
        let profile = college(Year::Junior);
        let mut spring = course(3, "ECON 1010", "Economics");
        spring.term = "2026 Spring".to_string();
        let candidates = vec![
            course(1, "ECON 10", "Economics"),
            course(2, "ECON 1011", "Economics"),
            spring,
        ];

        let seen = HashSet::from([1]);
        let result = eligible(&profile, &candidates, &seen, &GenEdIndex::new());
        assert_eq!(numbers(&result), vec!["ECON 1011"]);

        let no_terms = UserProfile {
            terms: Vec::new(),
            ..profile
        };
        assert!(run(&no_terms, &candidates).is_empty());
    }

    #[test]
    fn year_gating_follows_tutorial_ownership() {
        let candidates = vec![
            course(1, "HIST 97", "History"),
            course(2, "HIST 98", "History"),
            course(3, "HIST 99", "History"),
            course(4, "HIST 2000", "History"),
            course(5, "HIST 3000", "History"),
            course(6, "HIST 91", "History"),
        ];

        assert_eq!(
            numbers(&run(&college(Year::Freshman), &candidates)),
            Vec::<String>::new()
        );
        assert_eq!(
            numbers(&run(&college(Year::Sophomore), &candidates)),
            vec!["HIST 2000", "HIST 91", "HIST 97"]
        );
        assert_eq!(
            numbers(&run(&college(Year::Junior), &candidates)),
            vec!["HIST 2000", "HIST 91", "HIST 98"]
        );
        assert_eq!(
            numbers(&run(&college(Year::Senior), &candidates)),
            vec!["HIST 2000", "HIST 91", "HIST 99"]
        );
    }

    #[test]
    fn freshman_loses_undergraduate_tutorials() {
        let mut profile = college(Year::Freshman);
        profile.concentrations = vec!["History".to_string()];
        let mut component = course(1, "HIST 10", "History");
        component.course_component = Some("Tutorial".to_string());
        let mut titled = course(2, "HIST 11", "History");
        titled.title = "Reading tutorial".to_string();
        let candidates = vec![component, titled, course(3, "HIST 12", "History")];

        let result = run(&profile, &candidates);
        assert_eq!(result.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3]);

        // Sophomores keep both.
        profile.year = Some(Year::Sophomore);
        assert_eq!(run(&profile, &candidates).len(), 3);
    }

    #[test]
    fn freshman_title_rule_is_case_sensitive() {
        let mut capital = course(1, "HIST 10", "History");
        capital.title = "Tutorial Methods".to_string();
        let mut lower = course(2, "HIST 10", "History");
        lower.title = "methods tutorial".to_string();

        assert!(!year_admits(Some(Year::Freshman), &capital));
        assert!(year_admits(Some(Year::Freshman), &lower));
        assert!(year_admits(Some(Year::Sophomore), &capital));
    }

    #[test]
    fn gened_coded_tutorial_is_kept_for_freshman() {
        let mut profile = college(Year::Freshman);
        profile.requirements = vec!["Ethics & Civics".to_string()];
        let mut index = GenEdIndex::new();
        index.insert_term(
            "2025 Fall",
            vec![GenEdEntry {
                code: "GENED 1114".to_string(),
                categories: vec!["Ethics & Civics".to_string()],
            }],
        );
        let mut coded = course(1, "GENED 1114", "General Education");
        coded.title = "Tutorial on Civic Life".to_string();
        coded.course_component = Some("Tutorial".to_string());

        let result = eligible(&profile, &[coded], &HashSet::new(), &index);
        assert_eq!(numbers(&result), vec!["GENED 1114"]);
    }

    #[test]
    fn divisional_requirement_drops_tutorials() {
        let mut profile = college(Year::Junior);
        profile.requirements = vec!["Arts and Humanities".to_string()];
        let mut lecture = course(1, "ENGLISH 150", "English");
        lecture.flags.arts_and_humanities = true;
        let mut tutorial = course(2, "ENGLISH 151", "English");
        tutorial.flags.arts_and_humanities = true;
        tutorial.course_component = Some("Tutorial".to_string());
        let mut titled = course(3, "ENGLISH 152", "English");
        titled.flags.arts_and_humanities = true;
        titled.title = "Junior tutorial in poetry".to_string();

        assert_eq!(
            numbers(&run(&profile, &[lecture, tutorial, titled])),
            vec!["ENGLISH 150"]
        );
    }

    #[test]
    fn first_year_seminars_join_the_main_matches() {
        let mut profile = college(Year::Sophomore);
        profile.concentrations = vec!["Applied Math".to_string()];
        profile.requirements = vec!["First Year Seminar".to_string()];
        let candidates = vec![
            course(1, "APMTH 22A", "Applied Mathematics"),
            course(2, "FYSEMR 23M", "Freshman Seminars"),
            course(3, "HIST 10", "History"),
        ];

        assert_eq!(
            numbers(&run(&profile, &candidates)),
            vec!["APMTH 22A", "FYSEMR 23M"]
        );
    }

    #[test]
    fn first_year_seminar_alone_admits_only_seminars() {
        let mut profile = college(Year::Freshman);
        profile.requirements = vec!["First Year Seminar".to_string()];
        let candidates = vec![
            course(1, "FYSEMR 23M", "Freshman Seminars"),
            course(2, "HIST 10", "History"),
        ];

        assert_eq!(numbers(&run(&profile, &candidates)), vec!["FYSEMR 23M"]);
    }

    #[test]
    fn gened_codes_bypass_grade_gating() {
        let mut profile = college(Year::Freshman);
        profile.requirements = vec!["Ethics & Civics".to_string()];
        let mut index = GenEdIndex::new();
        index.insert_term(
            "2025 Fall",
            vec![GenEdEntry {
                code: "GENED 2100".to_string(),
                categories: vec!["Ethics & Civics".to_string()],
            }],
        );
        let mut tutorial = course(3, "GOV 20", "Government");
        tutorial.course_component = Some("Tutorial".to_string());
        let candidates = vec![
            course(1, "GENED 2100", "General Education"),
            course(2, "GENED 1000", "General Education"),
            tutorial,
        ];

        let result = eligible(&profile, &candidates, &HashSet::new(), &index);
        assert_eq!(numbers(&result), vec!["GENED 2100"]);
    }

    #[test]
    fn empty_gened_resolution_falls_back_to_flags() {
        let mut profile = college(Year::Junior);
        profile.requirements = vec!["Aesthetics & Culture".to_string()];
        let mut flagged = course(1, "AFRAMER 11", "African and African American Studies");
        flagged.flags.aesthetics_and_culture = true;
        let candidates = vec![flagged, course(2, "HIST 10", "History")];

        assert_eq!(numbers(&run(&profile, &candidates)), vec!["AFRAMER 11"]);
    }

    #[test]
    fn no_selections_admit_everything_in_term() {
        let profile = college(Year::Junior);
        let candidates = vec![
            course(1, "HIST 10", "History"),
            course(2, "ECON 1010", "Economics"),
        ];
        assert_eq!(run(&profile, &candidates).len(), 2);
    }

    #[test]
    fn missing_affiliation_admits_nothing() {
        let profile = UserProfile {
            terms: vec!["2025 Fall".to_string()],
            ..UserProfile::default()
        };
        assert!(run(&profile, &[course(1, "HIST 10", "History")]).is_empty());
    }
}
