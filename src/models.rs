use chrono::{DateTime, Utc};

pub type CourseId = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequirementFlags {
    pub science_and_technology_in_society: bool,
    pub aesthetics_and_culture: bool,
    pub ethics_and_civics: bool,
    pub histories_societies_individuals: bool,
    pub arts_and_humanities: bool,
    pub social_sciences: bool,
    pub science_engineering_applied: bool,
    pub quantitative_reasoning: bool,
    pub concentration_requirement: bool,
    pub language_requirement: bool,
}

impl RequirementFlags {
    /// Whether the course carries the boolean flag backing `requirement`.
    /// First Year Seminar has no flag; it is detected by catalog prefix.
    pub fn satisfies(&self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::ScienceTechnologyInSociety => self.science_and_technology_in_society,
            Requirement::AestheticsCulture => self.aesthetics_and_culture,
            Requirement::EthicsCivics => self.ethics_and_civics,
            Requirement::HistoriesSocietiesIndividuals => self.histories_societies_individuals,
            Requirement::ArtsHumanities => self.arts_and_humanities,
            Requirement::SocialSciences => self.social_sciences,
            Requirement::ScienceEngineeringApplied => self.science_engineering_applied,
            Requirement::QuantitativeReasoning => self.quantitative_reasoning,
            Requirement::LanguageRequirement => self.language_requirement,
            Requirement::FirstYearSeminar => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CourseRecord {
    pub id: CourseId,
    pub course_number: String,
    pub title: String,
    pub department: String,
    pub term: String,
    pub instructor_name: Option<String>,
    pub description: Option<String>,
    pub catalog_school_description: Option<String>,
    pub course_component: Option<String>,
    pub subject_description: Option<String>,
    pub class_level_attribute: Option<String>,
    pub class_level_attribute_description: Option<String>,
    pub flags: RequirementFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Affiliation {
    #[value(name = "college")]
    College,
    #[value(name = "other")]
    Other,
}

impl Affiliation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Affiliation::College => "CollegeAffiliation",
            Affiliation::Other => "OtherAffiliation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CollegeAffiliation" | "Harvard College" => Some(Affiliation::College),
            "OtherAffiliation" | "Other" => Some(Affiliation::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Year {
    Freshman,
    Sophomore,
    Junior,
    Senior,
}

impl Year {
    pub fn as_str(&self) -> &'static str {
        match self {
            Year::Freshman => "Freshman",
            Year::Sophomore => "Sophomore",
            Year::Junior => "Junior",
            Year::Senior => "Senior",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "freshman" => Some(Year::Freshman),
            "sophomore" => Some(Year::Sophomore),
            "junior" => Some(Year::Junior),
            "senior" => Some(Year::Senior),
            _ => None,
        }
    }
}

/// Requirement categories a College student can select on their profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    FirstYearSeminar,
    LanguageRequirement,
    ScienceTechnologyInSociety,
    AestheticsCulture,
    EthicsCivics,
    HistoriesSocietiesIndividuals,
    ArtsHumanities,
    SocialSciences,
    ScienceEngineeringApplied,
    QuantitativeReasoning,
}

impl Requirement {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "First Year Seminar" => Some(Requirement::FirstYearSeminar),
            "Language Requirement" => Some(Requirement::LanguageRequirement),
            "Science & Technology in Society" => Some(Requirement::ScienceTechnologyInSociety),
            "Aesthetics & Culture" => Some(Requirement::AestheticsCulture),
            "Ethics & Civics" => Some(Requirement::EthicsCivics),
            "Histories, Societies, Individuals" => Some(Requirement::HistoriesSocietiesIndividuals),
            "Arts and Humanities" => Some(Requirement::ArtsHumanities),
            "Social Sciences" => Some(Requirement::SocialSciences),
            "Science and Engineering and Applied Science" => {
                Some(Requirement::ScienceEngineeringApplied)
            }
            "Quantitative Reasoning" => Some(Requirement::QuantitativeReasoning),
            _ => None,
        }
    }

    /// Category name as it appears in the Gen-Ed data files.
    pub fn label(&self) -> &'static str {
        match self {
            Requirement::FirstYearSeminar => "First Year Seminar",
            Requirement::LanguageRequirement => "Language Requirement",
            Requirement::ScienceTechnologyInSociety => "Science & Technology in Society",
            Requirement::AestheticsCulture => "Aesthetics & Culture",
            Requirement::EthicsCivics => "Ethics & Civics",
            Requirement::HistoriesSocietiesIndividuals => "Histories, Societies, Individuals",
            Requirement::ArtsHumanities => "Arts and Humanities",
            Requirement::SocialSciences => "Social Sciences",
            Requirement::ScienceEngineeringApplied => "Science and Engineering and Applied Science",
            Requirement::QuantitativeReasoning => "Quantitative Reasoning",
        }
    }

    pub fn is_gen_ed(&self) -> bool {
        matches!(
            self,
            Requirement::ScienceTechnologyInSociety
                | Requirement::AestheticsCulture
                | Requirement::EthicsCivics
                | Requirement::HistoriesSocietiesIndividuals
        )
    }

    pub fn is_divisional(&self) -> bool {
        matches!(
            self,
            Requirement::ArtsHumanities
                | Requirement::SocialSciences
                | Requirement::ScienceEngineeringApplied
        )
    }
}

/// Schools selectable by users outside the College.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum School {
    ArtsAndSciences,
    Business,
    DentalMedicine,
    PublicHealth,
    Design,
    Divinity,
    Education,
    Kennedy,
    Law,
    Medical,
}

impl School {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Graduate School of Arts and Sciences" => Some(School::ArtsAndSciences),
            "Harvard Business School" => Some(School::Business),
            "Harvard School of Dental Medicine" => Some(School::DentalMedicine),
            "Harvard T.H. Chan School of Public Health" => Some(School::PublicHealth),
            "Graduate School of Design" => Some(School::Design),
            "Harvard Divinity School" => Some(School::Divinity),
            "Harvard Graduate School of Education" => Some(School::Education),
            "Harvard Kennedy School" => Some(School::Kennedy),
            "Harvard Law School" => Some(School::Law),
            "Harvard Medical School" => Some(School::Medical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub affiliation: Option<Affiliation>,
    pub year: Option<Year>,
    pub terms: Vec<String>,
    pub concentrations: Vec<String>,
    pub requirements: Vec<String>,
    pub schools: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum PreferenceStatus {
    Heart,
    Star,
    Discard,
}

impl PreferenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceStatus::Heart => "heart",
            PreferenceStatus::Star => "star",
            PreferenceStatus::Discard => "discard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "heart" => Some(PreferenceStatus::Heart),
            "star" => Some(PreferenceStatus::Star),
            "discard" => Some(PreferenceStatus::Discard),
            _ => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, PreferenceStatus::Heart | PreferenceStatus::Star)
    }
}

#[derive(Debug, Clone)]
pub struct Preference {
    pub course_id: CourseId,
    pub status: PreferenceStatus,
    pub recorded_at: DateTime<Utc>,
}

/// A saved preference joined with the course it refers to.
#[derive(Debug, Clone)]
pub struct SavedCourse {
    pub course: CourseRecord,
    pub status: PreferenceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Judgment {
    pub winner: CourseId,
    pub loser: CourseId,
}

impl Judgment {
    pub fn new(winner: CourseId, loser: CourseId) -> Self {
        Self { winner, loser }
    }
}
