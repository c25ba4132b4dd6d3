use std::collections::HashSet;

use anyhow::{bail, Context};
use serde::Deserialize;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    Affiliation, CourseId, CourseRecord, Judgment, Preference, PreferenceStatus,
    RequirementFlags, SavedCourse, UserProfile, Year,
};

/// Upper bound on candidates handed to the eligibility filter in one request.
pub const MAX_CANDIDATES: i64 = 20_000;

const COURSE_COLUMNS: &str = "c.id, c.course_number, c.course_title, c.instructor_name, \
     c.term_description, c.department, c.description, c.class_level_attribute, \
     c.class_level_attribute_description, c.course_component, c.subject_description, \
     c.catalog_school_description, c.science_and_technology_in_society, \
     c.aesthetics_and_culture, c.ethics_and_civics, c.histories_societies_individuals, \
     c.arts_and_humanities, c.social_sciences, c.science_engineering_applied, \
     c.quantitative_reasoning, c.concentration_requirement, c.language_requirement";

const UPSERT_COURSE: &str = r#"
    INSERT INTO class_cupid.courses
    (course_key, course_number, course_title, instructor_name, term_description, department,
     description, class_level_attribute, class_level_attribute_description, course_component,
     subject_description, catalog_school_description, science_and_technology_in_society,
     aesthetics_and_culture, ethics_and_civics, histories_societies_individuals,
     arts_and_humanities, social_sciences, science_engineering_applied, quantitative_reasoning,
     concentration_requirement, language_requirement)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
            $19, $20, $21, $22)
    ON CONFLICT (course_key, term_description) DO UPDATE
    SET course_number = EXCLUDED.course_number,
        course_title = EXCLUDED.course_title,
        instructor_name = EXCLUDED.instructor_name,
        department = EXCLUDED.department,
        description = EXCLUDED.description,
        class_level_attribute = EXCLUDED.class_level_attribute,
        class_level_attribute_description = EXCLUDED.class_level_attribute_description,
        course_component = EXCLUDED.course_component,
        subject_description = EXCLUDED.subject_description,
        catalog_school_description = EXCLUDED.catalog_school_description,
        science_and_technology_in_society = EXCLUDED.science_and_technology_in_society,
        aesthetics_and_culture = EXCLUDED.aesthetics_and_culture,
        ethics_and_civics = EXCLUDED.ethics_and_civics,
        histories_societies_individuals = EXCLUDED.histories_societies_individuals,
        arts_and_humanities = EXCLUDED.arts_and_humanities,
        social_sciences = EXCLUDED.social_sciences,
        science_engineering_applied = EXCLUDED.science_engineering_applied,
        quantitative_reasoning = EXCLUDED.quantitative_reasoning,
        concentration_requirement = EXCLUDED.concentration_requirement,
        language_requirement = EXCLUDED.language_requirement
    RETURNING (xmax = 0) AS inserted
"#;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn course_from_row(row: &PgRow) -> CourseRecord {
    CourseRecord {
        id: row.get("id"),
        course_number: row.get("course_number"),
        title: row.get("course_title"),
        department: row.get("department"),
        term: row.get("term_description"),
        instructor_name: row.get("instructor_name"),
        description: row.get("description"),
        catalog_school_description: row.get("catalog_school_description"),
        course_component: row.get("course_component"),
        subject_description: row.get("subject_description"),
        class_level_attribute: row.get("class_level_attribute"),
        class_level_attribute_description: row.get("class_level_attribute_description"),
        flags: RequirementFlags {
            science_and_technology_in_society: row.get("science_and_technology_in_society"),
            aesthetics_and_culture: row.get("aesthetics_and_culture"),
            ethics_and_civics: row.get("ethics_and_civics"),
            histories_societies_individuals: row.get("histories_societies_individuals"),
            arts_and_humanities: row.get("arts_and_humanities"),
            social_sciences: row.get("social_sciences"),
            science_engineering_applied: row.get("science_engineering_applied"),
            quantitative_reasoning: row.get("quantitative_reasoning"),
            concentration_requirement: row.get("concentration_requirement"),
            language_requirement: row.get("language_requirement"),
        },
    }
}

/// Inserts or refreshes a course; returns true when the row is new.
async fn upsert_course(
    pool: &PgPool,
    course_key: &str,
    course: &CourseRecord,
) -> anyhow::Result<bool> {
    let flags = &course.flags;
    let row = sqlx::query(UPSERT_COURSE)
        .bind(course_key)
        .bind(&course.course_number)
        .bind(&course.title)
        .bind(&course.instructor_name)
        .bind(&course.term)
        .bind(&course.department)
        .bind(&course.description)
        .bind(&course.class_level_attribute)
        .bind(&course.class_level_attribute_description)
        .bind(&course.course_component)
        .bind(&course.subject_description)
        .bind(&course.catalog_school_description)
        .bind(flags.science_and_technology_in_society)
        .bind(flags.aesthetics_and_culture)
        .bind(flags.ethics_and_civics)
        .bind(flags.histories_societies_individuals)
        .bind(flags.arts_and_humanities)
        .bind(flags.social_sciences)
        .bind(flags.science_engineering_applied)
        .bind(flags.quantitative_reasoning)
        .bind(flags.concentration_requirement)
        .bind(flags.language_requirement)
        .fetch_one(pool)
        .await?;

    Ok(row.get("inserted"))
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let courses = vec![
        ("100001", "COMPSCI 50", "Introduction to Computer Science", "Computer Science"),
        ("100002", "COMPSCI 124", "Data Structures and Algorithms", "Computer Science"),
        ("100003", "COMPSCI 2420", "Computing at Scale", "Computer Science"),
        ("100004", "FRENCH 1", "Beginning French I", "Romance Languages and Literatures"),
        ("100005", "FRENCH 10", "Intermediate French", "Romance Languages and Literatures"),
        ("100006", "HIST 97", "Sophomore Tutorial in History", "History"),
        ("100007", "FYSEMR 23M", "Reading the City", "Freshman Seminars"),
        ("100008", "GENED 1145", "Art and Power", "General Education"),
    ];

    for (key, number, title, department) in courses {
        let tutorial = title.contains("Tutorial");
        let language = number.starts_with("FRENCH");
        let course = CourseRecord {
            course_number: number.to_string(),
            title: title.to_string(),
            department: department.to_string(),
            term: "2025 Fall".to_string(),
            catalog_school_description: Some("Faculty of Arts & Sciences".to_string()),
            course_component: tutorial.then(|| "Tutorial".to_string()),
            flags: RequirementFlags {
                language_requirement: language,
                ..RequirementFlags::default()
            },
            ..CourseRecord::default()
        };
        upsert_course(pool, key, &course).await?;
    }

    let user_id = upsert_user(pool, "demo.freshman").await?;
    let profile = UserProfile {
        affiliation: Some(Affiliation::College),
        year: Some(Year::Freshman),
        terms: vec!["2025 Fall".to_string()],
        concentrations: vec!["Computer Science".to_string()],
        requirements: vec!["Language Requirement".to_string()],
        schools: Vec::new(),
    };
    save_profile(pool, user_id, &profile).await?;

    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ImportSummary {
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
}

pub async fn import_courses(
    pool: &PgPool,
    json_path: &std::path::Path,
) -> anyhow::Result<ImportSummary> {
    #[derive(Deserialize)]
    struct Instructor {
        #[serde(rename = "instructorName")]
        name: Option<String>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct CatalogEntry {
        #[serde(rename = "courseID")]
        course_id: Option<Value>,
        course_number: Option<String>,
        course_title: Option<String>,
        #[serde(default)]
        published_instructors: Vec<Instructor>,
        term_description: Option<String>,
        catalog_subject_description: Option<String>,
        course_description: Option<String>,
        class_level_attribute: Option<String>,
        class_level_attribute_description: Option<String>,
        course_component: Option<String>,
        subject_description: Option<String>,
        catalog_school_description: Option<String>,
        divisional_distribution: Option<Value>,
        quantitative_reasoning: Option<Value>,
    }

    #[derive(Deserialize)]
    struct CatalogExport {
        #[serde(default)]
        courses: Vec<CatalogEntry>,
    }

    let raw = std::fs::read_to_string(json_path)
        .with_context(|| format!("failed to read {}", json_path.display()))?;
    let export: CatalogExport = serde_json::from_str(&raw).context("malformed course export")?;
    info!(entries = export.courses.len(), "loaded course export");

    let mut summary = ImportSummary::default();

    for entry in export.courses {
        let course_key = match entry.course_id {
            Some(Value::String(key)) if !key.is_empty() => key,
            Some(Value::Number(key)) => key.to_string(),
            _ => {
                summary.skipped += 1;
                continue;
            }
        };

        let instructors: Vec<String> = entry
            .published_instructors
            .into_iter()
            .filter_map(|instructor| instructor.name)
            .collect();
        let divisional = match entry.divisional_distribution {
            Some(Value::String(text)) => text,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let course = CourseRecord {
            course_number: entry.course_number.unwrap_or_default(),
            title: entry.course_title.unwrap_or_default(),
            department: entry.catalog_subject_description.unwrap_or_default(),
            term: entry.term_description.unwrap_or_default(),
            instructor_name: (!instructors.is_empty()).then(|| instructors.join(", ")),
            description: entry.course_description,
            catalog_school_description: entry.catalog_school_description,
            course_component: entry.course_component,
            subject_description: entry.subject_description,
            class_level_attribute: entry.class_level_attribute,
            class_level_attribute_description: entry.class_level_attribute_description,
            flags: RequirementFlags {
                arts_and_humanities: divisional.contains("Arts and Humanities"),
                social_sciences: divisional.contains("Social Sciences"),
                science_engineering_applied: divisional.contains("Science")
                    && divisional.contains("Engineering"),
                quantitative_reasoning: entry
                    .quantitative_reasoning
                    .as_ref()
                    .map(is_truthy)
                    .unwrap_or(false),
                ..RequirementFlags::default()
            },
            ..CourseRecord::default()
        };

        if upsert_course(pool, &course_key, &course).await? {
            summary.imported += 1;
        } else {
            summary.updated += 1;
        }
    }

    Ok(summary)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

pub async fn upsert_user(pool: &PgPool, username: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO class_cupid.users (id, username)
        VALUES ($1, $2)
        ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

pub async fn find_user(pool: &PgPool, username: &str) -> anyhow::Result<Uuid> {
    let row = sqlx::query("SELECT id FROM class_cupid.users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(row.get("id")),
        None => bail!("no user named {username}; set a profile first"),
    }
}

pub async fn save_profile(
    pool: &PgPool,
    user_id: Uuid,
    profile: &UserProfile,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE class_cupid.users
        SET affiliation = $2, year = $3, terms = $4, concentrations = $5,
            requirements = $6, schools = $7
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(profile.affiliation.map(|a| a.as_str()))
    .bind(profile.year.map(|y| y.as_str()))
    .bind(&profile.terms)
    .bind(&profile.concentrations)
    .bind(&profile.requirements)
    .bind(&profile.schools)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fetch_profile(pool: &PgPool, user_id: Uuid) -> anyhow::Result<UserProfile> {
    let row = sqlx::query(
        "SELECT affiliation, year, terms, concentrations, requirements, schools \
         FROM class_cupid.users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let affiliation: Option<String> = row.get("affiliation");
    let year: Option<String> = row.get("year");

    Ok(UserProfile {
        affiliation: affiliation.as_deref().and_then(Affiliation::parse),
        year: year.as_deref().and_then(Year::parse),
        terms: row.get("terms"),
        concentrations: row.get("concentrations"),
        requirements: row.get("requirements"),
        schools: row.get("schools"),
    })
}

pub async fn fetch_candidate_courses(
    pool: &PgPool,
    terms: &[String],
    exclude_ids: &HashSet<CourseId>,
) -> anyhow::Result<Vec<CourseRecord>> {
    let excluded: Vec<CourseId> = exclude_ids.iter().copied().collect();
    let query = format!(
        "SELECT {COURSE_COLUMNS} FROM class_cupid.courses c \
         WHERE c.term_description = ANY($1) AND NOT (c.id = ANY($2)) \
         ORDER BY c.id LIMIT $3"
    );

    let rows = sqlx::query(&query)
        .bind(terms)
        .bind(&excluded)
        .bind(MAX_CANDIDATES)
        .fetch_all(pool)
        .await?;

    if rows.len() as i64 >= MAX_CANDIDATES {
        warn!(
            limit = MAX_CANDIDATES,
            "candidate limit reached; consider narrowing the profile"
        );
    }

    Ok(rows.iter().map(course_from_row).collect())
}

pub async fn fetch_course(
    pool: &PgPool,
    course_id: CourseId,
) -> anyhow::Result<Option<CourseRecord>> {
    let query = format!("SELECT {COURSE_COLUMNS} FROM class_cupid.courses c WHERE c.id = $1");
    let row = sqlx::query(&query)
        .bind(course_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(course_from_row))
}

pub async fn fetch_seen_course_ids(
    pool: &PgPool,
    user_id: Uuid,
) -> anyhow::Result<HashSet<CourseId>> {
    let rows = sqlx::query("SELECT course_id FROM class_cupid.preferences WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(|row| row.get("course_id")).collect())
}

pub async fn record_preference(
    pool: &PgPool,
    user_id: Uuid,
    course_id: CourseId,
    status: PreferenceStatus,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO class_cupid.preferences (user_id, course_id, status)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, course_id) DO UPDATE
        SET status = EXCLUDED.status, recorded_at = clock_timestamp()
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Deletes the user's most recent swipe and returns it.
pub async fn undo_last_preference(
    pool: &PgPool,
    user_id: Uuid,
) -> anyhow::Result<Option<Preference>> {
    let row = sqlx::query(
        r#"
        DELETE FROM class_cupid.preferences
        WHERE (user_id, course_id) = (
            SELECT user_id, course_id FROM class_cupid.preferences
            WHERE user_id = $1
            ORDER BY recorded_at DESC
            LIMIT 1
        )
        RETURNING course_id, status, recorded_at
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let status: String = row.get("status");

    Ok(Some(Preference {
        course_id: row.get("course_id"),
        status: PreferenceStatus::parse(&status).context("unexpected preference status")?,
        recorded_at: row.get("recorded_at"),
    }))
}

/// Changes a saved course to `status`, or removes it when `status` is `None`.
/// Returns false when the user has no preference for the course.
pub async fn update_saved_preference(
    pool: &PgPool,
    user_id: Uuid,
    course_id: CourseId,
    status: Option<PreferenceStatus>,
) -> anyhow::Result<bool> {
    let result = match status {
        Some(status) => {
            sqlx::query(
                "UPDATE class_cupid.preferences SET status = $3 \
                 WHERE user_id = $1 AND course_id = $2",
            )
            .bind(user_id)
            .bind(course_id)
            .bind(status.as_str())
            .execute(pool)
            .await?
        }
        None => {
            sqlx::query(
                "DELETE FROM class_cupid.preferences WHERE user_id = $1 AND course_id = $2",
            )
            .bind(user_id)
            .bind(course_id)
            .execute(pool)
            .await?
        }
    };

    Ok(result.rows_affected() > 0)
}

/// Hearted and starred courses, limited to `terms` when any are given.
pub async fn fetch_saved_preferences(
    pool: &PgPool,
    user_id: Uuid,
    terms: &[String],
) -> anyhow::Result<Vec<SavedCourse>> {
    let mut query = format!(
        "SELECT {COURSE_COLUMNS}, p.status FROM class_cupid.preferences p \
         JOIN class_cupid.courses c ON c.id = p.course_id \
         WHERE p.user_id = $1 AND p.status IN ('heart', 'star')"
    );
    if !terms.is_empty() {
        query.push_str(" AND c.term_description = ANY($2)");
    }
    query.push_str(" ORDER BY p.recorded_at");

    let mut rows = sqlx::query(&query).bind(user_id);
    if !terms.is_empty() {
        rows = rows.bind(terms);
    }

    let records = rows.fetch_all(pool).await?;
    let mut saved = Vec::with_capacity(records.len());

    for row in records {
        let status: String = row.get("status");
        match PreferenceStatus::parse(&status) {
            Some(status) if status.is_saved() => saved.push(SavedCourse {
                course: course_from_row(&row),
                status,
            }),
            _ => warn!(status = %status, "skipping preference that is not saved"),
        }
    }

    Ok(saved)
}

/// Judgments in the order they were made.
pub async fn fetch_judgments(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Judgment>> {
    let rows = sqlx::query(
        "SELECT winner_course_id, loser_course_id FROM class_cupid.judgments \
         WHERE user_id = $1 ORDER BY recorded_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| Judgment::new(row.get("winner_course_id"), row.get("loser_course_id")))
        .collect())
}

/// Records "winner beats loser"; returns false when the judgment already exists.
pub async fn record_judgment(
    pool: &PgPool,
    user_id: Uuid,
    winner: CourseId,
    loser: CourseId,
) -> anyhow::Result<bool> {
    if winner == loser {
        bail!("courses must be different");
    }

    let winner_course = fetch_course(pool, winner)
        .await?
        .with_context(|| format!("no course with id {winner}"))?;
    let loser_course = fetch_course(pool, loser)
        .await?
        .with_context(|| format!("no course with id {loser}"))?;
    if winner_course.term != loser_course.term {
        bail!("You can only compare courses from the same semester.");
    }

    let result = sqlx::query(
        r#"
        INSERT INTO class_cupid.judgments (id, user_id, winner_course_id, loser_course_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, winner_course_id, loser_course_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(winner)
    .bind(loser)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn undo_last_judgment(
    pool: &PgPool,
    user_id: Uuid,
) -> anyhow::Result<Option<Judgment>> {
    let row = sqlx::query(
        r#"
        DELETE FROM class_cupid.judgments
        WHERE id = (
            SELECT id FROM class_cupid.judgments
            WHERE user_id = $1
            ORDER BY recorded_at DESC
            LIMIT 1
        )
        RETURNING winner_course_id, loser_course_id
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Judgment::new(row.get("winner_course_id"), row.get("loser_course_id"))))
}

/// Clears every swipe and judgment for the user.
pub async fn reset_all(pool: &PgPool, user_id: Uuid) -> anyhow::Result<(u64, u64)> {
    let mut tx = pool.begin().await?;

    let preferences = sqlx::query("DELETE FROM class_cupid.preferences WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let judgments = sqlx::query("DELETE FROM class_cupid.judgments WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok((preferences, judgments))
}
