use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

mod classify;
mod db;
mod eligibility;
mod error;
mod gened;
mod matches;
mod models;
mod ranker;
mod recommend;
mod report;
mod selector;

use models::{Affiliation, CourseId, PreferenceStatus, Requirement, School, UserProfile, Year};

#[derive(Parser)]
#[command(name = "class-cupid")]
#[command(about = "Swipe through courses and rank the ones you keep", long_about = None)]
struct Cli {
    /// Directory holding the per-term Gen-Ed JSON files
    #[arg(long, global = true, env = "CLASS_CUPID_GENED_DIR", default_value = "data")]
    gened_dir: PathBuf,
    /// Seed for reproducible recommendations and comparison pairs
    #[arg(long, global = true, env = "CLASS_CUPID_SEED")]
    seed: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SavedAction {
    Heart,
    Star,
    Remove,
}

impl SavedAction {
    fn status(self) -> Option<PreferenceStatus> {
        match self {
            SavedAction::Heart => Some(PreferenceStatus::Heart),
            SavedAction::Star => Some(PreferenceStatus::Star),
            SavedAction::Remove => None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a small demo catalog and profile
    Seed,
    /// Import courses from a catalog JSON export
    ImportCourses {
        #[arg(long)]
        json: PathBuf,
    },
    /// Create a user or replace their profile
    Profile {
        #[arg(long)]
        user: String,
        #[arg(long, value_enum)]
        affiliation: Affiliation,
        #[arg(long, value_enum)]
        year: Option<Year>,
        /// Term such as "2025 Fall"; repeatable
        #[arg(long = "term")]
        terms: Vec<String>,
        #[arg(long = "concentration")]
        concentrations: Vec<String>,
        #[arg(long = "requirement")]
        requirements: Vec<String>,
        #[arg(long = "school")]
        schools: Vec<String>,
    },
    /// Show the next recommended course
    Next {
        #[arg(long)]
        user: String,
    },
    /// Record a heart, star, or discard for a course
    Swipe {
        #[arg(long)]
        user: String,
        #[arg(long)]
        course_id: CourseId,
        #[arg(long, value_enum)]
        action: PreferenceStatus,
    },
    /// Take back the most recent swipe
    UndoSwipe {
        #[arg(long)]
        user: String,
    },
    /// List saved courses per term and suggest the next comparison
    Matches {
        #[arg(long)]
        user: String,
    },
    /// Record that one saved course beats another
    Compare {
        #[arg(long)]
        user: String,
        #[arg(long)]
        winner: CourseId,
        #[arg(long)]
        loser: CourseId,
    },
    /// Take back the most recent comparison
    UndoCompare {
        #[arg(long)]
        user: String,
    },
    /// Re-mark or remove a saved course
    UpdatePreference {
        #[arg(long)]
        user: String,
        #[arg(long)]
        course_id: CourseId,
        #[arg(long, value_enum)]
        action: SavedAction,
    },
    /// Clear every swipe and comparison for a user
    Reset {
        #[arg(long)]
        user: String,
    },
    /// Generate a markdown report of saved course rankings
    Report {
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export saved course rankings as CSV
    Export {
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "rankings.csv")]
        csv: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportCourses { json } => {
            let summary = db::import_courses(&pool, &json).await?;
            println!(
                "Imported {} new and {} updated courses from {} ({} skipped).",
                summary.imported,
                summary.updated,
                json.display(),
                summary.skipped
            );
        }
        Commands::Profile {
            user,
            affiliation,
            year,
            terms,
            concentrations,
            requirements,
            schools,
        } => {
            for label in &requirements {
                if Requirement::from_label(label).is_none() {
                    warn!(requirement = %label, "unrecognised requirement will be ignored");
                }
            }
            for label in &schools {
                if School::from_label(label).is_none() {
                    warn!(school = %label, "unrecognised school will match nothing");
                }
            }

            let profile = UserProfile {
                affiliation: Some(affiliation),
                year,
                terms,
                concentrations,
                requirements,
                schools,
            };
            let user_id = db::upsert_user(&pool, &user).await?;
            db::save_profile(&pool, user_id, &profile).await?;
            info!(%user_id, "profile saved");
            println!("Profile saved for {user}.");
        }
        Commands::Next { user } => {
            let user_id = db::find_user(&pool, &user).await?;
            let profile = db::fetch_profile(&pool, user_id).await?;
            if let Err(error::Error::InvalidProfile(message)) =
                recommend::validate_profile(&profile)
            {
                println!("{message}");
                return Ok(());
            }

            let gened = gened::GenEdIndex::load(&cli.gened_dir, &profile.terms);
            let seen = db::fetch_seen_course_ids(&pool, user_id).await?;
            let candidates = db::fetch_candidate_courses(&pool, &profile.terms, &seen).await?;
            let next =
                recommend::get_next_course(&profile, &candidates, &seen, &gened, &mut rng)?;

            match next {
                Some(course) => {
                    println!("{} [{}]: {}", course.course_number, course.id, course.title);
                    println!(
                        "  {} | {} | {}",
                        course.term,
                        course.department,
                        classify::classify(&course.course_number).as_str()
                    );
                    if let Some(instructor) = &course.instructor_name {
                        println!("  Taught by {instructor}");
                    }
                    if let Some(description) = &course.description {
                        println!("  {description}");
                    }
                }
                None => {
                    let saved = db::fetch_saved_preferences(&pool, user_id, &profile.terms).await?;
                    if saved.is_empty() {
                        println!("No more courses match your current preferences!");
                    } else {
                        println!("No more relevant courses!");
                    }
                }
            }
        }
        Commands::Swipe {
            user,
            course_id,
            action,
        } => {
            let user_id = db::find_user(&pool, &user).await?;
            let course = db::fetch_course(&pool, course_id)
                .await?
                .with_context(|| format!("no course with id {course_id}"))?;
            db::record_preference(&pool, user_id, course_id, action).await?;
            println!("Marked {} as {}.", course.course_number, action.as_str());
        }
        Commands::UndoSwipe { user } => {
            let user_id = db::find_user(&pool, &user).await?;
            match db::undo_last_preference(&pool, user_id).await? {
                Some(preference) => println!(
                    "Undid {} on course {} (recorded {}).",
                    preference.status.as_str(),
                    preference.course_id,
                    preference.recorded_at.format("%Y-%m-%d %H:%M:%S")
                ),
                None => println!("Nothing to undo."),
            }
        }
        Commands::Matches { user } => {
            let user_id = db::find_user(&pool, &user).await?;
            let profile = db::fetch_profile(&pool, user_id).await?;
            let saved = db::fetch_saved_preferences(&pool, user_id, &profile.terms).await?;
            let judgments = db::fetch_judgments(&pool, user_id).await?;
            let boards = matches::build_boards(&saved, &judgments);

            if boards.is_empty() {
                println!("No saved courses yet.");
                return Ok(());
            }

            for board in &boards {
                if board.ranked {
                    println!("{} (ranked from {} comparisons)", board.term, board.judgment_count);
                } else {
                    println!(
                        "{} ({} of {} comparisons)",
                        board.term, board.judgment_count, board.required_judgments
                    );
                }
                for entry in &board.entries {
                    let course = &entry.saved.course;
                    let label = entry
                        .position
                        .map(|position| format!("{position}."))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  {label} {} [{}] {} ({})",
                        course.course_number,
                        course.id,
                        course.title,
                        entry.saved.status.as_str()
                    );
                }
            }

            let courses: Vec<_> = saved.into_iter().map(|entry| entry.course).collect();
            match recommend::get_comparison_pair(&courses, &judgments, &mut rng) {
                Some(pair) => println!(
                    "Next comparison in {}: {} [{}] vs {} [{}]",
                    pair.term,
                    pair.first.course_number,
                    pair.first.id,
                    pair.second.course_number,
                    pair.second.id
                ),
                None => println!("Save at least two courses in one term to compare them."),
            }
        }
        Commands::Compare {
            user,
            winner,
            loser,
        } => {
            let user_id = db::find_user(&pool, &user).await?;
            if !db::record_judgment(&pool, user_id, winner, loser).await? {
                println!("That comparison was already recorded.");
            }

            let winner_course = db::fetch_course(&pool, winner)
                .await?
                .with_context(|| format!("no course with id {winner}"))?;
            let term = matches::term_label(&winner_course).to_string();
            let saved = db::fetch_saved_preferences(&pool, user_id, &[]).await?;
            let courses: Vec<_> = saved
                .into_iter()
                .map(|entry| entry.course)
                .filter(|course| matches::term_label(course) == term)
                .collect();
            let course_refs: Vec<_> = courses.iter().collect();
            let judgments = db::fetch_judgments(&pool, user_id).await?;
            let scoped = matches::judgments_by_term(&course_refs, &judgments)
                .remove(&term)
                .unwrap_or_default();

            let ranking = recommend::get_ranking(&courses, &scoped);
            let mut ordered: Vec<_> = courses
                .iter()
                .filter_map(|course| ranking.get(&course.id).map(|rank| (*rank, course)))
                .collect();
            ordered.sort_by_key(|(rank, _)| *rank);

            println!("Current ranking for {term}:");
            for (rank, course) in ordered {
                println!("  {}. {} {}", rank + 1, course.course_number, course.title);
            }
        }
        Commands::UndoCompare { user } => {
            let user_id = db::find_user(&pool, &user).await?;
            match db::undo_last_judgment(&pool, user_id).await? {
                Some(judgment) => println!(
                    "Undid comparison: course {} over course {}.",
                    judgment.winner, judgment.loser
                ),
                None => println!("Nothing to undo."),
            }
        }
        Commands::UpdatePreference {
            user,
            course_id,
            action,
        } => {
            let user_id = db::find_user(&pool, &user).await?;
            if db::update_saved_preference(&pool, user_id, course_id, action.status()).await? {
                println!("Updated course {course_id}.");
            } else {
                println!("Course {course_id} is not on your list.");
            }
        }
        Commands::Reset { user } => {
            let user_id = db::find_user(&pool, &user).await?;
            let (preferences, judgments) = db::reset_all(&pool, user_id).await?;
            println!("Cleared {preferences} swipes and {judgments} comparisons.");
        }
        Commands::Report { user, out } => {
            let user_id = db::find_user(&pool, &user).await?;
            let profile = db::fetch_profile(&pool, user_id).await?;
            let saved = db::fetch_saved_preferences(&pool, user_id, &profile.terms).await?;
            let judgments = db::fetch_judgments(&pool, user_id).await?;
            let boards = matches::build_boards(&saved, &judgments);

            let courses: Vec<_> = saved.into_iter().map(|entry| entry.course).collect();
            let pair = recommend::get_comparison_pair(&courses, &judgments, &mut rng);
            let today = chrono::Utc::now().date_naive();
            let report = report::build_report(&user, today, &boards, pair.as_ref());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { user, csv } => {
            let user_id = db::find_user(&pool, &user).await?;
            let profile = db::fetch_profile(&pool, user_id).await?;
            let saved = db::fetch_saved_preferences(&pool, user_id, &profile.terms).await?;
            let judgments = db::fetch_judgments(&pool, user_id).await?;
            let boards = matches::build_boards(&saved, &judgments);

            let file = std::fs::File::create(&csv)
                .with_context(|| format!("failed to create {}", csv.display()))?;
            let rows = report::write_csv(file, &boards)?;
            println!("Exported {rows} saved courses to {}.", csv.display());
        }
    }

    Ok(())
}
