//! Gen-Ed category to catalog-code index.
//!
//! Each term ships its own Gen-Ed listing (`<YEAR>_<SEASON>_Geneds.json`). The
//! files are hand-maintained and may carry `/* ... */` comments and a
//! placeholder `"categories"` block, both of which are stripped before parsing.
//! A file that cannot be read or parsed contributes no codes; callers then fall
//! back to the course's boolean requirement flags.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct GenEdEntry {
    #[serde(rename = "genEdCode", default)]
    pub code: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenEdDocument {
    #[serde(default)]
    courses: Vec<GenEdEntry>,
}

static RE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("comment regex"));
static RE_CATEGORIES_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#",\s*"categories"\s*:\s*\{[^}]*\}"#).expect("categories block regex")
});

pub fn clean_document(raw: &str) -> String {
    let without_comments = RE_COMMENT.replace_all(raw, "");
    RE_CATEGORIES_BLOCK
        .replace_all(&without_comments, "")
        .into_owned()
}

pub fn parse_document(raw: &str) -> Result<Vec<GenEdEntry>> {
    let cleaned = clean_document(raw);
    let document: GenEdDocument = serde_json::from_str(&cleaned)?;
    Ok(document.courses)
}

/// "2025 Fall" -> "2025_Fall_Geneds.json".
pub fn source_file_name(term: &str) -> Option<String> {
    let mut parts = term.split_whitespace();
    let year = parts.next()?;
    let season = parts.next()?;
    if parts.next().is_some() || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{year}_{season}_Geneds.json"))
}

#[derive(Debug, Clone, Default)]
pub struct GenEdIndex {
    by_term: HashMap<String, Vec<GenEdEntry>>,
}

impl GenEdIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_term(&mut self, term: impl Into<String>, entries: Vec<GenEdEntry>) {
        self.by_term.insert(term.into(), entries);
    }

    /// Loads the listings for `terms` from `dir`, skipping any that are missing or malformed.
    pub fn load(dir: &Path, terms: &[String]) -> Self {
        let mut index = Self::new();

        for term in terms {
            if index.by_term.contains_key(term) {
                continue;
            }
            match load_term(dir, term) {
                Ok(Some(entries)) => {
                    debug!(term = %term, entries = entries.len(), "loaded Gen-Ed listing");
                    index.insert_term(term.clone(), entries);
                }
                Ok(None) => debug!(term = %term, "no Gen-Ed listing for term"),
                Err(err) => warn!(term = %term, error = %err, "ignoring Gen-Ed listing"),
            }
        }

        index
    }

    /// Catalog numbers tagged with `category` across the given terms.
    pub fn codes_for(&self, category: &str, terms: &[String]) -> HashSet<String> {
        terms
            .iter()
            .filter_map(|term| self.by_term.get(term))
            .flatten()
            .filter(|entry| !entry.code.is_empty())
            .filter(|entry| entry.categories.iter().any(|c| c == category))
            .map(|entry| entry.code.clone())
            .collect()
    }
}

fn load_term(dir: &Path, term: &str) -> Result<Option<Vec<GenEdEntry>>> {
    let Some(file_name) = source_file_name(term) else {
        return Ok(None);
    };
    let path = dir.join(file_name);
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(&path)?;
    parse_document(&raw).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const LISTING: &str = r#"{
        /* exported from the Gen-Ed office, refreshed each term */
        "courses": [
            { "genEdCode": "GENED 1145", "categories": ["Aesthetics & Culture"] },
            {
                "genEdCode": "GENED 1114",
                "categories": ["Ethics & Civics", "Aesthetics & Culture"]
            },
            { "genEdCode": "", "categories": ["Ethics & Civics"] }
        ],
        "categories": { "Aesthetics & Culture": "PLACEHOLDER" }
    }"#;

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn strips_comments_and_category_block() {
        let cleaned = clean_document(LISTING);
        assert!(!cleaned.contains("/*"));
        assert!(!cleaned.contains("PLACEHOLDER"));
        let entries = parse_document(LISTING).unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn cleanup_handles_successive_documents() {
        let spring = r#"{ /* spring */ "courses": [], "categories": { "Ethics & Civics": "" } }"#;
        assert_eq!(clean_document(spring), r#"{  "courses": [] }"#);
        assert!(!clean_document(LISTING).contains("PLACEHOLDER"));
        assert!(parse_document(spring).unwrap().is_empty());
    }

    #[test]
    fn malformed_listing_is_a_parse_error() {
        let err = parse_document("{ \"courses\": [ ").unwrap_err();
        assert!(matches!(err, Error::GenEdParse(_)));
    }

    #[test]
    fn resolves_codes_per_category_and_term() {
        let mut index = GenEdIndex::new();
        index.insert_term("2025 Fall", parse_document(LISTING).unwrap());
        index.insert_term(
            "2026 Spring",
            vec![GenEdEntry {
                code: "GENED 1200".to_string(),
                categories: vec!["Ethics & Civics".to_string()],
            }],
        );

        let fall = index.codes_for("Ethics & Civics", &terms(&["2025 Fall"]));
        assert_eq!(fall, HashSet::from(["GENED 1114".to_string()]));

        let both = index.codes_for("Ethics & Civics", &terms(&["2025 Fall", "2026 Spring"]));
        assert_eq!(both.len(), 2);

        assert!(index
            .codes_for("Aesthetics & Culture", &terms(&["2026 Spring"]))
            .is_empty());
    }

    #[test]
    fn maps_terms_to_file_names() {
        assert_eq!(
            source_file_name("2026 Spring").as_deref(),
            Some("2026_Spring_Geneds.json")
        );
        assert_eq!(source_file_name("Fall"), None);
        assert_eq!(source_file_name("Late 2025 Fall"), None);
    }

    #[test]
    fn missing_directory_yields_empty_index() {
        let index = GenEdIndex::load(Path::new("/nonexistent/gened"), &terms(&["2025 Fall"]));
        assert!(index.codes_for("Ethics & Civics", &terms(&["2025 Fall"])).is_empty());
    }
}
