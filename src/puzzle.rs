//! Puzzle compiler: turns a raw puzzle record into a compiled [`Csp`].
//!
//! Parsing never fails on puzzle content: unrecognized clue sentences become
//! non-binding constraints, unlabeled description lines are skipped, and a
//! missing Name category is inferred from the clues.

use std::collections::HashMap;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clues::{compile_clue, ClueContext};
use crate::error::Result;
use crate::lexicon::{self, CategoryNamer, ValueIndex, STOP_CAPS};
use crate::model::{house_var, Constraint, Csp, Variable};

/// A caller-supplied grid template: a `House`-first header and one row per
/// house. Only the header and row count are consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridTemplate {
    #[serde(default)]
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
}

/// A normalized puzzle record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PuzzleRecord {
    #[serde(default)]
    pub id: Option<String>,
    /// `"H*W"`; only the house count before the `*` is consumed.
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub puzzle: String,
    /// Grid template consumed only by the grid emitter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<GridTemplate>,
}

impl PuzzleRecord {
    pub fn id_or_unknown(&self) -> &str {
        self.id.as_deref().unwrap_or("unknown")
    }
}

/// Number of houses: the numeric prefix of `size`, else a count stated in the
/// puzzle text, else 5.
pub fn num_houses(record: &PuzzleRecord) -> usize {
    static NUMBERED: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)numbered\s+1\s+to\s+(\d+)").expect("numbered regex")
    });
    static THERE_ARE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)There are\s+(\d+)\s+houses").expect("there-are regex")
    });

    let from_size = record
        .size
        .as_deref()
        .and_then(|size| size.split('*').next())
        .and_then(|prefix| prefix.trim().parse::<usize>().ok())
        .filter(|&n| n > 0);
    if let Some(n) = from_size {
        return n;
    }

    NUMBERED
        .captures(&record.puzzle)
        .or_else(|| THERE_ARE.captures(&record.puzzle))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(5)
}

/// Splits the puzzle body into the attribute description and the clues block.
fn split_description_and_clues(puzzle_text: &str) -> (&str, &str) {
    for marker in ["## Clues:", "\nClues:", "Clues:"] {
        if let Some(at) = puzzle_text.find(marker) {
            return (&puzzle_text[..at], &puzzle_text[at + marker.len()..]);
        }
    }
    (puzzle_text, "")
}

/// Splits a value list on commas and the alternative separators, stripping
/// backticks, articles-free punctuation, and duplicates.
fn parse_values(values_text: &str) -> Vec<String> {
    static AND_SEP: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").expect("and-separator regex"));

    let mut text = values_text
        .trim()
        .replace(['•', ';', '|'], ",")
        .replace('`', "");
    text = AND_SEP.replace_all(&text, ", ").into_owned();
    let text = text.trim().trim_end_matches('.');

    let mut seen = HashMap::new();
    let mut values = Vec::new();
    for part in text.split(',') {
        let value = lexicon::strip_punct(part);
        if value.is_empty() {
            continue;
        }
        if seen.insert(value.to_string(), ()).is_none() {
            values.push(value.to_string());
        }
    }
    values
}

/// Extracts labeled categories from the description block. Lines without a
/// recognizable `label: values` shape are skipped.
fn extract_categories(description: &str) -> IndexMap<String, Vec<String>> {
    static LABELED: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\s*([^:–—-]+)\s*[:–—-]\s*(.+)$").expect("label regex"));

    let mut categories = IndexMap::new();
    let mut namer = CategoryNamer::new();

    for raw_line in description.lines() {
        let mut line = raw_line.trim();
        if line.is_empty() || line.to_lowercase().starts_with("clues:") {
            continue;
        }
        line = line.strip_prefix('-').map(str::trim).unwrap_or(line);

        let Some(caps) = LABELED.captures(line) else {
            continue;
        };
        let key = namer.canonicalize(&caps[1]);
        let values = parse_values(&caps[2]);
        if !values.is_empty() {
            categories.insert(key, values);
        }
    }

    categories
}

/// Infers person names from the clues block when no Name category was
/// declared: capitalized tokens outside the stop-word and number-word sets
/// that are not already declared attribute values, ranked by frequency with
/// a bonus for name-slot positions, padded with `Person_i` when short.
fn infer_names_from_clues(clues: &str, num_houses: usize, declared: &ValueIndex) -> Vec<String> {
    static NUMBERING: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\s*\d+\.\s*").expect("numbering regex"));
    static CAPITALIZED: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("capitalized-token regex"));
    static SLOTS: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\b([A-Z][a-z]+)\s+(?:lives|does\s+not|owns|has|keeps)\b")
            .expect("name-slot regex")
    });

    let text = clues
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            (!line.is_empty()).then(|| NUMBERING.replace(line, "").into_owned())
        })
        .collect::<Vec<_>>()
        .join("\n");

    let is_candidate = |token: &str| {
        !STOP_CAPS.contains(&token)
            && lexicon::number_word(&lexicon::norm(token)).is_none()
            && declared.lookup(token).is_none()
    };

    let mut freq: HashMap<String, i64> = HashMap::new();
    for token in CAPITALIZED.find_iter(&text) {
        if is_candidate(token.as_str()) {
            *freq.entry(token.as_str().to_string()).or_insert(0) += 1;
        }
    }
    for caps in SLOTS.captures_iter(&text) {
        let token = &caps[1];
        if is_candidate(token) {
            *freq.entry(token.to_string()).or_insert(0) += 3;
        }
    }

    let mut ranked: Vec<(String, i64)> = freq.into_iter().collect();
    ranked.sort_by(|(name_a, count_a), (name_b, count_b)| {
        count_b.cmp(count_a).then_with(|| name_a.cmp(name_b))
    });

    let mut names: Vec<String> = ranked
        .into_iter()
        .take(num_houses)
        .map(|(name, _)| name)
        .collect();
    for i in names.len() + 1..=num_houses {
        names.push(format!("Person_{i}"));
    }
    names
}

/// Extracts clue sentences: numbered lines if any, otherwise every non-blank
/// line of the clues block.
fn extract_clues(clues: &str) -> Vec<String> {
    static NUMBERED_CLUE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\.\s+(.*)$").expect("numbered-clue regex"));

    let numbered: Vec<String> = NUMBERED_CLUE
        .captures_iter(clues)
        .map(|caps| caps[1].to_string())
        .collect();
    if !numbered.is_empty() {
        return numbered;
    }
    clues
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Compiles a puzzle record into a CSP: variables `House_<i>_<Category>`
/// with shared per-category domains, one AllDiff per category, and one or
/// more compiled constraints per clue sentence.
pub fn parse_puzzle(record: &PuzzleRecord) -> Result<Csp> {
    let houses = num_houses(record);
    let (description, clues_block) = split_description_and_clues(&record.puzzle);

    let mut categories = extract_categories(description);
    if !categories.contains_key("Name") {
        let declared = ValueIndex::build(&categories);
        let names = infer_names_from_clues(clues_block, houses, &declared);
        categories.insert("Name".to_string(), names);
    }

    let mut variables = Vec::with_capacity(houses * categories.len());
    for i in 1..=houses {
        for (category, values) in &categories {
            variables.push(Variable::new(
                house_var(i, category),
                values.iter().cloned(),
            ));
        }
    }

    let mut constraints = Vec::new();
    for category in categories.keys() {
        let scope = (1..=houses).map(|i| house_var(i, category)).collect();
        constraints.push(Constraint::all_diff(scope));
    }

    let values = ValueIndex::build(&categories);
    for collision in values.collisions() {
        debug!(
            value = %collision.value,
            kept = %collision.kept_category,
            ignored = %collision.ignored_category,
            "value declared by two categories; first declaration wins"
        );
    }

    let ctx = ClueContext {
        categories: &categories,
        values: &values,
        num_houses: houses,
    };
    for clue in extract_clues(clues_block) {
        constraints.extend(compile_clue(&clue, &ctx));
    }

    Csp::new(variables, constraints)
}
