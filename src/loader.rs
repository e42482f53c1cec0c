//! Puzzle ingestion: reads `.json`, `.jsonl`, and `.csv` puzzle files and
//! normalizes heterogeneous records into [`PuzzleRecord`]s.
//!
//! Normalization tolerates the common dataset quirks: puzzle text under
//! alternate keys, sizes encoded in the record id, `.json` files that
//! actually hold line-delimited JSON, and grid templates serialized as JSON
//! strings inside CSV cells.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::puzzle::{GridTemplate, PuzzleRecord};

const TEXT_KEYS: &[&str] = &["puzzle_text", "prompt", "text", "question", "input"];

fn nonempty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// The puzzle body: the `puzzle` key, a known alternate key, or the
/// best-scoring string field in the record.
fn extract_puzzle_text(record: &Map<String, Value>) -> String {
    if let Some(text) = nonempty_str(record.get("puzzle")) {
        return text.to_string();
    }
    for key in TEXT_KEYS {
        if let Some(text) = nonempty_str(record.get(*key)) {
            return text.to_string();
        }
    }

    let mut best = "";
    let mut best_score = 0;
    for value in record.values() {
        let Some(text) = nonempty_str(Some(value)) else {
            continue;
        };
        let mut score = 0;
        if text.contains("## Clues") {
            score += 2;
        }
        if text.contains("There are ") && text.contains(" houses") {
            score += 1;
        }
        if score > best_score {
            best = text;
            best_score = score;
        }
    }
    best.to_string()
}

/// Sizes encoded in dataset ids, e.g. `zebra-4x6-17`.
fn infer_size_from_id(id: Option<&str>) -> Option<String> {
    static ID_SIZE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"-(\d+)x(\d+)-").expect("id-size regex"));
    let caps = ID_SIZE.captures(id?)?;
    Some(format!("{}*{}", &caps[1], &caps[2]))
}

fn infer_size_from_text(puzzle_text: &str) -> Option<String> {
    static HOUSES: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"There are (\d+) houses").expect("houses regex"));
    let caps = HOUSES.captures(puzzle_text)?;
    Some(format!("{}*0", &caps[1]))
}

fn extract_template(value: Option<&Value>) -> Option<GridTemplate> {
    let value = value?;
    let parsed: GridTemplate = match value {
        Value::Object(_) => serde_json::from_value(value.clone()).ok()?,
        // CSV cells carry templates as JSON strings.
        Value::String(raw) => serde_json::from_str(raw.trim()).ok()?,
        _ => return None,
    };
    (!parsed.header.is_empty()).then_some(parsed)
}

/// Normalizes one raw record. Non-object values yield `None`.
fn normalize_record(value: Value) -> Option<PuzzleRecord> {
    let record = value.as_object()?;

    let id = match record.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let puzzle = extract_puzzle_text(record);
    let size = nonempty_str(record.get("size"))
        .map(str::to_string)
        .or_else(|| infer_size_from_id(id.as_deref()))
        .or_else(|| (!puzzle.is_empty()).then(|| infer_size_from_text(&puzzle)).flatten());

    Some(PuzzleRecord {
        id,
        size,
        puzzle,
        solution: extract_template(record.get("solution")),
    })
}

fn parse_json_lines(content: &str) -> Vec<PuzzleRecord> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(normalize_record)
        .collect()
}

fn load_json(content: &str) -> Vec<PuzzleRecord> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(items)) => items.into_iter().filter_map(normalize_record).collect(),
        Ok(value @ Value::Object(_)) => normalize_record(value).into_iter().collect(),
        Ok(_) => Vec::new(),
        // Some sources use ".json" but actually store JSONL; fall back to
        // line-delimited parsing.
        Err(_) => parse_json_lines(content),
    }
}

fn load_csv(path: &Path) -> Result<Vec<PuzzleRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut object = Map::new();
        for (key, cell) in headers.iter().zip(row.iter()) {
            object.insert(key.to_string(), Value::String(cell.to_string()));
        }
        if let Some(record) = normalize_record(Value::Object(object)) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Reads puzzles from a file, dispatching on extension: `.json` (array,
/// object, or mislabeled JSONL), `.csv`, and line-delimited JSON for
/// everything else. `.parquet` is rejected with a conversion hint.
pub fn load_puzzles(path: &Path) -> Result<Vec<PuzzleRecord>> {
    if !path.exists() {
        return Err(Error::input(format!("file not found: {}", path.display())));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "parquet" => Err(Error::input(format!(
            "parquet input is not supported; convert {} to .jsonl or .csv first",
            path.display()
        ))),
        "json" => Ok(load_json(&std::fs::read_to_string(path)?)),
        "csv" => load_csv(path),
        _ => {
            if extension != "jsonl" {
                warn!(path = %path.display(), "unrecognized extension; parsing as JSONL");
            }
            Ok(parse_json_lines(&std::fs::read_to_string(path)?))
        }
    }
}
