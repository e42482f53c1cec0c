//! Clue lexicon: canonical category naming, value-to-category lookup, and the
//! small word tables shared by the clue and puzzle compilers.

use std::collections::HashMap;

use indexmap::IndexMap;

/// Capitalized tokens that are never person names.
pub const STOP_CAPS: &[&str] = &[
    "There",
    "Each",
    "House",
    "Houses",
    "Clues",
    "Colors",
    "Pets",
    "People",
    "Person",
    "Friends",
    "Friend",
    "The",
    "A",
    "An",
    "In",
    "On",
    "To",
    "Of",
    "And",
    "Is",
    "Are",
    "Was",
    "Were",
    "One",
    "Two",
    "Three",
    "Four",
    "Five",
    "Six",
    "Seven",
    "Eight",
    "Nine",
    "Ten",
    "First",
    "Second",
    "Third",
    "Left",
    "Right",
    "Immediately",
    "Between",
];

const NUMBER_WORDS: &[(&str, usize)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

const ORDINAL_WORDS: &[(&str, usize)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
];

/// Substring-to-category table, tested in priority order: compound forms
/// (`book genre`, `phone model`) precede their bare prefixes, and the generic
/// people-words come last so labels like "The people are of nationalities"
/// land on the specific category they describe.
const CATEGORY_PATTERNS: &[(&[&str], &str)] = &[
    (&["color"], "Color"),
    (&["nationality"], "Nationality"),
    (&["book genre"], "BookGenre"),
    (&["book"], "Book"),
    (&["food", "lunch", "meal"], "Food"),
    (&["drink"], "Drink"),
    (&["animal", "pet"], "Pet"),
    (&["occupation", "job"], "Occupation"),
    (&["phone model"], "PhoneModel"),
    (&["phone"], "Phone"),
    (&["car"], "CarModel"),
    (&["sport"], "Sport"),
    (&["music"], "Music"),
    (&["height"], "Height"),
    (&["child"], "Child"),
    (&["name", "person", "people", "friend"], "Name"),
];

/// Near-synonymous category pairs, consulted only by the grid emitter.
pub fn grid_aliases(attribute: &str) -> &'static [&'static str] {
    match attribute {
        "Pet" => &["Animal"],
        "Animal" => &["Pet"],
        "Book" => &["BookGenre"],
        "BookGenre" => &["Book"],
        "Phone" => &["PhoneModel"],
        "PhoneModel" => &["Phone"],
        _ => &[],
    }
}

pub fn number_word(token: &str) -> Option<usize> {
    NUMBER_WORDS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|&(_, n)| n)
}

pub fn ordinal_word(token: &str) -> Option<usize> {
    ORDINAL_WORDS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|&(_, n)| n)
}

/// Collapses whitespace runs and lowercases.
pub fn norm(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Trims surrounding whitespace and terminal punctuation.
pub fn strip_punct(s: &str) -> &str {
    s.trim().trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '.' | ';' | ':' | '!' | '?' | ',')
    })
}

/// Drops a single leading article ("the dog" -> "dog").
pub fn strip_article(s: &str) -> &str {
    let trimmed = s.trim();
    for article in ["the ", "a ", "an ", "The ", "A ", "An "] {
        if let Some(rest) = trimmed.strip_prefix(article) {
            return rest.trim_start();
        }
    }
    trimmed
}

/// Cleans a phrase that should map to a value in some category.
pub fn clean_value_phrase(s: &str) -> String {
    strip_punct(strip_article(s)).replace('`', "").trim().to_string()
}

/// A single capitalized word (`Alice`, `German`), the shape a bare name takes
/// inside a clue.
pub fn is_capitalized_token(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            let mut saw_lower = false;
            for c in chars {
                if !c.is_ascii_lowercase() {
                    return false;
                }
                saw_lower = true;
            }
            saw_lower
        }
        _ => false,
    }
}

/// Assigns canonical category names to raw attribute labels, remembering
/// previous answers so repeated labels stay stable and unknown labels get a
/// deterministic running `Attr_k` index.
#[derive(Debug, Default)]
pub struct CategoryNamer {
    raw_to_key: HashMap<String, String>,
    unknown_idx: usize,
}

impl CategoryNamer {
    pub fn new() -> Self {
        Self {
            raw_to_key: HashMap::new(),
            unknown_idx: 1,
        }
    }

    pub fn canonicalize(&mut self, raw_label: &str) -> String {
        let raw_key = norm(strip_punct(raw_label).trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '-' | '–' | '—')
        }));
        if let Some(key) = self.raw_to_key.get(&raw_key) {
            return key.clone();
        }

        let key = CATEGORY_PATTERNS
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| raw_key.contains(needle)))
            .map(|&(_, key)| key.to_string())
            .unwrap_or_else(|| {
                let key = format!("Attr_{}", self.unknown_idx);
                self.unknown_idx += 1;
                key
            });

        self.raw_to_key.insert(raw_key, key.clone());
        key
    }
}

/// A value collision between two categories declaring the same value. The
/// first declaring category wins; the collision is surfaced, not fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCollision {
    pub value: String,
    pub kept_category: String,
    pub ignored_category: String,
}

/// Reverse index from a normalized value to its declaring category and the
/// declared (case-preserved) spelling.
#[derive(Debug, Default)]
pub struct ValueIndex {
    by_norm: HashMap<String, (String, String)>,
    collisions: Vec<ValueCollision>,
}

impl ValueIndex {
    pub fn build(categories: &IndexMap<String, Vec<String>>) -> Self {
        let mut index = Self::default();
        for (category, values) in categories {
            for value in values {
                let key = norm(value);
                match index.by_norm.get(&key) {
                    None => {
                        index
                            .by_norm
                            .insert(key, (category.clone(), value.clone()));
                    }
                    Some((kept, _)) if kept != category => {
                        index.collisions.push(ValueCollision {
                            value: value.clone(),
                            kept_category: kept.clone(),
                            ignored_category: category.clone(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        index
    }

    /// Looks up a cleaned phrase; returns `(category, declared_value)`.
    pub fn lookup(&self, phrase: &str) -> Option<(&str, &str)> {
        self.by_norm
            .get(&norm(phrase))
            .map(|(cat, value)| (cat.as_str(), value.as_str()))
    }

    pub fn collisions(&self) -> &[ValueCollision] {
        &self.collisions
    }
}
