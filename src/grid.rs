//! Grid emitter: renders a solved assignment as a `House`-first grid.
//!
//! One convention, applied everywhere: a caller template's header wins when
//! present; otherwise the preferred attribute order below, then remaining
//! attributes lexicographically. Unbound cells render as `"___"`, and
//! near-synonymous categories (Pet/Animal, Book/BookGenre, Phone/PhoneModel)
//! are consulted through aliases so a template header in one spelling still
//! finds values compiled under the other.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::lexicon::grid_aliases;
use crate::model::{house_var, Assignment};
use crate::puzzle::{GridTemplate, PuzzleRecord};

pub const UNBOUND_CELL: &str = "___";

/// Attribute columns placed before the lexicographic remainder.
const PREFERRED_ATTRIBUTES: &[&str] = &[
    "Name",
    "Nationality",
    "BookGenre",
    "Book",
    "Occupation",
    "PhoneModel",
    "Phone",
    "CarModel",
    "Sport",
    "Food",
    "Drink",
    "Color",
    "Pet",
    "Animal",
    "Music",
    "Height",
    "Child",
];

/// A rendered grid: `House` plus one column per attribute, one row per house.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// `"solved"` or `"unsolved"`; emitted only when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    fn empty() -> Self {
        Self::default()
    }

    fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }
}

fn lookup_cell(assignment: &Assignment, house: usize, attribute: &str) -> String {
    if let Some(value) = assignment.get(&house_var(house, attribute)) {
        return value.clone();
    }
    for alias in grid_aliases(attribute) {
        if let Some(value) = assignment.get(&house_var(house, alias)) {
            return value.clone();
        }
    }
    UNBOUND_CELL.to_string()
}

/// Reshapes an assignment into a grid. Without an explicit header the
/// attribute columns are the assignment's attributes in lexicographic order;
/// without an explicit house count, the highest house index seen wins.
pub fn reformat_to_grid(
    assignment: &Assignment,
    header: Option<&[String]>,
    num_houses: Option<usize>,
) -> Grid {
    let mut houses: BTreeSet<usize> = BTreeSet::new();
    let mut seen_attributes: BTreeSet<String> = BTreeSet::new();
    for name in assignment.keys() {
        let Some(rest) = name.strip_prefix("House_") else {
            continue;
        };
        let Some((index, attribute)) = rest.split_once('_') else {
            continue;
        };
        if let Ok(index) = index.parse::<usize>() {
            houses.insert(index);
            seen_attributes.insert(attribute.to_string());
        }
    }

    let attributes: Vec<String> = match header {
        // The header includes "House" as its first column.
        Some(header) => header.iter().skip(1).cloned().collect(),
        None => seen_attributes.into_iter().collect(),
    };
    let num_houses = num_houses.unwrap_or_else(|| houses.iter().next_back().copied().unwrap_or(0));

    let mut rows = Vec::with_capacity(num_houses);
    for house in 1..=num_houses {
        let mut row = Vec::with_capacity(attributes.len() + 1);
        row.push(house.to_string());
        for attribute in &attributes {
            row.push(lookup_cell(assignment, house, attribute));
        }
        rows.push(row);
    }

    let mut resolved_header = Vec::with_capacity(attributes.len() + 1);
    resolved_header.push("House".to_string());
    resolved_header.extend(attributes);

    Grid {
        status: None,
        header: resolved_header,
        rows,
    }
}

fn template_rows_to_strings(rows: &[serde_json::Value]) -> Vec<Vec<String>> {
    rows.iter()
        .filter_map(|row| row.as_array())
        .map(|cells| {
            cells
                .iter()
                .map(|cell| match cell.as_str() {
                    Some(s) => s.to_string(),
                    None => cell.to_string(),
                })
                .collect()
        })
        .collect()
}

/// Formats a solver result for output, preferring the caller's template and
/// falling back to the record's own `solution` template, then to a
/// best-effort grid derived from the assignment alone.
pub fn format_solution(
    assignment: &Assignment,
    record: Option<&PuzzleRecord>,
    template: Option<&GridTemplate>,
    include_status: bool,
) -> Grid {
    let record_template = record.and_then(|r| r.solution.as_ref());
    let template = template.or(record_template);

    if assignment.is_empty() && template.is_none() {
        let grid = Grid::empty();
        return if include_status {
            grid.with_status("unsolved")
        } else {
            grid
        };
    }

    let grid = match template {
        Some(template) if !template.header.is_empty() && !template.rows.is_empty() => {
            reformat_to_grid(assignment, Some(&template.header), Some(template.rows.len()))
        }
        Some(template) => Grid {
            status: None,
            header: template.header.clone(),
            rows: template_rows_to_strings(&template.rows),
        },
        None => {
            // Best-effort output for records without templates.
            let discovered = reformat_to_grid(assignment, None, None);
            let attributes: Vec<String> = discovered.header.iter().skip(1).cloned().collect();
            let mut ordered: Vec<String> = PREFERRED_ATTRIBUTES
                .iter()
                .filter(|preferred| attributes.iter().any(|a| a == *preferred))
                .map(|a| a.to_string())
                .collect();
            let mut remainder: Vec<String> = attributes
                .iter()
                .filter(|a| !PREFERRED_ATTRIBUTES.contains(&a.as_str()))
                .cloned()
                .collect();
            remainder.sort();
            ordered.extend(remainder);

            let mut header = Vec::with_capacity(ordered.len() + 1);
            header.push("House".to_string());
            header.extend(ordered);
            reformat_to_grid(assignment, Some(&header), Some(discovered.rows.len()))
        }
    };

    if include_status {
        let status = if assignment.is_empty() {
            "unsolved"
        } else {
            "solved"
        };
        grid.with_status(status)
    } else {
        grid
    }
}
