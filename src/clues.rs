//! Clue compiler: template-matched translation of a single clue sentence
//! into zero or more constraints.
//!
//! The compiler is a deterministic cascade. Each template is a function
//! returning `Option<Vec<Constraint>>`; the first template whose shape
//! matches and whose value references resolve in the lexicon wins. A
//! sentence matching no template is preserved as a non-binding constraint so
//! it stays visible in diagnostics without affecting search.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::debug;

use crate::lexicon::{
    self, clean_value_phrase, is_capitalized_token, number_word, ordinal_word, ValueIndex,
};
use crate::model::{house_var, Constraint, Direction, HousePair};

/// Everything a template needs to resolve value references.
pub struct ClueContext<'a> {
    pub categories: &'a IndexMap<String, Vec<String>>,
    pub values: &'a ValueIndex,
    pub num_houses: usize,
}

/// A value reference resolved to its category and declared spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference {
    category: String,
    value: String,
}

impl Reference {
    fn new(category: &str, value: &str) -> Self {
        Self {
            category: category.to_string(),
            value: value.to_string(),
        }
    }
}

impl ClueContext<'_> {
    fn declared_name(&self, token: &str) -> bool {
        self.categories
            .get("Name")
            .is_some_and(|names| names.iter().any(|n| n == token))
    }

    /// Resolves a phrase to a (category, value) reference.
    ///
    /// Resolution order: a bare capitalized token declared as a Name; an
    /// exact lexicon hit on the cleaned phrase; a longest-match,
    /// non-overlapping left-to-right scan across the phrase's words; finally
    /// any remaining capitalized token is treated as a Name.
    fn resolve_reference(&self, phrase: &str) -> Option<Reference> {
        let cleaned = clean_value_phrase(phrase);
        if cleaned.is_empty() {
            return None;
        }

        if is_capitalized_token(&cleaned) && self.declared_name(&cleaned) {
            return Some(Reference::new("Name", &cleaned));
        }

        if let Some((category, declared)) = self.values.lookup(&cleaned) {
            return Some(Reference::new(category, declared));
        }

        if let Some(reference) = self.scan_for_value(&cleaned) {
            return Some(reference);
        }

        if is_capitalized_token(&cleaned) {
            return Some(Reference::new("Name", &cleaned));
        }

        None
    }

    /// Leftmost-longest lexicon match over the phrase's word windows; ties
    /// broken by earlier position, then greater length.
    fn scan_for_value(&self, cleaned: &str) -> Option<Reference> {
        let words: Vec<&str> = cleaned.split_whitespace().collect();
        for start in 0..words.len() {
            for end in (start + 1..=words.len()).rev() {
                let window = words[start..end].join(" ");
                if let Some((category, declared)) = self.values.lookup(&window) {
                    return Some(Reference::new(category, declared));
                }
            }
        }
        None
    }
}

type Template = fn(&str, &ClueContext) -> Option<Vec<Constraint>>;

/// `House k is [painted] V`
fn house_is_value(clue: &str, ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^House\s+(\d+)\s+is\s+(?:painted\s+)?([A-Za-z][A-Za-z\s-]*)$")
            .expect("house-is-value regex")
    });
    let caps = RE.captures(clue)?;
    let house: usize = caps[1].parse().ok()?;
    let cleaned = clean_value_phrase(&caps[2]);

    // Color wins when declared; otherwise fall back to the value's own
    // category, defaulting to Color for undeclared values.
    let (category, value) = if ctx.categories.contains_key("Color") {
        match ctx.values.lookup(&cleaned) {
            Some(("Color", declared)) => ("Color".to_string(), declared.to_string()),
            _ => ("Color".to_string(), cleaned),
        }
    } else {
        match ctx.values.lookup(&cleaned) {
            Some((category, declared)) => (category.to_string(), declared.to_string()),
            None => ("Color".to_string(), cleaned),
        }
    };

    Some(vec![
        Constraint::equals(house_var(house, &category), value).with_description(clue),
    ])
}

/// `Name lives in house k`
fn name_lives_in_house(clue: &str, _ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^([A-Z][a-z]+)\s+lives\s+in\s+house\s+(\d+)$").expect("name-in-house regex")
    });
    let caps = RE.captures(clue)?;
    let name = caps[1].to_string();
    let house: usize = caps[2].parse().ok()?;
    Some(vec![
        Constraint::equals(house_var(house, "Name"), name).with_description(clue),
    ])
}

/// `The person in house k owns the V`
fn person_in_house_owns(clue: &str, ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^The\s+person\s+in\s+house\s+(\d+)\s+owns\s+the\s+(.+)$")
            .expect("person-owns regex")
    });
    let caps = RE.captures(clue)?;
    let house: usize = caps[1].parse().ok()?;
    let (category, declared) = ctx.values.lookup(&clean_value_phrase(&caps[2]))?;
    Some(vec![
        Constraint::equals(house_var(house, category), declared).with_description(clue),
    ])
}

/// `Name lives in the V house`
fn name_lives_in_value_house(clue: &str, ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^([A-Z][a-z]+)\s+lives\s+in\s+the\s+(.+)\s+house$")
            .expect("name-in-value-house regex")
    });
    let caps = RE.captures(clue)?;
    let name = caps[1].to_string();
    let (category, declared) = ctx.values.lookup(&clean_value_phrase(&caps[2]))?;
    let pair = HousePair::new("Name", name, category, declared);
    Some(vec![
        Constraint::same_house_pair(pair, ctx.num_houses, clue),
    ])
}

/// `The VA house contains the VB`
fn house_contains(clue: &str, ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^The\s+(.+)\s+house\s+contains\s+the\s+(.+)$")
            .expect("house-contains regex")
    });
    let caps = RE.captures(clue)?;
    let (cat_a, val_a) = ctx.values.lookup(&clean_value_phrase(&caps[1]))?;
    let (cat_b, val_b) = ctx.values.lookup(&clean_value_phrase(&caps[2]))?;
    if cat_a == cat_b {
        return None;
    }
    let pair = HousePair::new(cat_a, val_a, cat_b, val_b);
    Some(vec![
        Constraint::same_house_pair(pair, ctx.num_houses, clue),
    ])
}

/// `Name does not live in the V house`
fn name_not_in_value_house(clue: &str, ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^([A-Z][a-z]+)\s+does\s+not\s+live\s+in\s+the\s+(.+)\s+house$")
            .expect("name-not-in-value-house regex")
    });
    let caps = RE.captures(clue)?;
    let name = caps[1].to_string();
    let (category, declared) = ctx.values.lookup(&clean_value_phrase(&caps[2]))?;
    let pair = HousePair::new("Name", name, category, declared);
    Some(vec![
        Constraint::forbid_same_house_pair(pair, ctx.num_houses, clue),
    ])
}

/// `... is [not] in the ORD house`
fn subject_in_ordinal_house(clue: &str, ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^(.+?)\s+is\s+(not\s+)?in\s+the\s+([A-Za-z]+)\s+house$")
            .expect("ordinal-house regex")
    });
    let caps = RE.captures(clue)?;
    let house = ordinal_word(&lexicon::norm(&caps[3]))?;
    if house > ctx.num_houses {
        return None;
    }
    let negated = caps.get(2).is_some();
    let reference = ctx.resolve_reference(&caps[1])?;
    let var = house_var(house, &reference.category);
    let constraint = if negated {
        Constraint::not_equals(var, reference.value)
    } else {
        Constraint::equals(var, reference.value)
    };
    Some(vec![constraint.with_description(clue)])
}

/// `The V1 house is immediately to the left of the V2 house`
fn immediately_left_of(clue: &str, ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)^The\s+(.+)\s+house\s+is\s+immediately\s+to\s+the\s+left\s+of\s+the\s+(.+)\s+house$",
        )
        .expect("immediately-left regex")
    });
    let caps = RE.captures(clue)?;
    let left = ctx.values.lookup(&clean_value_phrase(&caps[1]))?;
    let right = ctx.values.lookup(&clean_value_phrase(&caps[2]))?;
    if left.0 != "Color" || right.0 != "Color" {
        return None;
    }
    let pair = HousePair::new("Color", left.1, "Color", right.1);
    Some(vec![
        Constraint::immediately_left(pair, ctx.num_houses, clue),
    ])
}

/// `Name owns|has|keeps the V` / `The V belongs to Name`
fn ownership(clue: &str, ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static FORWARD: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^([A-Z][a-z]+)\s+(?:owns|has|keeps)\s+the\s+(.+)$")
            .expect("ownership regex")
    });
    static REVERSE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^The\s+(.+)\s+belongs\s+to\s+([A-Z][a-z]+)$")
            .expect("reverse-ownership regex")
    });

    if let Some(caps) = FORWARD.captures(clue) {
        let name = caps[1].to_string();
        let (category, declared) = ctx.values.lookup(&clean_value_phrase(&caps[2]))?;
        let pair = HousePair::new("Name", name, category, declared);
        return Some(vec![
            Constraint::same_house_pair(pair, ctx.num_houses, clue),
        ]);
    }

    let caps = REVERSE.captures(clue)?;
    let (category, declared) = ctx.values.lookup(&clean_value_phrase(&caps[1]))?;
    let name = caps[2].to_string();
    let pair = HousePair::new(category, declared, "Name", name);
    Some(vec![
        Constraint::same_house_pair(pair, ctx.num_houses, clue),
    ])
}

/// `... is next to ...` / `... lives next to ...`
fn next_to(clue: &str, ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static IS_NEXT: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)^(?:The\s+)?(.+?)\s+(?:house\s+)?(?:lives\s+)?is\s+next\s+to\s+(?:the\s+)?(.+?)(?:\s+house)?$",
        )
        .expect("is-next-to regex")
    });
    static LIVES_NEXT: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^(.+?)\s+lives\s+next\s+to\s+(?:the\s+)?(.+)$")
            .expect("lives-next-to regex")
    });

    let caps = IS_NEXT.captures(clue).or_else(|| LIVES_NEXT.captures(clue))?;
    let left = ctx.resolve_reference(&caps[1])?;
    let right = ctx.resolve_reference(&caps[2])?;
    if left.category == right.category {
        return None;
    }
    let pair = HousePair::new(left.category, left.value, right.category, right.value);
    Some(vec![Constraint::adjacent(pair, ctx.num_houses, clue)])
}

/// `The VA house is to the left|right of the VB house` (non-immediate)
fn ordered_left_right(clue: &str, ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^The\s+(.+)\s+house\s+is\s+to\s+the\s+(left|right)\s+of\s+the\s+(.+)\s+house$")
            .expect("ordered regex")
    });
    let caps = RE.captures(clue)?;
    let (cat_a, val_a) = ctx.values.lookup(&clean_value_phrase(&caps[1]))?;
    let (cat_b, val_b) = ctx.values.lookup(&clean_value_phrase(&caps[3]))?;
    let direction = if caps[2].eq_ignore_ascii_case("left") {
        Direction::Left
    } else {
        Direction::Right
    };
    let pair = HousePair::new(cat_a, val_a, cat_b, val_b);
    Some(vec![
        Constraint::ordered(direction, pair, ctx.num_houses, clue),
    ])
}

/// `There is/are N house(s) between X and Y`
fn houses_between(clue: &str, ctx: &ClueContext) -> Option<Vec<Constraint>> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^There\s+(?:is|are)\s+(\w+)\s+house(?:s)?\s+between\s+(.+?)\s+and\s+(.+)$")
            .expect("houses-between regex")
    });
    let caps = RE.captures(clue)?;
    let token = lexicon::norm(&caps[1]);
    let gap = number_word(&token).or_else(|| token.parse().ok())?;
    let x = ctx.resolve_reference(&caps[2])?;
    let y = ctx.resolve_reference(&caps[3])?;
    if x.category == y.category {
        return None;
    }
    let pair = HousePair::new(x.category, x.value, y.category, y.value);
    Some(vec![Constraint::distance(gap, pair, ctx.num_houses, clue)])
}

/// Templates in match priority order.
const TEMPLATES: &[Template] = &[
    house_is_value,
    name_lives_in_house,
    person_in_house_owns,
    name_lives_in_value_house,
    house_contains,
    name_not_in_value_house,
    subject_in_ordinal_house,
    immediately_left_of,
    ownership,
    next_to,
    ordered_left_right,
    houses_between,
];

/// Compiles one clue sentence. Never fails: unmatched sentences become
/// non-binding constraints.
pub fn compile_clue(clue_text: &str, ctx: &ClueContext) -> Vec<Constraint> {
    let without_ticks = clue_text.trim().replace('`', "");
    let clean = lexicon::strip_punct(&without_ticks).to_string();
    if clean.is_empty() {
        return Vec::new();
    }

    for template in TEMPLATES {
        if let Some(constraints) = template(&clean, ctx) {
            return constraints;
        }
    }

    debug!(clue = %clean, "no clue template matched; keeping as non-binding");
    vec![Constraint::non_binding(clean)]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::ConstraintKind;

    fn categories() -> IndexMap<String, Vec<String>> {
        let mut categories = IndexMap::new();
        categories.insert(
            "Color".to_string(),
            vec!["red".to_string(), "blue".to_string(), "green".to_string()],
        );
        categories.insert(
            "Pet".to_string(),
            vec!["cat".to_string(), "dog".to_string(), "turtle".to_string()],
        );
        categories.insert(
            "Nationality".to_string(),
            vec![
                "norwegian".to_string(),
                "german".to_string(),
                "dane".to_string(),
            ],
        );
        categories.insert(
            "PhoneModel".to_string(),
            vec![
                "iphone 13".to_string(),
                "oneplus 9".to_string(),
                "samsung galaxy s21".to_string(),
            ],
        );
        categories.insert(
            "Name".to_string(),
            vec!["Alice".to_string(), "Bob".to_string(), "Carol".to_string()],
        );
        categories
    }

    fn compile(clue: &str) -> Vec<Constraint> {
        let categories = categories();
        let values = ValueIndex::build(&categories);
        let ctx = ClueContext {
            categories: &categories,
            values: &values,
            num_houses: 3,
        };
        compile_clue(clue, &ctx)
    }

    fn single(clue: &str) -> Constraint {
        let mut constraints = compile(clue);
        assert_eq!(constraints.len(), 1, "expected one constraint for {clue:?}");
        constraints.remove(0)
    }

    #[test]
    fn house_is_painted_binds_color() {
        let c = single("House 1 is painted red.");
        assert_eq!(
            c.kind,
            ConstraintKind::Equals {
                var: "House_1_Color".into(),
                value: "red".into()
            }
        );
        assert_eq!(c.description, "House 1 is painted red");
    }

    #[test]
    fn name_lives_in_numbered_house() {
        let c = single("Alice lives in house 3.");
        assert_eq!(
            c.kind,
            ConstraintKind::Equals {
                var: "House_3_Name".into(),
                value: "Alice".into()
            }
        );
    }

    #[test]
    fn person_in_house_owns_resolves_category() {
        let c = single("The person in house 2 owns the dog.");
        assert_eq!(
            c.kind,
            ConstraintKind::Equals {
                var: "House_2_Pet".into(),
                value: "dog".into()
            }
        );
    }

    #[test]
    fn name_in_value_house_is_biconditional() {
        let c = single("Bob lives in the blue house.");
        match c.kind {
            ConstraintKind::SameHousePair { pair, houses } => {
                assert_eq!(houses, 3);
                assert_eq!(pair, HousePair::new("Name", "Bob", "Color", "blue"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn house_contains_links_two_categories() {
        let c = single("The green house contains the turtle.");
        match c.kind {
            ConstraintKind::SameHousePair { pair, .. } => {
                assert_eq!(pair, HousePair::new("Color", "green", "Pet", "turtle"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn negated_residence_forbids_pairing() {
        let c = single("Carol does not live in the red house.");
        match c.kind {
            ConstraintKind::ForbidSameHousePair { pair, .. } => {
                assert_eq!(pair, HousePair::new("Name", "Carol", "Color", "red"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn ordinal_house_uses_declared_spelling() {
        let c = single("The German is in the first house.");
        assert_eq!(
            c.kind,
            ConstraintKind::Equals {
                var: "House_1_Nationality".into(),
                value: "german".into()
            }
        );

        let c = single("Alice is not in the second house.");
        assert_eq!(
            c.kind,
            ConstraintKind::NotEquals {
                var: "House_2_Name".into(),
                value: "Alice".into()
            }
        );
    }

    #[test]
    fn immediately_left_requires_two_colors() {
        let c = single("The red house is immediately to the left of the blue house.");
        match c.kind {
            ConstraintKind::ImmediateLeft { pair, houses } => {
                assert_eq!(houses, 3);
                assert_eq!(pair, HousePair::new("Color", "red", "Color", "blue"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }

        // A pet is not a color; the sentence stays non-binding.
        let c = single("The dog house is immediately to the left of the blue house.");
        assert_eq!(c.kind, ConstraintKind::NonBinding);
    }

    #[test]
    fn ownership_both_directions() {
        let c = single("Alice owns the cat.");
        match c.kind {
            ConstraintKind::SameHousePair { pair, .. } => {
                assert_eq!(pair, HousePair::new("Name", "Alice", "Pet", "cat"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }

        let c = single("The turtle belongs to Carol.");
        match c.kind {
            ConstraintKind::SameHousePair { pair, .. } => {
                assert_eq!(pair, HousePair::new("Pet", "turtle", "Name", "Carol"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn next_to_is_adjacency() {
        let c = single("Alice lives next to the dog.");
        match c.kind {
            ConstraintKind::Adjacent { pair, .. } => {
                assert_eq!(pair, HousePair::new("Name", "Alice", "Pet", "dog"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }

        let c = single("The dane is next to the red house.");
        match c.kind {
            ConstraintKind::Adjacent { pair, .. } => {
                assert_eq!(pair, HousePair::new("Nationality", "dane", "Color", "red"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn left_right_ordering_is_strict() {
        let c = single("The red house is to the left of the green house.");
        match c.kind {
            ConstraintKind::Ordered {
                direction, pair, ..
            } => {
                assert_eq!(direction, Direction::Left);
                assert_eq!(pair, HousePair::new("Color", "red", "Color", "green"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn houses_between_counts_gap() {
        let c = single("There are two houses between Alice and the dog.");
        match c.kind {
            ConstraintKind::Distance { gap, pair, .. } => {
                assert_eq!(gap, 2);
                assert_eq!(pair, HousePair::new("Name", "Alice", "Pet", "dog"));
            }
            other => panic!("unexpected kind: {other:?}"),
        }

        let c = single("There is 1 house between Bob and the turtle.");
        match c.kind {
            ConstraintKind::Distance { gap, .. } => assert_eq!(gap, 1),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn multi_word_values_resolve_by_longest_match() {
        let c = single("Bob is next to the samsung galaxy s21.");
        match c.kind {
            ConstraintKind::Adjacent { pair, .. } => {
                assert_eq!(
                    pair,
                    HousePair::new("Name", "Bob", "PhoneModel", "samsung galaxy s21")
                );
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn unmatched_sentences_are_retained_non_binding() {
        let c = single("The stars are beautiful tonight.");
        assert_eq!(c.kind, ConstraintKind::NonBinding);
        assert_eq!(c.description, "The stars are beautiful tonight");
        assert!(c.scope.is_empty());

        // Backticks are stripped before matching.
        let c = single("`Alice` lives in house 3.");
        assert!(matches!(c.kind, ConstraintKind::Equals { .. }));
    }
}
