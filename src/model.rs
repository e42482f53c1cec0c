//! CSP entity model: variables, constraints, and the CSP container.
//!
//! Constraints are a closed set of tagged variants rather than boxed
//! closures; each variant evaluates [`Constraint::is_satisfied`] by pattern
//! matching. Predicates are tolerant of partial assignments: they return
//! `true` while undetermined and `false` only once the bound portion of the
//! scope proves a violation.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use im::OrdSet;

use crate::error::{Error, Result};

/// A partial mapping from variable name to value. Ordered for deterministic
/// iteration.
pub type Assignment = BTreeMap<String, String>;

/// Per-variable domain map. Persistent, so search-local copies share
/// structure with the canonical map they were cloned from.
pub type DomainMap = im::HashMap<String, OrdSet<String>>;

/// Builds the canonical `House_<i>_<Category>` variable name.
pub fn house_var(house: usize, category: &str) -> String {
    format!("House_{house}_{category}")
}

/// A named variable with a finite domain of string values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub domain: OrdSet<String>,
}

impl Variable {
    pub fn new<I, V>(name: impl Into<String>, domain: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            domain: domain.into_iter().map(Into::into).collect(),
        }
    }
}

/// Which side of a strict positional ordering the first referent falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// A (category, value) pair on each side of a house-linking constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HousePair {
    pub cat_a: String,
    pub val_a: String,
    pub cat_b: String,
    pub val_b: String,
}

impl HousePair {
    pub fn new(
        cat_a: impl Into<String>,
        val_a: impl Into<String>,
        cat_b: impl Into<String>,
        val_b: impl Into<String>,
    ) -> Self {
        Self {
            cat_a: cat_a.into(),
            val_a: val_a.into(),
            cat_b: cat_b.into(),
            val_b: val_b.into(),
        }
    }
}

/// The evaluable form of a constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Bound scope values must be pairwise distinct.
    AllDiff,
    /// `var`, if bound, equals `value`.
    Equals { var: String, value: String },
    /// `var`, if bound, differs from `value`.
    NotEquals { var: String, value: String },
    /// The two variables, once both bound, hold the same value.
    VarsEqual { var_a: String, var_b: String },
    /// Both sides occupy the same house (biconditional per house).
    SameHousePair { pair: HousePair, houses: usize },
    /// The two sides never occupy the same house.
    ForbidSameHousePair { pair: HousePair, houses: usize },
    /// Side A sits immediately left of side B.
    ImmediateLeft { pair: HousePair, houses: usize },
    /// The two sides sit in adjacent houses.
    Adjacent { pair: HousePair, houses: usize },
    /// Side A sits strictly left/right of side B (non-immediate).
    Ordered {
        direction: Direction,
        pair: HousePair,
        houses: usize,
    },
    /// Exactly `gap` houses between the two sides.
    Distance {
        gap: usize,
        pair: HousePair,
        houses: usize,
    },
    /// An unrecognized clue, retained for diagnostics. Always satisfied.
    NonBinding,
}

/// A constraint: a human-readable description, the variables it touches, and
/// an evaluable [`ConstraintKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub description: String,
    pub scope: Vec<String>,
    pub kind: ConstraintKind,
}

fn pair_scope(pair: &HousePair, houses: usize) -> Vec<String> {
    let mut scope = Vec::with_capacity(houses * 2);
    for i in 1..=houses {
        scope.push(house_var(i, &pair.cat_a));
        if pair.cat_b != pair.cat_a {
            scope.push(house_var(i, &pair.cat_b));
        }
    }
    scope
}

/// House index currently holding `value` in `category`, if bound anywhere.
fn position_of(
    assignment: &Assignment,
    category: &str,
    value: &str,
    houses: usize,
) -> Option<usize> {
    (1..=houses).find(|&i| {
        assignment
            .get(&house_var(i, category))
            .is_some_and(|v| v == value)
    })
}

impl Constraint {
    pub fn all_diff(scope: Vec<String>) -> Self {
        let description = format!("AllDiff: {}", scope.join(", "));
        Self {
            description,
            scope,
            kind: ConstraintKind::AllDiff,
        }
    }

    pub fn equals(var: impl Into<String>, value: impl Into<String>) -> Self {
        let var = var.into();
        let value = value.into();
        Self {
            description: format!("{var} == {value}"),
            scope: vec![var.clone()],
            kind: ConstraintKind::Equals { var, value },
        }
    }

    pub fn not_equals(var: impl Into<String>, value: impl Into<String>) -> Self {
        let var = var.into();
        let value = value.into();
        Self {
            description: format!("{var} != {value}"),
            scope: vec![var.clone()],
            kind: ConstraintKind::NotEquals { var, value },
        }
    }

    pub fn vars_equal(var_a: impl Into<String>, var_b: impl Into<String>) -> Self {
        let var_a = var_a.into();
        let var_b = var_b.into();
        Self {
            description: format!("{var_a} == {var_b}"),
            scope: vec![var_a.clone(), var_b.clone()],
            kind: ConstraintKind::VarsEqual { var_a, var_b },
        }
    }

    pub fn same_house_pair(pair: HousePair, houses: usize, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            scope: pair_scope(&pair, houses),
            kind: ConstraintKind::SameHousePair { pair, houses },
        }
    }

    pub fn forbid_same_house_pair(
        pair: HousePair,
        houses: usize,
        description: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            scope: pair_scope(&pair, houses),
            kind: ConstraintKind::ForbidSameHousePair { pair, houses },
        }
    }

    pub fn immediately_left(pair: HousePair, houses: usize, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            scope: pair_scope(&pair, houses),
            kind: ConstraintKind::ImmediateLeft { pair, houses },
        }
    }

    pub fn adjacent(pair: HousePair, houses: usize, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            scope: pair_scope(&pair, houses),
            kind: ConstraintKind::Adjacent { pair, houses },
        }
    }

    pub fn ordered(
        direction: Direction,
        pair: HousePair,
        houses: usize,
        description: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            scope: pair_scope(&pair, houses),
            kind: ConstraintKind::Ordered {
                direction,
                pair,
                houses,
            },
        }
    }

    pub fn distance(
        gap: usize,
        pair: HousePair,
        houses: usize,
        description: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            scope: pair_scope(&pair, houses),
            kind: ConstraintKind::Distance { gap, pair, houses },
        }
    }

    pub fn non_binding(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            scope: Vec::new(),
            kind: ConstraintKind::NonBinding,
        }
    }

    /// Replaces the generated description, typically with the clue sentence
    /// the constraint was compiled from.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn involves(&self, variable: &str) -> bool {
        self.scope.iter().any(|v| v == variable)
    }

    /// Evaluate against a (possibly partial) assignment.
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        match &self.kind {
            ConstraintKind::AllDiff => {
                let mut seen = BTreeSet::new();
                for var in &self.scope {
                    if let Some(value) = assignment.get(var) {
                        if !seen.insert(value) {
                            return false;
                        }
                    }
                }
                true
            }
            ConstraintKind::Equals { var, value } => {
                assignment.get(var).map_or(true, |v| v == value)
            }
            ConstraintKind::NotEquals { var, value } => {
                assignment.get(var).map_or(true, |v| v != value)
            }
            ConstraintKind::VarsEqual { var_a, var_b } => {
                match (assignment.get(var_a), assignment.get(var_b)) {
                    (Some(a), Some(b)) => a == b,
                    _ => true,
                }
            }
            ConstraintKind::SameHousePair { pair, houses } => {
                for i in 1..=*houses {
                    let a = assignment.get(&house_var(i, &pair.cat_a));
                    let b = assignment.get(&house_var(i, &pair.cat_b));
                    if a.is_some_and(|v| v == &pair.val_a) && b.is_some_and(|v| v != &pair.val_b) {
                        return false;
                    }
                    if b.is_some_and(|v| v == &pair.val_b) && a.is_some_and(|v| v != &pair.val_a) {
                        return false;
                    }
                }
                true
            }
            ConstraintKind::ForbidSameHousePair { pair, houses } => {
                for i in 1..=*houses {
                    let a = assignment.get(&house_var(i, &pair.cat_a));
                    let b = assignment.get(&house_var(i, &pair.cat_b));
                    if a.is_some_and(|v| v == &pair.val_a) && b.is_some_and(|v| v == &pair.val_b) {
                        return false;
                    }
                }
                true
            }
            ConstraintKind::ImmediateLeft { pair, houses } => {
                // Boundary pruning holds even before the other side is bound:
                // the left referent cannot sit in the last house, nor the
                // right referent in the first.
                if assignment
                    .get(&house_var(*houses, &pair.cat_a))
                    .is_some_and(|v| v == &pair.val_a)
                {
                    return false;
                }
                if assignment
                    .get(&house_var(1, &pair.cat_b))
                    .is_some_and(|v| v == &pair.val_b)
                {
                    return false;
                }
                for i in 1..*houses {
                    let a = assignment.get(&house_var(i, &pair.cat_a));
                    let b = assignment.get(&house_var(i + 1, &pair.cat_b));
                    if a.is_some_and(|v| v == &pair.val_a) && b.is_some_and(|v| v != &pair.val_b) {
                        return false;
                    }
                    if b.is_some_and(|v| v == &pair.val_b) && a.is_some_and(|v| v != &pair.val_a) {
                        return false;
                    }
                }
                let pos_a = position_of(assignment, &pair.cat_a, &pair.val_a, *houses);
                let pos_b = position_of(assignment, &pair.cat_b, &pair.val_b, *houses);
                match (pos_a, pos_b) {
                    (Some(a), Some(b)) => b == a + 1,
                    _ => true,
                }
            }
            ConstraintKind::Adjacent { pair, houses } => {
                let pos_a = position_of(assignment, &pair.cat_a, &pair.val_a, *houses);
                let pos_b = position_of(assignment, &pair.cat_b, &pair.val_b, *houses);
                match (pos_a, pos_b) {
                    (Some(a), Some(b)) => a.abs_diff(b) == 1,
                    _ => true,
                }
            }
            ConstraintKind::Ordered {
                direction,
                pair,
                houses,
            } => {
                let pos_a = position_of(assignment, &pair.cat_a, &pair.val_a, *houses);
                let pos_b = position_of(assignment, &pair.cat_b, &pair.val_b, *houses);
                match (pos_a, pos_b) {
                    (Some(a), Some(b)) => match direction {
                        Direction::Left => a < b,
                        Direction::Right => a > b,
                    },
                    _ => true,
                }
            }
            ConstraintKind::Distance { gap, pair, houses } => {
                let pos_a = position_of(assignment, &pair.cat_a, &pair.val_a, *houses);
                let pos_b = position_of(assignment, &pair.cat_b, &pair.val_b, *houses);
                match (pos_a, pos_b) {
                    (Some(a), Some(b)) => a.abs_diff(b) == gap + 1,
                    _ => true,
                }
            }
            ConstraintKind::NonBinding => true,
        }
    }
}

/// The compiled problem: variables, constraints, and derived indices.
///
/// All fields are fixed at construction; search copies [`Csp::domains`] and
/// mutates only the copies.
#[derive(Debug, Clone)]
pub struct Csp {
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    /// Iteration order for variable selection and arc seeding.
    pub variable_names: Vec<String>,
    /// Canonical domains, one entry per variable.
    pub domains: DomainMap,
    constraints_by_var: HashMap<String, Vec<usize>>,
    neighbors: HashMap<String, BTreeSet<String>>,
}

impl Csp {
    /// Builds the container and its derived indices in a single pass.
    ///
    /// Scope entries that name unknown variables are tolerated (they simply
    /// do not participate in indexing); duplicate variable names are a
    /// [`Error::Config`].
    pub fn new(variables: Vec<Variable>, constraints: Vec<Constraint>) -> Result<Self> {
        let variable_names: Vec<String> = variables.iter().map(|v| v.name.clone()).collect();
        {
            let mut seen = BTreeSet::new();
            for name in &variable_names {
                if !seen.insert(name.as_str()) {
                    return Err(Error::config(format!("duplicate variable name: {name}")));
                }
            }
        }

        let domains: DomainMap = variables
            .iter()
            .map(|v| (v.name.clone(), v.domain.clone()))
            .collect();

        let mut constraints_by_var: HashMap<String, Vec<usize>> = variable_names
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect();
        let mut neighbors: HashMap<String, BTreeSet<String>> = variable_names
            .iter()
            .map(|name| (name.clone(), BTreeSet::new()))
            .collect();

        for (index, constraint) in constraints.iter().enumerate() {
            for var in &constraint.scope {
                let Some(touching) = constraints_by_var.get_mut(var) else {
                    continue;
                };
                touching.push(index);
                let others = constraint
                    .scope
                    .iter()
                    .filter(|other| *other != var && neighbors.contains_key(*other))
                    .cloned()
                    .collect::<Vec<_>>();
                neighbors
                    .get_mut(var)
                    .expect("neighbor entry exists for every known variable")
                    .extend(others);
            }
        }

        // The same constraint can mention a variable more than once through
        // overlapping pair scopes; keep the index unique.
        for touching in constraints_by_var.values_mut() {
            touching.dedup();
        }

        Ok(Self {
            variables,
            constraints,
            variable_names,
            domains,
            constraints_by_var,
            neighbors,
        })
    }

    pub fn num_variables(&self) -> usize {
        self.variable_names.len()
    }

    /// Constraints whose scope mentions `variable`, in insertion order.
    pub fn constraints_for<'a>(&'a self, variable: &str) -> impl Iterator<Item = &'a Constraint> {
        self.constraints_by_var
            .get(variable)
            .into_iter()
            .flatten()
            .map(move |&index| &self.constraints[index])
    }

    /// Constraints whose scope mentions both variables, in insertion order.
    pub fn constraints_between<'a>(&'a self, var_a: &str, var_b: &str) -> Vec<&'a Constraint> {
        self.constraints_for(var_a)
            .filter(|c| c.involves(var_b))
            .collect()
    }

    /// Other variables sharing at least one constraint scope with `variable`,
    /// in lexicographic order.
    pub fn neighbors_of<'a>(&'a self, variable: &str) -> impl Iterator<Item = &'a str> {
        self.neighbors
            .get(variable)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// True when every constraint is satisfied under the partial assignment.
    pub fn is_consistent(&self, assignment: &Assignment) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(assignment))
    }

    /// A search-local copy of the canonical domains.
    pub fn copy_domains(&self) -> DomainMap {
        self.domains.clone()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn assignment(pairs: &[(&str, &str)]) -> Assignment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn all_diff_tolerates_partial_and_rejects_duplicates() {
        let c = Constraint::all_diff(vec!["A".into(), "B".into(), "C".into()]);
        assert!(c.is_satisfied(&assignment(&[])));
        assert!(c.is_satisfied(&assignment(&[("A", "1")])));
        assert!(c.is_satisfied(&assignment(&[("A", "1"), ("B", "2")])));
        assert!(!c.is_satisfied(&assignment(&[("A", "1"), ("C", "1")])));
    }

    #[test]
    fn equals_holds_while_unbound() {
        let c = Constraint::equals("A", "red");
        assert!(c.is_satisfied(&assignment(&[])));
        assert!(c.is_satisfied(&assignment(&[("A", "red")])));
        assert!(!c.is_satisfied(&assignment(&[("A", "blue")])));

        let n = Constraint::not_equals("A", "red");
        assert!(n.is_satisfied(&assignment(&[])));
        assert!(!n.is_satisfied(&assignment(&[("A", "red")])));
        assert!(n.is_satisfied(&assignment(&[("A", "blue")])));
    }

    #[test]
    fn same_house_pair_is_a_biconditional() {
        let pair = HousePair::new("Color", "red", "Pet", "dog");
        let c = Constraint::same_house_pair(pair, 2, "red house has the dog");

        assert!(c.is_satisfied(&assignment(&[("House_1_Color", "red")])));
        assert!(c.is_satisfied(&assignment(&[("House_1_Color", "red"), ("House_1_Pet", "dog")])));
        assert!(!c.is_satisfied(&assignment(&[("House_1_Color", "red"), ("House_1_Pet", "cat")])));
        assert!(!c.is_satisfied(&assignment(&[("House_2_Pet", "dog"), ("House_2_Color", "blue")])));
    }

    #[test]
    fn forbid_same_house_pair_needs_both_bound() {
        let pair = HousePair::new("Name", "Alice", "Color", "blue");
        let c = Constraint::forbid_same_house_pair(pair, 2, "Alice avoids the blue house");

        assert!(c.is_satisfied(&assignment(&[("House_1_Name", "Alice")])));
        assert!(!c.is_satisfied(&assignment(&[
            ("House_1_Name", "Alice"),
            ("House_1_Color", "blue"),
        ])));
        assert!(c.is_satisfied(&assignment(&[
            ("House_1_Name", "Alice"),
            ("House_1_Color", "red"),
        ])));
    }

    #[test]
    fn immediate_left_prunes_boundaries_early() {
        let pair = HousePair::new("Color", "red", "Color", "blue");
        let c = Constraint::immediately_left(pair, 3, "red immediately left of blue");

        // Left referent cannot occupy the last house.
        assert!(!c.is_satisfied(&assignment(&[("House_3_Color", "red")])));
        // Right referent cannot occupy the first house.
        assert!(!c.is_satisfied(&assignment(&[("House_1_Color", "blue")])));
        assert!(c.is_satisfied(&assignment(&[("House_1_Color", "red")])));
        assert!(c.is_satisfied(&assignment(&[
            ("House_1_Color", "red"),
            ("House_2_Color", "blue"),
        ])));
        assert!(!c.is_satisfied(&assignment(&[
            ("House_1_Color", "red"),
            ("House_2_Color", "green"),
        ])));
    }

    #[test]
    fn positional_kinds_report_consistent_until_both_bound() {
        let adjacent = Constraint::adjacent(
            HousePair::new("Name", "Alice", "Pet", "dog"),
            3,
            "Alice next to the dog",
        );
        assert!(adjacent.is_satisfied(&assignment(&[("House_1_Name", "Alice")])));
        assert!(adjacent.is_satisfied(&assignment(&[
            ("House_1_Name", "Alice"),
            ("House_2_Pet", "dog"),
        ])));
        assert!(!adjacent.is_satisfied(&assignment(&[
            ("House_1_Name", "Alice"),
            ("House_3_Pet", "dog"),
        ])));

        let ordered = Constraint::ordered(
            Direction::Left,
            HousePair::new("Color", "red", "Color", "blue"),
            3,
            "red left of blue",
        );
        assert!(ordered.is_satisfied(&assignment(&[("House_2_Color", "red")])));
        assert!(ordered.is_satisfied(&assignment(&[
            ("House_1_Color", "red"),
            ("House_3_Color", "blue"),
        ])));
        assert!(!ordered.is_satisfied(&assignment(&[
            ("House_3_Color", "red"),
            ("House_1_Color", "blue"),
        ])));

        let distance = Constraint::distance(
            2,
            HousePair::new("Name", "Alice", "Color", "green"),
            5,
            "two houses between Alice and the green house",
        );
        assert!(distance.is_satisfied(&assignment(&[("House_1_Name", "Alice")])));
        assert!(distance.is_satisfied(&assignment(&[
            ("House_1_Name", "Alice"),
            ("House_4_Color", "green"),
        ])));
        assert!(!distance.is_satisfied(&assignment(&[
            ("House_1_Name", "Alice"),
            ("House_2_Color", "green"),
        ])));
    }

    #[test]
    fn csp_rejects_duplicate_variable_names() {
        let variables = vec![
            Variable::new("A", ["1", "2"]),
            Variable::new("A", ["1", "2"]),
        ];
        let err = Csp::new(variables, Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn csp_indices_are_symmetric_and_insertion_ordered() {
        let variables = vec![
            Variable::new("A", ["1", "2"]),
            Variable::new("B", ["1", "2"]),
            Variable::new("C", ["1", "2"]),
        ];
        let constraints = vec![
            Constraint::all_diff(vec!["A".into(), "B".into()]),
            Constraint::equals("C", "1"),
        ];
        let csp = Csp::new(variables, constraints).unwrap();

        assert_eq!(csp.neighbors_of("A").collect::<Vec<_>>(), vec!["B"]);
        assert_eq!(csp.neighbors_of("B").collect::<Vec<_>>(), vec!["A"]);
        assert!(csp.neighbors_of("C").next().is_none());

        assert_eq!(csp.constraints_for("A").count(), 1);
        assert_eq!(csp.constraints_for("C").count(), 1);
        assert_eq!(csp.constraints_between("A", "B").len(), 1);
        assert!(csp.constraints_between("A", "C").is_empty());
    }

    #[test]
    fn is_consistent_checks_every_constraint() {
        let variables = vec![Variable::new("A", ["1"]), Variable::new("B", ["1"])];
        let constraints = vec![Constraint::all_diff(vec!["A".into(), "B".into()])];
        let csp = Csp::new(variables, constraints).unwrap();

        assert!(csp.is_consistent(&assignment(&[("A", "1")])));
        assert!(!csp.is_consistent(&assignment(&[("A", "1"), ("B", "1")])));
    }
}
