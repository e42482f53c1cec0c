//! zebra-csp solves "Zebra"-style logic grid puzzles by compiling a
//! natural-language puzzle description into a finite-domain constraint
//! satisfaction problem and searching for a full assignment.
//!
//! The crate is two tightly coupled subsystems:
//!
//! - **Puzzle-to-CSP compiler** ([`puzzle`], [`clues`], [`lexicon`]): extracts
//!   attribute categories and domains from a semi-structured description,
//!   infers the house count and missing person names, and compiles each
//!   numbered clue sentence into constraints over variables of the form
//!   `House_<i>_<Category>`.
//! - **Backtracking solver** ([`solver`]): chronological backtracking with
//!   unary propagation, MRV variable ordering, forward checking, and AC-3 arc
//!   consistency, observable through a structured [`trace::Tracer`].
//!
//! # Example: a two-house CSP
//!
//! ```
//! use zebra_csp::{solve_with, Constraint, Csp, Tracer, Variable};
//!
//! let csp = Csp::new(
//!     vec![
//!         Variable::new("House_1_Color", ["Red", "Blue"]),
//!         Variable::new("House_2_Color", ["Red", "Blue"]),
//!     ],
//!     vec![
//!         Constraint::all_diff(vec!["House_1_Color".into(), "House_2_Color".into()]),
//!         Constraint::equals("House_1_Color", "Red"),
//!     ],
//! )
//! .unwrap();
//!
//! let mut tracer = Tracer::new(false);
//! let solution = solve_with(&csp, &mut tracer);
//! assert_eq!(solution["House_1_Color"], "Red");
//! assert_eq!(solution["House_2_Color"], "Blue");
//! ```
//!
//! Raw puzzle records go through [`solve_puzzle`] instead:
//! [`puzzle::parse_puzzle`] builds the CSP, [`solver::solve`] searches it,
//! and [`grid::format_solution`] shapes the result for output.

pub mod clues;
pub mod error;
pub mod grid;
pub mod lexicon;
pub mod loader;
pub mod model;
pub mod puzzle;
pub mod solver;
pub mod trace;

pub use error::{Error, Result};
pub use grid::{format_solution, reformat_to_grid, Grid};
pub use loader::load_puzzles;
pub use model::{
    Assignment, Constraint, ConstraintKind, Csp, Direction, DomainMap, HousePair, Variable,
};
pub use puzzle::{parse_puzzle, GridTemplate, PuzzleRecord};
pub use solver::{solve, solve_with};
pub use trace::{enable_tracing, global_tracer, reset_tracer, Tracer};

/// Compiles a puzzle record and solves it against the process-wide tracer.
///
/// Returns an empty assignment when the puzzle is unsatisfiable; parsing
/// itself never fails on puzzle content.
pub fn solve_puzzle(record: &PuzzleRecord) -> Result<Assignment> {
    let csp = parse_puzzle(record)?;
    Ok(solver::solve(&csp))
}

#[cfg(test)]
mod end_to_end {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(id: &str, size: &str, puzzle: &str) -> PuzzleRecord {
        PuzzleRecord {
            id: Some(id.to_string()),
            size: Some(size.to_string()),
            puzzle: puzzle.to_string(),
            solution: None,
        }
    }

    fn position_of(solution: &Assignment, category: &str, value: &str, houses: usize) -> usize {
        (1..=houses)
            .find(|i| {
                solution
                    .get(&model::house_var(*i, category))
                    .is_some_and(|v| v == value)
            })
            .unwrap_or_else(|| panic!("{value} not placed in {category}"))
    }

    #[test]
    fn simple_3x3_puzzle_solves_to_the_expected_grid() {
        let puzzle = record(
            "simple-3x3",
            "3*3",
            "\
Three friends live in three houses in a row, numbered 1 to 3.
Each house is painted a different color and each friend owns a different pet.

Colors: orange, blue, green.
Pets: cat, turtle, dog.

Clues:
1. Alice lives in house 3.
2. House 1 is painted orange.
3. The orange house contains the turtle.
4. Mallory lives in the blue house.
5. The green house contains the dog.
",
        );

        let solution = solve_puzzle(&puzzle).unwrap();
        assert!(!solution.is_empty(), "expected a solution assignment");
        assert_eq!(solution["House_1_Color"], "orange");
        assert_eq!(solution["House_1_Pet"], "turtle");
        assert_eq!(solution["House_2_Color"], "blue");
        assert_eq!(solution["House_2_Name"], "Mallory");
        assert_eq!(solution["House_2_Pet"], "cat");
        assert_eq!(solution["House_3_Name"], "Alice");
        assert_eq!(solution["House_3_Color"], "green");
        assert_eq!(solution["House_3_Pet"], "dog");
    }

    #[test]
    fn solved_puzzles_satisfy_every_compiled_constraint() {
        let puzzle = record(
            "simple-3x3",
            "3*3",
            "\
Colors: orange, blue, green.
Pets: cat, turtle, dog.

Clues:
1. Alice lives in house 3.
2. House 1 is painted orange.
3. The orange house contains the turtle.
4. Mallory lives in the blue house.
5. The green house contains the dog.
",
        );
        let csp = parse_puzzle(&puzzle).unwrap();
        let solution = solver::solve(&csp);
        assert!(!solution.is_empty());
        for constraint in &csp.constraints {
            assert!(
                constraint.is_satisfied(&solution),
                "violated: {}",
                constraint.description
            );
        }

        // Each category's values form a permutation of its declared set.
        for category in ["Color", "Pet", "Name"] {
            let mut values: Vec<&str> = (1..=3)
                .map(|i| solution[&model::house_var(i, category)].as_str())
                .collect();
            values.sort_unstable();
            values.dedup();
            assert_eq!(values.len(), 3, "{category} values are not distinct");
        }
    }

    #[test]
    fn trivial_2x2_links_red_to_dog() {
        let puzzle = record(
            "trivial-2x2",
            "2*2",
            "\
Colors: Red, Blue.
Pets: Dog, Cat.

Clues:
1. The Red house contains the Dog.
",
        );
        let solution = solve_puzzle(&puzzle).unwrap();
        assert!(!solution.is_empty());

        // House ordering is not pinned; only the biconditional must hold.
        let red_house = position_of(&solution, "Color", "Red", 2);
        let dog_house = position_of(&solution, "Pet", "Dog", 2);
        assert_eq!(red_house, dog_house);
        let blue_house = position_of(&solution, "Color", "Blue", 2);
        let cat_house = position_of(&solution, "Pet", "Cat", 2);
        assert_eq!(blue_house, cat_house);
    }

    #[test]
    fn immediate_left_clue_pins_adjacent_positions() {
        let puzzle = record(
            "imm-left",
            "3*1",
            "\
Colors: red, blue, green.

Clues:
1. The red house is immediately to the left of the blue house.
",
        );
        let solution = solve_puzzle(&puzzle).unwrap();
        assert!(!solution.is_empty());
        let red = position_of(&solution, "Color", "red", 3);
        let blue = position_of(&solution, "Color", "blue", 3);
        assert_eq!(red + 1, blue);
    }

    #[test]
    fn houses_between_clue_fixes_the_distance() {
        let puzzle = record(
            "distance",
            "5*2",
            "\
Names: Alice, Bob, Carol, Dave, Erin.
Pets: dog, cat, turtle, fish, bird.

Clues:
1. There are two houses between Alice and the dog.
",
        );
        let solution = solve_puzzle(&puzzle).unwrap();
        assert!(!solution.is_empty());
        let alice = position_of(&solution, "Name", "Alice", 5);
        let dog = position_of(&solution, "Pet", "dog", 5);
        assert_eq!(alice.abs_diff(dog), 3);
    }

    #[test]
    fn compiling_then_solving_matches_solve_puzzle() {
        let puzzle = record(
            "roundtrip",
            "3*3",
            "\
Colors: orange, blue, green.
Pets: cat, turtle, dog.

Clues:
1. House 1 is painted orange.
2. The green house contains the dog.
",
        );
        let csp = parse_puzzle(&puzzle).unwrap();
        let direct = solver::solve_with(&csp, &mut Tracer::new(false));
        let via_record = solve_puzzle(&puzzle).unwrap();
        assert_eq!(direct, via_record);
    }
}
