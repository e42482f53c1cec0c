//! Solver engine: chronological backtracking augmented with unary
//! propagation, MRV variable ordering, forward checking, and AC-3 arc
//! consistency.
//!
//! Search never mutates the CSP. The canonical domains are copied at entry
//! and again at every recursion that prunes; the copies are persistent maps,
//! so a copy shares structure with its parent and dies with the stack frame
//! that created it.

mod propagate;
mod work_list;

use im::OrdSet;
use tracing::debug;

use crate::model::{Assignment, Csp, DomainMap};
use crate::trace::{self, Tracer};

/// Solves the CSP against the process-wide tracer.
///
/// Returns a total assignment when satisfiable and an empty assignment when
/// propagation or search proves there is none.
pub fn solve(csp: &Csp) -> Assignment {
    let mut tracer = trace::global_tracer();
    solve_with(csp, &mut tracer)
}

/// Solves the CSP, logging into the supplied tracer.
pub fn solve_with(csp: &Csp, tracer: &mut Tracer) -> Assignment {
    let mut domains = csp.copy_domains();

    if !propagate::apply_unary(csp, &mut domains, tracer) {
        debug!("unary propagation wiped out a domain");
        return Assignment::new();
    }
    if !propagate::ac3(csp, &mut domains, &Assignment::new(), tracer) {
        debug!("initial arc consistency proved the problem unsatisfiable");
        return Assignment::new();
    }

    let mut assignment = Assignment::new();
    backtrack(csp, &mut assignment, &domains, tracer).unwrap_or_default()
}

/// MRV selection: the unassigned variable with the smallest current domain,
/// ties broken by lexicographic name.
fn select_unassigned_variable<'a>(
    csp: &'a Csp,
    assignment: &Assignment,
    domains: &DomainMap,
) -> Option<&'a String> {
    csp.variable_names
        .iter()
        .filter(|name| !assignment.contains_key(*name))
        .min_by_key(|name| {
            (
                domains.get(*name).map_or(usize::MAX, |d| d.len()),
                (*name).clone(),
            )
        })
}

fn backtrack(
    csp: &Csp,
    assignment: &mut Assignment,
    domains: &DomainMap,
    tracer: &mut Tracer,
) -> Option<Assignment> {
    if assignment.len() == csp.num_variables() {
        if csp.is_consistent(assignment) {
            tracer.log_solution_found(assignment.len());
            return Some(assignment.clone());
        }
        return None;
    }

    let variable = select_unassigned_variable(csp, assignment, domains)?.clone();
    let domain_size = domains.get(&variable).map_or(0, |d| d.len());
    // OrdSet iterates in lexicographic order, which is the value order.
    let candidates: Vec<String> = domains
        .get(&variable)
        .map(|d| d.iter().cloned().collect())
        .unwrap_or_default();

    for value in candidates {
        assignment.insert(variable.clone(), value.clone());
        if let Some(violated) = csp
            .constraints_for(&variable)
            .find(|c| !c.is_satisfied(assignment))
        {
            tracer.log_constraint_check(&violated.description, false, Some(&variable));
            assignment.remove(&variable);
            continue;
        }

        tracer.log_assign(&variable, &value, domain_size, assignment.len());

        let mut local = domains.clone();
        local.insert(variable.clone(), OrdSet::unit(value.clone()));

        if propagate::forward_check(csp, &variable, assignment, &mut local, tracer)
            && propagate::ac3(csp, &mut local, assignment, tracer)
        {
            if let Some(solution) = backtrack(csp, assignment, &local, tracer) {
                return Some(solution);
            }
        }

        assignment.remove(&variable);
    }

    tracer.log_backtrack(&variable, "no valid values");
    None
}
