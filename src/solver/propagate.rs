//! Constraint propagation: unary pruning, forward checking, and AC-3.

use std::collections::BTreeSet;

use im::OrdSet;

use crate::model::{Assignment, Constraint, Csp, DomainMap};
use crate::solver::work_list::ArcQueue;
use crate::trace::Tracer;

/// Prunes every variable's domain against its unary constraints. Returns
/// `false` when a domain empties.
pub(crate) fn apply_unary(csp: &Csp, domains: &mut DomainMap, tracer: &mut Tracer) -> bool {
    for name in &csp.variable_names {
        let unary: Vec<&Constraint> = csp
            .constraints_for(name)
            .filter(|c| c.scope.len() == 1)
            .collect();
        if unary.is_empty() {
            continue;
        }
        let Some(domain) = domains.get(name) else {
            continue;
        };

        let mut kept = OrdSet::new();
        for value in domain.iter() {
            let mut probe = Assignment::new();
            probe.insert(name.clone(), value.clone());
            if unary.iter().all(|c| c.is_satisfied(&probe)) {
                kept.insert(value.clone());
            }
        }

        if kept.len() < domain.len() {
            tracer.log_domain_reduction(name, kept.len(), "unary constraint");
            let wiped = kept.is_empty();
            domains.insert(name.clone(), kept);
            if wiped {
                return false;
            }
        }
    }
    true
}

/// Prunes the domains of `variable`'s unassigned neighbors against the
/// constraints they share with it, under the current assignment. Returns
/// `false` when a neighbor's domain empties.
pub(crate) fn forward_check(
    csp: &Csp,
    variable: &str,
    assignment: &Assignment,
    domains: &mut DomainMap,
    tracer: &mut Tracer,
) -> bool {
    let mut pruned_total = 0;
    let mut wiped = false;

    for neighbor in csp.neighbors_of(variable) {
        if assignment.contains_key(neighbor) {
            continue;
        }
        let shared = csp.constraints_between(variable, neighbor);
        if shared.is_empty() {
            continue;
        }
        let Some(domain) = domains.get(neighbor) else {
            continue;
        };

        let mut kept = OrdSet::new();
        let mut probe = assignment.clone();
        for value in domain.iter() {
            probe.insert(neighbor.to_string(), value.clone());
            if shared.iter().all(|c| c.is_satisfied(&probe)) {
                kept.insert(value.clone());
            }
        }

        if kept.len() < domain.len() {
            pruned_total += domain.len() - kept.len();
            tracer.log_domain_reduction(neighbor, kept.len(), "forward check");
            wiped = kept.is_empty();
            domains.insert(neighbor.to_string(), kept);
            if wiped {
                break;
            }
        }
    }

    tracer.log_forward_check(variable, pruned_total);
    !wiped
}

/// For the arc `(xi, xj)`: removes values of `xi` with no supporting value in
/// `xj` under the constraints the pair shares, over the outer assignment
/// augmented with the candidate pair. Returns `true` when anything was
/// removed.
fn revise(csp: &Csp, xi: &str, xj: &str, domains: &mut DomainMap, assignment: &Assignment) -> bool {
    let shared = csp.constraints_between(xi, xj);
    if shared.is_empty() {
        return false;
    }
    let (Some(di), Some(dj)) = (domains.get(xi), domains.get(xj)) else {
        return false;
    };

    let mut kept = OrdSet::new();
    let mut probe = assignment.clone();
    for a in di.iter() {
        probe.insert(xi.to_string(), a.clone());
        let supported = dj.iter().any(|b| {
            probe.insert(xj.to_string(), b.clone());
            shared.iter().all(|c| c.is_satisfied(&probe))
        });
        probe.remove(xj);
        if supported {
            kept.insert(a.clone());
        }
    }

    if kept.len() < di.len() {
        domains.insert(xi.to_string(), kept);
        true
    } else {
        false
    }
}

/// AC-3 over every directed arc of the CSP. Returns `false` when a domain
/// empties; logs one `ac3` trace event with the pass totals either way.
pub(crate) fn ac3(
    csp: &Csp,
    domains: &mut DomainMap,
    assignment: &Assignment,
    tracer: &mut Tracer,
) -> bool {
    let mut queue = ArcQueue::new();
    for name in &csp.variable_names {
        for neighbor in csp.neighbors_of(name) {
            queue.push_back(name, neighbor);
        }
    }

    let mut arcs_processed = 0;
    let mut affected: BTreeSet<String> = BTreeSet::new();

    while let Some((xi, xj)) = queue.pop_front() {
        arcs_processed += 1;
        if !revise(csp, &xi, &xj, domains, assignment) {
            continue;
        }

        affected.insert(xi.clone());
        let remaining = domains.get(&xi).map_or(0, |d| d.len());
        tracer.log_domain_reduction(&xi, remaining, "arc revision");
        if remaining == 0 {
            tracer.log_ac3_run(affected.len(), arcs_processed);
            return false;
        }
        for xk in csp.neighbors_of(&xi) {
            if xk != xj {
                queue.push_back(xk, &xi);
            }
        }
    }

    tracer.log_ac3_run(affected.len(), arcs_processed);
    true
}
