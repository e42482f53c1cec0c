//! Solver observability: an in-memory event log with structured step records
//! and aggregate counters.
//!
//! The [`Tracer`] is threaded through the solver by mutable reference so tests
//! can swap in a local instance; a process-wide instance behind
//! [`global_tracer`] remains as an ergonomic facade for callers that solve one
//! puzzle at a time. Callers must [`reset_tracer`] between puzzles to avoid
//! bleed-over.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::error::Result;

/// The kind of solver event a [`TraceStep`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionType {
    Assign,
    Backtrack,
    ConstraintCheck,
    DomainReduced,
    Ac3,
    ForwardCheck,
    SolutionFound,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Assign => "assign",
            ActionType::Backtrack => "backtrack",
            ActionType::ConstraintCheck => "constraint_check",
            ActionType::DomainReduced => "domain_reduced",
            ActionType::Ac3 => "ac3",
            ActionType::ForwardCheck => "forward_check",
            ActionType::SolutionFound => "solution_found",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single step in the solving process.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceStep {
    /// Elapsed seconds since the tracer was created.
    pub timestamp: f64,
    /// Monotonic 1-based step index.
    pub step_number: u64,
    pub action_type: ActionType,
    pub variable: Option<String>,
    pub value: Option<String>,
    pub domain_size: Option<usize>,
    /// Number of variables assigned when the event fired.
    pub assignment_size: Option<usize>,
    pub constraint_checked: Option<String>,
    pub is_valid: Option<bool>,
    /// Why backtracking occurred, what a propagation pass pruned, etc.
    pub reason: Option<String>,
}

impl TraceStep {
    fn new(timestamp: f64, step_number: u64, action_type: ActionType) -> Self {
        Self {
            timestamp,
            step_number,
            action_type,
            variable: None,
            value: None,
            domain_size: None,
            assignment_size: None,
            constraint_checked: None,
            is_valid: None,
            reason: None,
        }
    }
}

/// Aggregate view of a trace, as returned by [`Tracer::summary`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TraceSummary {
    pub total_steps: usize,
    pub elapsed_time_seconds: f64,
    pub action_counts: BTreeMap<String, usize>,
    pub num_assignments: usize,
    pub num_backtracks: usize,
}

/// Records solver steps for logging and analysis.
///
/// When disabled, the `log_*` methods return before constructing any event,
/// so tracing can stay compiled in at negligible cost.
#[derive(Debug)]
pub struct Tracer {
    enabled: bool,
    steps: Vec<TraceStep>,
    started: Instant,
    step_counter: u64,
}

impl Tracer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            steps: Vec::new(),
            started: Instant::now(),
            step_counter: 0,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    fn begin_step(&mut self, action_type: ActionType) -> TraceStep {
        self.step_counter += 1;
        TraceStep::new(
            self.started.elapsed().as_secs_f64(),
            self.step_counter,
            action_type,
        )
    }

    /// Log a variable assignment.
    pub fn log_assign(
        &mut self,
        variable: &str,
        value: &str,
        domain_size: usize,
        assignment_size: usize,
    ) {
        if !self.enabled {
            return;
        }
        let mut step = self.begin_step(ActionType::Assign);
        step.variable = Some(variable.to_string());
        step.value = Some(value.to_string());
        step.domain_size = Some(domain_size);
        step.assignment_size = Some(assignment_size);
        self.steps.push(step);
    }

    /// Log a backtrack event.
    pub fn log_backtrack(&mut self, variable: &str, reason: &str) {
        if !self.enabled {
            return;
        }
        let mut step = self.begin_step(ActionType::Backtrack);
        step.variable = Some(variable.to_string());
        step.reason = Some(reason.to_string());
        self.steps.push(step);
    }

    /// Log a constraint check.
    pub fn log_constraint_check(
        &mut self,
        constraint_desc: &str,
        is_valid: bool,
        variable: Option<&str>,
    ) {
        if !self.enabled {
            return;
        }
        let mut step = self.begin_step(ActionType::ConstraintCheck);
        step.constraint_checked = Some(constraint_desc.to_string());
        step.is_valid = Some(is_valid);
        step.variable = variable.map(str::to_string);
        self.steps.push(step);
    }

    /// Log a domain reduction for a variable.
    pub fn log_domain_reduction(&mut self, variable: &str, new_domain_size: usize, reason: &str) {
        if !self.enabled {
            return;
        }
        let mut step = self.begin_step(ActionType::DomainReduced);
        step.variable = Some(variable.to_string());
        step.domain_size = Some(new_domain_size);
        step.reason = Some(reason.to_string());
        self.steps.push(step);
    }

    /// Log an AC-3 arc consistency pass.
    pub fn log_ac3_run(&mut self, variables_affected: usize, arcs_processed: usize) {
        if !self.enabled {
            return;
        }
        let mut step = self.begin_step(ActionType::Ac3);
        step.reason = Some(format!(
            "Affected {variables_affected} vars, processed {arcs_processed} arcs"
        ));
        self.steps.push(step);
    }

    /// Log a forward-checking pass rooted at `variable`.
    pub fn log_forward_check(&mut self, variable: &str, domains_pruned: usize) {
        if !self.enabled {
            return;
        }
        let mut step = self.begin_step(ActionType::ForwardCheck);
        step.variable = Some(variable.to_string());
        step.reason = Some(format!("Pruned {domains_pruned} values from other domains"));
        self.steps.push(step);
    }

    /// Log that a full assignment was found.
    pub fn log_solution_found(&mut self, assignment_size: usize) {
        if !self.enabled {
            return;
        }
        let mut step = self.begin_step(ActionType::SolutionFound);
        step.assignment_size = Some(assignment_size);
        self.steps.push(step);
    }

    /// Summarize the trace so far.
    pub fn summary(&self) -> TraceSummary {
        let mut action_counts: BTreeMap<String, usize> = BTreeMap::new();
        for step in &self.steps {
            *action_counts
                .entry(step.action_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        TraceSummary {
            total_steps: self.steps.len(),
            elapsed_time_seconds: self.started.elapsed().as_secs_f64(),
            num_assignments: action_counts.get("assign").copied().unwrap_or(0),
            num_backtracks: action_counts.get("backtrack").copied().unwrap_or(0),
            action_counts,
        }
    }

    /// Write the trace to a CSV file, one row per event, missing fields empty.
    ///
    /// Column order is fixed: `timestamp, step_number, action_type, variable,
    /// value, domain_size, assignment_size, constraint_checked, is_valid,
    /// reason`.
    pub fn to_csv(&self, path: &Path) -> Result<()> {
        if self.steps.is_empty() {
            tracing::warn!(path = %path.display(), "no trace steps to write");
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "timestamp",
            "step_number",
            "action_type",
            "variable",
            "value",
            "domain_size",
            "assignment_size",
            "constraint_checked",
            "is_valid",
            "reason",
        ])?;

        fn opt<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map(T::to_string).unwrap_or_default()
        }

        for step in &self.steps {
            writer.write_record([
                step.timestamp.to_string(),
                step.step_number.to_string(),
                step.action_type.to_string(),
                opt(&step.variable),
                opt(&step.value),
                opt(&step.domain_size),
                opt(&step.assignment_size),
                opt(&step.constraint_checked),
                opt(&step.is_valid),
                opt(&step.reason),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(true)
    }
}

static GLOBAL_TRACER: LazyLock<Mutex<Tracer>> = LazyLock::new(|| Mutex::new(Tracer::new(true)));

/// Lock the process-wide tracer.
pub fn global_tracer() -> MutexGuard<'static, Tracer> {
    GLOBAL_TRACER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Replace the process-wide tracer with a fresh, enabled one.
pub fn reset_tracer() {
    *global_tracer() = Tracer::new(true);
}

/// Enable or disable the process-wide tracer.
pub fn enable_tracing(enabled: bool) {
    global_tracer().set_enabled(enabled);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn tracer_captures_steps_in_order() {
        let mut tracer = Tracer::new(true);
        tracer.log_assign("House_1_Color", "Red", 5, 1);
        tracer.log_domain_reduction("House_2_Color", 4, "after constraint check");
        tracer.log_constraint_check(
            "AllDiff: House_1_Color, House_2_Color",
            true,
            Some("House_1_Color"),
        );
        tracer.log_ac3_run(3, 6);
        tracer.log_forward_check("House_1_Color", 2);
        tracer.log_backtrack("House_2_Food", "no valid values left");
        tracer.log_solution_found(5);

        let kinds: Vec<ActionType> = tracer.steps().iter().map(|s| s.action_type).collect();
        assert_eq!(
            kinds,
            vec![
                ActionType::Assign,
                ActionType::DomainReduced,
                ActionType::ConstraintCheck,
                ActionType::Ac3,
                ActionType::ForwardCheck,
                ActionType::Backtrack,
                ActionType::SolutionFound,
            ]
        );
        let numbers: Vec<u64> = tracer.steps().iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn summary_counts_actions() {
        let mut tracer = Tracer::new(true);
        tracer.log_assign("A", "1", 2, 1);
        tracer.log_assign("B", "2", 2, 2);
        tracer.log_backtrack("B", "dead end");
        tracer.log_solution_found(2);

        let summary = tracer.summary();
        assert_eq!(summary.total_steps, 4);
        assert_eq!(summary.num_assignments, 2);
        assert_eq!(summary.num_backtracks, 1);
        assert_eq!(summary.action_counts.get("assign"), Some(&2));
        assert_eq!(summary.action_counts.get("solution_found"), Some(&1));
    }

    #[test]
    fn disabled_tracer_records_nothing() {
        let mut tracer = Tracer::new(false);
        tracer.log_assign("A", "1", 2, 1);
        tracer.log_backtrack("A", "nope");
        assert!(tracer.steps().is_empty());
        assert_eq!(tracer.summary().total_steps, 0);
    }

    #[test]
    fn to_csv_writes_fixed_schema() {
        let mut tracer = Tracer::new(true);
        tracer.log_assign("House_1_Color", "Red", 5, 1);
        tracer.log_backtrack("House_2_Pet", "no valid values");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("trace.csv");
        tracer.to_csv(&path).expect("write trace");

        let content = std::fs::read_to_string(&path).expect("read trace");
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,step_number,action_type,variable,value,domain_size,\
             assignment_size,constraint_checked,is_valid,reason"
        );
        let first = lines.next().unwrap();
        assert!(first.contains("assign"));
        assert!(first.contains("House_1_Color"));
        let second = lines.next().unwrap();
        assert!(second.contains("backtrack"));
        assert!(second.contains("no valid values"));
    }
}
