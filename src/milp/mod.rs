//! Exact assignment solving via mixed-integer programming.
//!
//! Formulates the roster as one binary decision variable per eligible
//! (student, slot) pair and delegates to a MILP backend through `good_lp`,
//! so any compliant solver satisfies the contract. Forbidden (`Cannot`)
//! pairs get no variable at all, the omission encoding of "fixed to 0".
//!
//! Two policies, selected by [`SolverMode`]:
//!
//! - **Strict**: `Must` pairs and both minimum bounds are hard constraints;
//!   a jointly infeasible set yields [`SolveError::Infeasible`] and no
//!   partial roster.
//! - **Soft**: integer slack absorbs minimum-bound shortfall and `Must`
//!   satisfaction is a heavily weighted objective term; the solve always
//!   returns a best-effort optimum whose shortfalls surface as violations
//!   on the roster.
//!
//! # Reference
//! Wolsey (2020), "Integer Programming", Ch. 1 (assignment formulations)

use std::collections::HashMap;
use std::time::{Duration, Instant};

use good_lp::{
    constraint, default_solver, variable, variables, Expression, ResolutionError, Solution,
    SolverModel, Variable,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{
    AvailabilityLabel, AvailabilityMatrix, CapacityPolicy, PolicyError, Roster, RosterEntry,
    SolverMode, Violation,
};

/// Weight making one honored `Must` outweigh any amount of slack.
const MUST_WEIGHT: f64 = 1_000_000.0;
/// Penalty per unit of minimum-bound shortfall.
const SLACK_PENALTY: f64 = 1_000.0;
/// Tertiary cost per assignment, against gratuitous over-assignment.
const ASSIGNMENT_COST: f64 = 0.01;

/// Backend verdict for a usable roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Proven optimal for the configured objective.
    Optimal,
    /// Valid but possibly suboptimal (backend stopped early).
    Feasible,
}

/// A usable solve result.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// The assignment, with soft-mode shortfalls reported as violations.
    pub roster: Roster,
    /// Backend verdict.
    pub status: SolveStatus,
    /// Objective value at the returned solution.
    pub objective: f64,
}

/// A run that produced no roster.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The policy was inconsistent before solving started.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// No assignment satisfies the hard constraints (strict mode).
    #[error("no assignment satisfies the hard constraints")]
    Infeasible,
    /// The backend exceeded the configured time limit.
    #[error("solver exceeded the {limit:?} time limit (ran {elapsed:?})")]
    TimedOut {
        /// Configured limit.
        limit: Duration,
        /// Observed solve duration.
        elapsed: Duration,
    },
    /// The backend failed for another reason.
    #[error("solver backend error: {0}")]
    Backend(String),
}

/// Exact roster solver.
///
/// # Example
///
/// ```
/// use duty_roster::milp::MilpScheduler;
/// use duty_roster::models::{
///     AvailabilityLabel, AvailabilityMatrixBuilder, CapacityPolicy, Slot, SolverMode, Weekday,
/// };
///
/// let mon9 = Slot::new(Weekday::Monday, 9);
/// let mut builder = AvailabilityMatrixBuilder::new();
/// builder.set("alice", mon9, AvailabilityLabel::Must);
/// builder.student("bob");
/// let matrix = builder.build();
///
/// let policy = CapacityPolicy::new()
///     .with_slot_staff(1, 2)
///     .with_student_hours(0, 2)
///     .with_solver_mode(SolverMode::Strict);
/// let outcome = MilpScheduler::new().solve(&matrix, &policy).unwrap();
/// assert!(outcome.roster.contains("alice", mon9));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MilpScheduler {
    timeout: Option<Duration>,
}

impl MilpScheduler {
    /// Creates a solver with no time limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a time limit for the blocking solve call.
    ///
    /// The bundled backend cannot be interrupted mid-search; elapsed time is
    /// checked against the limit once the call returns, and an overrun maps
    /// to [`SolveError::TimedOut`] so callers can tell it apart from proven
    /// infeasibility.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Solves the assignment problem for the policy's [`SolverMode`].
    pub fn solve(
        &self,
        matrix: &AvailabilityMatrix,
        policy: &CapacityPolicy,
    ) -> Result<SolveOutcome, SolveError> {
        policy.validate(matrix)?;

        let students = matrix.students();
        let slots = matrix.slots();
        let strict = policy.solver_mode == SolverMode::Strict;

        let mut vars = variables!();

        // One binary variable per eligible pair; Cannot pairs are omitted.
        let mut assign: HashMap<(usize, usize), Variable> = HashMap::new();
        let mut must_pairs: Vec<(usize, usize)> = Vec::new();
        for (i, student) in students.iter().enumerate() {
            for (j, &slot) in slots.iter().enumerate() {
                match matrix.label(student, slot) {
                    AvailabilityLabel::Cannot => {}
                    label => {
                        assign.insert((i, j), vars.add(variable().binary()));
                        if label == AvailabilityLabel::Must {
                            must_pairs.push((i, j));
                        }
                    }
                }
            }
        }

        // Soft mode: integer slack absorbing minimum-bound shortfall.
        let mut student_slack: Vec<Option<Variable>> = vec![None; students.len()];
        let mut slot_slack: Vec<Option<Variable>> = vec![None; slots.len()];
        if !strict {
            for slack in student_slack.iter_mut() {
                *slack = Some(vars.add(
                    variable()
                        .integer()
                        .min(0)
                        .max(f64::from(policy.student_min_hours)),
                ));
            }
            for slack in slot_slack.iter_mut() {
                *slack = Some(vars.add(
                    variable()
                        .integer()
                        .min(0)
                        .max(f64::from(policy.slot_min_staff)),
                ));
            }
        }

        let objective = self.build_objective(&assign, &must_pairs, &student_slack, &slot_slack, strict);
        info!(
            variables = assign.len(),
            musts = must_pairs.len(),
            strict,
            "built assignment model"
        );

        let mut model = vars.minimise(objective.clone()).using(default_solver);

        // Per-slot staffing bounds.
        for (j, _) in slots.iter().enumerate() {
            let staffed = (0..students.len())
                .filter_map(|i| assign.get(&(i, j)))
                .fold(Expression::from(0.0), |acc, &v| acc + v);
            model = model.with(constraint!(
                staffed.clone() <= f64::from(policy.slot_max_staff)
            ));
            if strict {
                model = model.with(constraint!(staffed >= f64::from(policy.slot_min_staff)));
            } else if let Some(slack) = slot_slack[j] {
                model = model.with(constraint!(
                    staffed + slack >= f64::from(policy.slot_min_staff)
                ));
            }
        }

        // Per-student workload bounds.
        for (i, _) in students.iter().enumerate() {
            let load = (0..slots.len())
                .filter_map(|j| assign.get(&(i, j)))
                .fold(Expression::from(0.0), |acc, &v| acc + v);
            model = model.with(constraint!(
                load.clone() <= f64::from(policy.student_max_hours)
            ));
            if strict {
                model = model.with(constraint!(load >= f64::from(policy.student_min_hours)));
            } else if let Some(slack) = student_slack[i] {
                model = model.with(constraint!(
                    load + slack >= f64::from(policy.student_min_hours)
                ));
            }
        }

        // Strict mode pins every Must pair.
        if strict {
            for &(i, j) in &must_pairs {
                model = model.with(constraint!(assign[&(i, j)] >= 1.0));
            }
        }

        let started = Instant::now();
        let solution = model.solve().map_err(|err| match err {
            ResolutionError::Infeasible => SolveError::Infeasible,
            other => SolveError::Backend(other.to_string()),
        })?;
        let elapsed = started.elapsed();
        if let Some(limit) = self.timeout {
            if elapsed > limit {
                return Err(SolveError::TimedOut { limit, elapsed });
            }
        }
        debug!(?elapsed, "solve call returned");

        let roster = self.decode(
            matrix,
            policy,
            &assign,
            &must_pairs,
            &student_slack,
            &slot_slack,
            &solution,
        );
        Ok(SolveOutcome {
            objective: solution.eval(objective),
            status: SolveStatus::Optimal,
            roster,
        })
    }

    fn build_objective(
        &self,
        assign: &HashMap<(usize, usize), Variable>,
        must_pairs: &[(usize, usize)],
        student_slack: &[Option<Variable>],
        slot_slack: &[Option<Variable>],
        strict: bool,
    ) -> Expression {
        // Strict: nothing left to optimize but compactness.
        let mut objective = assign
            .values()
            .fold(Expression::from(0.0), |acc, &v| acc + ASSIGNMENT_COST * v);
        if strict {
            return objective;
        }

        for key in must_pairs {
            objective = objective - MUST_WEIGHT * assign[key];
        }
        for slack in student_slack.iter().chain(slot_slack).flatten() {
            objective = objective + SLACK_PENALTY * *slack;
        }
        objective
    }

    /// Extracts the roster and, in soft mode, turns non-zero slack and
    /// unassigned `Must` pairs into violations.
    #[allow(clippy::too_many_arguments)]
    fn decode(
        &self,
        matrix: &AvailabilityMatrix,
        policy: &CapacityPolicy,
        assign: &HashMap<(usize, usize), Variable>,
        must_pairs: &[(usize, usize)],
        student_slack: &[Option<Variable>],
        slot_slack: &[Option<Variable>],
        solution: &impl Solution,
    ) -> Roster {
        let students = matrix.students();
        let slots = matrix.slots();
        let mut roster = Roster::new();

        for (i, student) in students.iter().enumerate() {
            for (j, &slot) in slots.iter().enumerate() {
                if let Some(&var) = assign.get(&(i, j)) {
                    if solution.value(var) > 0.5 {
                        roster.add_entry(RosterEntry::new(student, slot));
                    }
                }
            }
        }

        for &(i, j) in must_pairs {
            if solution.value(assign[&(i, j)]) < 0.5 {
                roster.add_violation(Violation::unmet_must(&students[i], slots[j]));
            }
        }
        for (i, slack) in student_slack.iter().enumerate() {
            if let Some(&var) = slack.as_ref() {
                let shortfall = solution.value(var).round() as i64;
                if shortfall > 0 {
                    let count = (policy.student_min_hours as i64 - shortfall).max(0) as usize;
                    roster.add_violation(Violation::student_underloaded(
                        &students[i],
                        count,
                        policy.student_min_hours,
                    ));
                }
            }
        }
        for (j, slack) in slot_slack.iter().enumerate() {
            if let Some(&var) = slack.as_ref() {
                let shortfall = solution.value(var).round() as i64;
                if shortfall > 0 {
                    let count = (policy.slot_min_staff as i64 - shortfall).max(0) as usize;
                    roster.add_violation(Violation::slot_understaffed(
                        slots[j],
                        count,
                        policy.slot_min_staff,
                    ));
                }
            }
        }

        roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityMatrixBuilder, Slot, ViolationKind, Weekday};
    use crate::validation::validate_roster;

    fn mon(hour: u8) -> Slot {
        Slot::new(Weekday::Monday, hour)
    }

    /// Scenario A: 3 students, 2 slots, A must take slot 1.
    fn scenario_a() -> (AvailabilityMatrix, CapacityPolicy) {
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.set("a", mon(9), AvailabilityLabel::Must);
        builder.student("b").student("c");
        builder.slots([mon(9), mon(10)]);
        let policy = CapacityPolicy::new()
            .with_slot_staff(1, 2)
            .with_student_hours(1, 2);
        (builder.build(), policy)
    }

    #[test]
    fn test_scenario_a_strict() {
        let (matrix, policy) = scenario_a();
        let policy = policy.with_solver_mode(SolverMode::Strict);
        let outcome = MilpScheduler::new().solve(&matrix, &policy).unwrap();
        assert!(outcome.roster.contains("a", mon(9)));
        assert!(outcome.roster.is_clean());
        let report = validate_roster(&outcome.roster, &matrix, &policy);
        assert!(report.is_clean(), "{report:?}");
    }

    #[test]
    fn test_scenario_a_soft() {
        let (matrix, policy) = scenario_a();
        let policy = policy.with_solver_mode(SolverMode::Soft);
        let outcome = MilpScheduler::new().solve(&matrix, &policy).unwrap();
        assert!(outcome.roster.contains("a", mon(9)));
        // Feasible fixture: no slack should be spent.
        assert!(outcome.roster.is_clean());
        assert!(validate_roster(&outcome.roster, &matrix, &policy).is_clean());
    }

    fn scenario_b() -> AvailabilityMatrix {
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.set("x", mon(9), AvailabilityLabel::Must);
        builder.set("y", mon(9), AvailabilityLabel::Must);
        builder.build()
    }

    #[test]
    fn test_scenario_b_strict_infeasible() {
        let policy = CapacityPolicy::new()
            .with_slot_staff(1, 1)
            .with_student_hours(0, 1)
            .with_solver_mode(SolverMode::Strict);
        let err = MilpScheduler::new()
            .solve(&scenario_b(), &policy)
            .unwrap_err();
        assert!(matches!(err, SolveError::Infeasible));
    }

    #[test]
    fn test_scenario_b_soft_best_effort() {
        let matrix = scenario_b();
        let policy = CapacityPolicy::new()
            .with_slot_staff(1, 1)
            .with_student_hours(0, 1)
            .with_solver_mode(SolverMode::Soft);
        let outcome = MilpScheduler::new().solve(&matrix, &policy).unwrap();
        assert_eq!(outcome.roster.entry_count(), 1);
        let unmet: Vec<_> = outcome
            .roster
            .violations
            .iter()
            .filter(|v| v.kind == ViolationKind::UnmetMust)
            .collect();
        assert_eq!(unmet.len(), 1);
    }

    #[test]
    fn test_scenario_c_cannot_excluded() {
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.set("x", mon(9), AvailabilityLabel::Cannot);
        builder.student("y");
        let matrix = builder.build();
        for mode in [SolverMode::Strict, SolverMode::Soft] {
            let policy = CapacityPolicy::new()
                .with_slot_staff(1, 2)
                .with_student_hours(0, 2)
                .with_solver_mode(mode);
            let outcome = MilpScheduler::new().solve(&matrix, &policy).unwrap();
            assert!(!outcome.roster.contains("x", mon(9)), "{mode:?}");
            assert!(outcome.roster.contains("y", mon(9)), "{mode:?}");
        }
    }

    #[test]
    fn test_soft_slack_reported_on_uncoverable_slot() {
        // One slot nobody may staff: soft mode spends slot slack and says so.
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.set("x", mon(9), AvailabilityLabel::Cannot);
        let matrix = builder.build();
        let policy = CapacityPolicy::new()
            .with_slot_staff(1, 2)
            .with_student_hours(0, 2)
            .with_solver_mode(SolverMode::Soft);
        let outcome = MilpScheduler::new().solve(&matrix, &policy).unwrap();
        assert_eq!(outcome.roster.entry_count(), 0);
        assert!(outcome
            .roster
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::SlotUnderstaffed));
    }

    #[test]
    fn test_strict_bounds_always_hold() {
        let mut builder = AvailabilityMatrixBuilder::new();
        for name in ["a", "b", "c", "d"] {
            builder.student(name);
        }
        builder.slots(Slot::block(Weekday::Monday, 9..12));
        let matrix = builder.build();
        let policy = CapacityPolicy::new()
            .with_slot_staff(1, 2)
            .with_student_hours(1, 2)
            .with_solver_mode(SolverMode::Strict);

        let outcome = MilpScheduler::new().solve(&matrix, &policy).unwrap();
        let by_slot = outcome.roster.by_slot();
        for &slot in matrix.slots() {
            let count = by_slot.get(&slot).map_or(0, Vec::len);
            assert!((1..=2).contains(&count), "{slot}: {count}");
        }
        for student in matrix.students() {
            let hours = outcome.roster.slots_for_student(student).len();
            assert!((1..=2).contains(&hours), "{student}: {hours}");
        }
        assert!(validate_roster(&outcome.roster, &matrix, &policy).is_clean());
    }

    #[test]
    fn test_strict_avoids_gratuitous_assignment() {
        // Minimums of zero: the compactness tie-break keeps the roster empty.
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.student("a");
        builder.slot(mon(9));
        let matrix = builder.build();
        let policy = CapacityPolicy::new()
            .with_slot_staff(0, 2)
            .with_student_hours(0, 2)
            .with_solver_mode(SolverMode::Strict);
        let outcome = MilpScheduler::new().solve(&matrix, &policy).unwrap();
        assert_eq!(outcome.roster.entry_count(), 0);
    }

    #[test]
    fn test_inconsistent_policy_rejected() {
        let (matrix, _) = scenario_a();
        let policy = CapacityPolicy::new().with_slot_staff(3, 1);
        let err = MilpScheduler::new().solve(&matrix, &policy).unwrap_err();
        assert!(matches!(err, SolveError::Policy(_)));
    }

    #[test]
    fn test_generous_timeout_does_not_trip() {
        let (matrix, policy) = scenario_a();
        let outcome = MilpScheduler::new()
            .with_timeout(Duration::from_secs(60))
            .solve(&matrix, &policy)
            .unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
    }

    #[test]
    fn test_matches_greedy_verdict_through_validator() {
        // Strategy-agnostic validation: both engines' outputs on the same
        // feasible fixture come back clean.
        use crate::scheduler::GreedyScheduler;
        let (matrix, policy) = scenario_a();
        let greedy = GreedyScheduler::new().schedule(&matrix, &policy).unwrap();
        let exact = MilpScheduler::new().solve(&matrix, &policy).unwrap().roster;
        assert!(validate_roster(&greedy, &matrix, &policy).is_clean());
        assert!(validate_roster(&exact, &matrix, &policy).is_clean());
    }
}
