//! Multi-phase greedy priority scheduler.
//!
//! # Algorithm
//!
//! 1. **Forced assignment** — honor `Must` labels, student input order,
//!    each student's `Must` slots in seeded-random order.
//! 2. **Coverage** — one student for every still-empty slot before any slot
//!    gets a second, slots in canonical order.
//! 3. **Fill-to-capacity** — top up the remaining slots to `slot_max_staff`.
//!
//! Phases 2 and 3 both select the eligible candidate with the fewest
//! assigned hours, breaking ties uniformly at random. All randomness comes
//! from one explicitly seeded RNG, so a (matrix, policy, seed) triple always
//! reproduces the same roster.
//!
//! Lightly covering every slot beats fully staffing a few while leaving
//! others empty, so coverage runs to completion before any double-staffing.

use std::collections::HashMap;

use rand::prelude::IndexedRandom;
use rand::seq::SliceRandom;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::models::{
    AvailabilityLabel, AvailabilityMatrix, CapacityPolicy, PolicyError, Roster, RosterEntry,
    Slot, Violation,
};

/// Working tallies of one scheduling run. Created per invocation, never
/// escapes it.
struct ScheduleState<'a> {
    by_slot: HashMap<Slot, Vec<&'a str>>,
    hours: HashMap<&'a str, u32>,
}

impl<'a> ScheduleState<'a> {
    fn new(slots: &[Slot]) -> Self {
        Self {
            by_slot: slots.iter().map(|&slot| (slot, Vec::new())).collect(),
            hours: HashMap::new(),
        }
    }

    fn slot_count(&self, slot: Slot) -> usize {
        self.by_slot.get(&slot).map_or(0, Vec::len)
    }

    fn hours_of(&self, student: &str) -> u32 {
        self.hours.get(student).copied().unwrap_or(0)
    }

    fn is_assigned(&self, student: &str, slot: Slot) -> bool {
        self.by_slot
            .get(&slot)
            .is_some_and(|assigned| assigned.contains(&student))
    }

    fn commit(&mut self, student: &'a str, slot: Slot, roster: &mut Roster) {
        self.by_slot.entry(slot).or_default().push(student);
        *self.hours.entry(student).or_insert(0) += 1;
        roster.add_entry(RosterEntry::new(student, slot));
    }
}

/// Multi-phase greedy priority scheduler.
///
/// Always produces a best-effort roster; `Must` obligations that cannot be
/// honored (slot full, student at maximum workload) are reported as
/// [`crate::models::ViolationKind::UnmetMust`] violations on the roster
/// rather than failing the run.
///
/// # Example
///
/// ```
/// use duty_roster::models::{
///     AvailabilityLabel, AvailabilityMatrixBuilder, CapacityPolicy, Slot, Weekday,
/// };
/// use duty_roster::scheduler::GreedyScheduler;
///
/// let mon9 = Slot::new(Weekday::Monday, 9);
/// let mut builder = AvailabilityMatrixBuilder::new();
/// builder.set("alice", mon9, AvailabilityLabel::Must);
/// builder.student("bob");
/// let matrix = builder.build();
///
/// let policy = CapacityPolicy::new()
///     .with_slot_staff(1, 2)
///     .with_student_hours(0, 2);
/// let roster = GreedyScheduler::new().schedule(&matrix, &policy).unwrap();
/// assert!(roster.contains("alice", mon9));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GreedyScheduler;

impl GreedyScheduler {
    /// Creates a scheduler.
    pub fn new() -> Self {
        Self
    }

    /// Runs the three phases with an RNG seeded from `policy.random_seed`.
    ///
    /// Rejects inconsistent policies eagerly; otherwise never fails.
    pub fn schedule(
        &self,
        matrix: &AvailabilityMatrix,
        policy: &CapacityPolicy,
    ) -> Result<Roster, PolicyError> {
        policy.validate(matrix)?;
        let mut rng = SmallRng::seed_from_u64(policy.random_seed);
        Ok(self.schedule_with_rng(matrix, policy, &mut rng))
    }

    /// Runs the three phases with a caller-provided RNG.
    pub fn schedule_with_rng<R: Rng>(
        &self,
        matrix: &AvailabilityMatrix,
        policy: &CapacityPolicy,
        rng: &mut R,
    ) -> Roster {
        let mut roster = Roster::new();
        let mut state = ScheduleState::new(matrix.slots());

        self.assign_forced(matrix, policy, rng, &mut state, &mut roster);
        self.assign_coverage(matrix, policy, rng, &mut state, &mut roster);
        self.fill_to_capacity(matrix, policy, rng, &mut state, &mut roster);

        debug!(
            entries = roster.entry_count(),
            unmet = roster.violations.len(),
            "greedy run complete"
        );
        roster
    }

    /// Phase 1: commit `Must` pairs while slot and workload limits allow.
    fn assign_forced<'a, R: Rng>(
        &self,
        matrix: &'a AvailabilityMatrix,
        policy: &CapacityPolicy,
        rng: &mut R,
        state: &mut ScheduleState<'a>,
        roster: &mut Roster,
    ) {
        for student in matrix.students() {
            // Canonical order first so the seeded shuffle is reproducible.
            let mut must_slots = matrix.must_slots(student);
            must_slots.shuffle(rng);

            for slot in must_slots {
                let slot_full = state.slot_count(slot) >= policy.slot_max_staff as usize;
                let student_full = state.hours_of(student) >= policy.student_max_hours;

                if slot_full || student_full {
                    roster.add_violation(Violation::unmet_must(student, slot));
                } else {
                    state.commit(student, slot, roster);
                }
            }
        }
        debug!(entries = roster.entry_count(), "forced assignment phase done");
    }

    /// Phase 2: one student for every still-empty slot, canonical order.
    fn assign_coverage<'a, R: Rng>(
        &self,
        matrix: &'a AvailabilityMatrix,
        policy: &CapacityPolicy,
        rng: &mut R,
        state: &mut ScheduleState<'a>,
        roster: &mut Roster,
    ) {
        if policy.slot_max_staff == 0 {
            return;
        }
        for &slot in matrix.slots() {
            if state.slot_count(slot) > 0 {
                continue;
            }
            if let Some(student) = self.pick_candidate(matrix, policy, rng, state, slot) {
                state.commit(student, slot, roster);
            }
        }
        debug!(entries = roster.entry_count(), "coverage phase done");
    }

    /// Phase 3: top up every slot below `slot_max_staff`, canonical order.
    fn fill_to_capacity<'a, R: Rng>(
        &self,
        matrix: &'a AvailabilityMatrix,
        policy: &CapacityPolicy,
        rng: &mut R,
        state: &mut ScheduleState<'a>,
        roster: &mut Roster,
    ) {
        for &slot in matrix.slots() {
            while state.slot_count(slot) < policy.slot_max_staff as usize {
                match self.pick_candidate(matrix, policy, rng, state, slot) {
                    Some(student) => state.commit(student, slot, roster),
                    None => break,
                }
            }
        }
        debug!(entries = roster.entry_count(), "fill phase done");
    }

    /// Fewest-hours-first selection among students labeled `Ok` for the
    /// slot, under their workload limit, and not already assigned to it.
    /// Ties are broken uniformly at random.
    fn pick_candidate<'a, R: Rng>(
        &self,
        matrix: &'a AvailabilityMatrix,
        policy: &CapacityPolicy,
        rng: &mut R,
        state: &ScheduleState<'a>,
        slot: Slot,
    ) -> Option<&'a str> {
        let mut best_hours = u32::MAX;
        let mut best: Vec<&'a str> = Vec::new();

        for student in matrix.students() {
            if matrix.label(student, slot) != AvailabilityLabel::Ok {
                continue;
            }
            let hours = state.hours_of(student);
            if hours >= policy.student_max_hours || state.is_assigned(student, slot) {
                continue;
            }
            match hours.cmp(&best_hours) {
                std::cmp::Ordering::Less => {
                    best_hours = hours;
                    best.clear();
                    best.push(student);
                }
                std::cmp::Ordering::Equal => best.push(student),
                std::cmp::Ordering::Greater => {}
            }
        }

        best.choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityMatrixBuilder, ViolationKind, Weekday};
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
    fn test_scenario_a_must_honored() {
        let (matrix, policy) = scenario_a();
        for seed in [0, 1, 42] {
            let roster = GreedyScheduler::new()
                .schedule(&matrix, &policy.clone().with_seed(seed))
                .unwrap();
            assert!(roster.contains("a", mon(9)), "seed {seed}");
            assert!(roster.is_clean(), "seed {seed}");
        }
    }

    #[test]
    fn test_scenario_b_forced_conflict() {
        // One slot, capacity 1, two students both MUST it.
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.set("x", mon(9), AvailabilityLabel::Must);
        builder.set("y", mon(9), AvailabilityLabel::Must);
        let matrix = builder.build();
        let policy = CapacityPolicy::new()
            .with_slot_staff(1, 1)
            .with_student_hours(0, 1);

        let roster = GreedyScheduler::new().schedule(&matrix, &policy).unwrap();
        assert_eq!(roster.entry_count(), 1);
        assert_eq!(roster.students_for_slot(mon(9)).len(), 1);
        let unmet: Vec<_> = roster
            .violations
            .iter()
            .filter(|v| v.kind == ViolationKind::UnmetMust)
            .collect();
        assert_eq!(unmet.len(), 1);
    }

    #[test]
    fn test_scenario_c_cannot_excluded() {
        // The only open slot is forbidden for x; x stays unassigned even
        // though that leaves a workload shortfall.
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.set("x", mon(9), AvailabilityLabel::Cannot);
        builder.student("y");
        let matrix = builder.build();
        let policy = CapacityPolicy::new()
            .with_slot_staff(1, 2)
            .with_student_hours(1, 2);

        for seed in 0..5 {
            let roster = GreedyScheduler::new()
                .schedule(&matrix, &policy.clone().with_seed(seed))
                .unwrap();
            assert!(!roster.contains("x", mon(9)), "seed {seed}");
            assert!(roster.contains("y", mon(9)), "seed {seed}");
        }
    }

    #[test]
    fn test_determinism_same_seed() {
        let mut builder = AvailabilityMatrixBuilder::new();
        for name in ["a", "b", "c", "d", "e"] {
            builder.student(name);
        }
        builder.set("a", mon(12), AvailabilityLabel::Must);
        builder.set("b", mon(12), AvailabilityLabel::Must);
        builder.slots(Slot::block(Weekday::Monday, 9..15));
        builder.slots(Slot::block(Weekday::Tuesday, 9..12));
        let matrix = builder.build();
        let policy = CapacityPolicy::new()
            .with_slot_staff(0, 2)
            .with_student_hours(0, 4)
            .with_seed(1234);

        let scheduler = GreedyScheduler::new();
        let first = scheduler.schedule(&matrix, &policy).unwrap();
        let second = scheduler.schedule(&matrix, &policy).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sole_candidate_assigned_regardless_of_seed() {
        // Only one eligible student: every seed must pick them.
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.student("only");
        builder.set("other", mon(9), AvailabilityLabel::Cannot);
        let matrix = builder.build();
        let policy = CapacityPolicy::new()
            .with_slot_staff(1, 1)
            .with_student_hours(0, 1);

        for seed in 0..10 {
            let roster = GreedyScheduler::new()
                .schedule(&matrix, &policy.clone().with_seed(seed))
                .unwrap();
            assert!(roster.contains("only", mon(9)), "seed {seed}");
        }
    }

    #[test]
    fn test_coverage_before_double_staffing() {
        // 2 students × 1 hour each, 2 slots: both slots must get exactly
        // one student, never one slot both.
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.student("a").student("b");
        builder.slots([mon(9), mon(10)]);
        let matrix = builder.build();
        let policy = CapacityPolicy::new()
            .with_slot_staff(0, 2)
            .with_student_hours(0, 1);

        for seed in 0..10 {
            let roster = GreedyScheduler::new()
                .schedule(&matrix, &policy.clone().with_seed(seed))
                .unwrap();
            assert_eq!(roster.students_for_slot(mon(9)).len(), 1, "seed {seed}");
            assert_eq!(roster.students_for_slot(mon(10)).len(), 1, "seed {seed}");
        }
    }

    #[test]
    fn test_workload_limit_respected() {
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.student("a");
        builder.slots(Slot::block(Weekday::Monday, 9..15));
        let matrix = builder.build();
        let policy = CapacityPolicy::new()
            .with_slot_staff(0, 1)
            .with_student_hours(0, 2);

        let roster = GreedyScheduler::new().schedule(&matrix, &policy).unwrap();
        assert_eq!(roster.slots_for_student("a").len(), 2);
    }

    #[test]
    fn test_must_beyond_workload_reported() {
        // Three MUSTs but a 2-hour cap: exactly one is left unmet.
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.set("a", mon(9), AvailabilityLabel::Must);
        builder.set("a", mon(10), AvailabilityLabel::Must);
        builder.set("a", mon(11), AvailabilityLabel::Must);
        let matrix = builder.build();
        let policy = CapacityPolicy::new()
            .with_slot_staff(0, 1)
            .with_student_hours(0, 2);

        let roster = GreedyScheduler::new().schedule(&matrix, &policy).unwrap();
        assert_eq!(roster.entry_count(), 2);
        assert_eq!(roster.violations.len(), 1);
        assert_eq!(roster.violations[0].kind, ViolationKind::UnmetMust);
    }

    #[test]
    fn test_slot_with_no_eligible_students_stays_empty() {
        let mut builder = AvailabilityMatrixBuilder::new();
        builder.set("a", mon(9), AvailabilityLabel::Cannot);
        builder.slot(mon(10));
        let matrix = builder.build();
        let policy = CapacityPolicy::new()
            .with_slot_staff(1, 2)
            .with_student_hours(0, 3);

        let roster = GreedyScheduler::new().schedule(&matrix, &policy).unwrap();
        assert!(roster.students_for_slot(mon(9)).is_empty());
        // Validator, not the scheduler, reports the shortfall.
        let report = validate_roster(&roster, &matrix, &policy);
        assert!(report
            .iter()
            .any(|v| v.kind == ViolationKind::SlotUnderstaffed));
    }

    #[test]
    fn test_inconsistent_policy_rejected() {
        let (matrix, _) = scenario_a();
        let policy = CapacityPolicy::new().with_student_hours(3, 1);
        assert!(GreedyScheduler::new().schedule(&matrix, &policy).is_err());
    }

    #[test]
    fn test_output_passes_validator() {
        let (matrix, policy) = scenario_a();
        let roster = GreedyScheduler::new().schedule(&matrix, &policy).unwrap();
        let report = validate_roster(&roster, &matrix, &policy);
        assert!(report.is_clean(), "{:?}", report);
    }
}
