//! Independent roster verification.
//!
//! Re-derives every invariant from a completed roster, regardless of which
//! strategy produced it:
//! - (student, slot) pair uniqueness
//! - no `Cannot` pair assigned
//! - every `Must` pair present (flagged, not fatal)
//! - per-slot staffing within bounds
//! - per-student workload within bounds
//! - entries referencing students/slots unknown to the matrix
//!
//! Pure function of its inputs: the roster's own violation list is ignored,
//! and validating twice yields an equal report.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::{
    AvailabilityLabel, AvailabilityMatrix, CapacityPolicy, Roster, Slot, Violation,
    ViolationKind,
};

/// Ordered list of violations found in one roster.
///
/// An empty report signals a fully compliant schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViolationReport {
    violations: Vec<Violation>,
}

impl ViolationReport {
    /// Whether no violations were found.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Whether the report is empty.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Iterates over the violations in detection order.
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    /// Violations of one kind.
    pub fn of_kind(&self, kind: ViolationKind) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.kind == kind).collect()
    }

    fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }
}

/// Validates a completed roster against the matrix and policy it was
/// scheduled from.
///
/// Strategy-agnostic: identical verdicts whether the roster came from the
/// greedy scheduler, the exact solver, or anywhere else. Entries whose
/// student or slot the matrix does not know are flagged and excluded from
/// the staffing and workload tallies.
pub fn validate_roster(
    roster: &Roster,
    matrix: &AvailabilityMatrix,
    policy: &CapacityPolicy,
) -> ViolationReport {
    let mut report = ViolationReport::default();

    let mut seen: HashSet<(&str, Slot)> = HashSet::new();
    let mut slot_counts: HashMap<Slot, usize> = HashMap::new();
    let mut student_counts: HashMap<&str, usize> = HashMap::new();

    for entry in &roster.entries {
        let student = entry.student.as_str();
        let slot = entry.slot;

        if !seen.insert((student, slot)) {
            report.push(Violation::duplicate(student, slot));
            continue;
        }

        let known_student = matrix.contains_student(student);
        let known_slot = matrix.contains_slot(slot);
        if !known_student {
            report.push(Violation::unknown_student(student));
        }
        if !known_slot {
            report.push(Violation::unknown_slot(slot));
        }
        if !known_student || !known_slot {
            continue;
        }

        if matrix.label(student, slot) == AvailabilityLabel::Cannot {
            report.push(Violation::forbidden(student, slot));
        }

        *slot_counts.entry(slot).or_insert(0) += 1;
        *student_counts.entry(student).or_insert(0) += 1;
    }

    // Unhonored MUST pairs.
    for student in matrix.students() {
        for slot in matrix.must_slots(student) {
            if !seen.contains(&(student.as_str(), slot)) {
                report.push(Violation::unmet_must(student, slot));
            }
        }
    }

    // Per-slot staffing bounds.
    for &slot in matrix.slots() {
        let count = slot_counts.get(&slot).copied().unwrap_or(0);
        if count < policy.slot_min_staff as usize {
            report.push(Violation::slot_understaffed(
                slot,
                count,
                policy.slot_min_staff,
            ));
        } else if count > policy.slot_max_staff as usize {
            report.push(Violation::slot_overstaffed(
                slot,
                count,
                policy.slot_max_staff,
            ));
        }
    }

    // Per-student workload bounds.
    for student in matrix.students() {
        let count = student_counts.get(student.as_str()).copied().unwrap_or(0);
        if count < policy.student_min_hours as usize {
            report.push(Violation::student_underloaded(
                student,
                count,
                policy.student_min_hours,
            ));
        } else if count > policy.student_max_hours as usize {
            report.push(Violation::student_overloaded(
                student,
                count,
                policy.student_max_hours,
            ));
        }
    }

    report
}
