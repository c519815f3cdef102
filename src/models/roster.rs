//! Roster (solution) model.
//!
//! A roster is the engine's only output artifact: the set of
//! (student, slot) assignments a strategy committed, together with the
//! violations that strategy itself reported (unmet `Must` obligations,
//! soft-mode shortfalls). Independent verification is the job of
//! [`crate::validation`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Slot;

/// One committed (student, slot) assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Assigned student identity.
    pub student: String,
    /// Assigned slot.
    pub slot: Slot,
}

impl RosterEntry {
    /// Creates an entry.
    pub fn new(student: impl Into<String>, slot: Slot) -> Self {
        Self {
            student: student.into(),
            slot,
        }
    }
}

/// A completed duty roster.
///
/// Entries are kept in commit order, which is deterministic for a given
/// matrix, policy, and seed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    /// Committed assignments.
    pub entries: Vec<RosterEntry>,
    /// Violations reported by the producing strategy.
    pub violations: Vec<Violation>,
}

/// A constraint violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Violation category.
    pub kind: ViolationKind,
    /// Offending entity (student identity or slot label).
    pub entity: String,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of roster violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// The same (student, slot) pair appears more than once.
    DuplicateAssignment,
    /// A `Cannot` pair was assigned.
    ForbiddenAssignment,
    /// A `Must` pair could not be honored.
    UnmetMust,
    /// A slot has fewer students than the minimum.
    SlotUnderstaffed,
    /// A slot has more students than the maximum.
    SlotOverstaffed,
    /// A student has fewer hours than the minimum.
    StudentUnderloaded,
    /// A student has more hours than the maximum.
    StudentOverloaded,
    /// An entry references a student the matrix does not know.
    UnknownStudent,
    /// An entry references a slot the matrix does not know.
    UnknownSlot,
}

impl Violation {
    fn new(kind: ViolationKind, entity: impl Into<String>, message: String, severity: i32) -> Self {
        Self {
            kind,
            entity: entity.into(),
            message,
            severity,
        }
    }

    /// A duplicated (student, slot) pair.
    pub fn duplicate(student: &str, slot: Slot) -> Self {
        Self::new(
            ViolationKind::DuplicateAssignment,
            student,
            format!("'{student}' assigned to {slot} more than once"),
            95,
        )
    }

    /// An assignment that contradicts a `Cannot` label.
    pub fn forbidden(student: &str, slot: Slot) -> Self {
        Self::new(
            ViolationKind::ForbiddenAssignment,
            student,
            format!("'{student}' assigned to {slot} despite CANNOT"),
            95,
        )
    }

    /// An unhonored `Must` label.
    pub fn unmet_must(student: &str, slot: Slot) -> Self {
        Self::new(
            ViolationKind::UnmetMust,
            student,
            format!("'{student}' holds MUST for {slot} but was not assigned"),
            70,
        )
    }

    /// A slot below its minimum staffing.
    pub fn slot_understaffed(slot: Slot, count: usize, min: u32) -> Self {
        Self::new(
            ViolationKind::SlotUnderstaffed,
            slot.to_string(),
            format!("{slot} staffed by {count}, minimum is {min}"),
            50,
        )
    }

    /// A slot above its maximum staffing.
    pub fn slot_overstaffed(slot: Slot, count: usize, max: u32) -> Self {
        Self::new(
            ViolationKind::SlotOverstaffed,
            slot.to_string(),
            format!("{slot} staffed by {count}, maximum is {max}"),
            90,
        )
    }

    /// A student below their minimum workload.
    pub fn student_underloaded(student: &str, count: usize, min: u32) -> Self {
        Self::new(
            ViolationKind::StudentUnderloaded,
            student,
            format!("'{student}' assigned {count} hours, minimum is {min}"),
            50,
        )
    }

    /// A student above their maximum workload.
    pub fn student_overloaded(student: &str, count: usize, max: u32) -> Self {
        Self::new(
            ViolationKind::StudentOverloaded,
            student,
            format!("'{student}' assigned {count} hours, maximum is {max}"),
            90,
        )
    }

    /// An entry whose student the matrix does not know.
    pub fn unknown_student(student: &str) -> Self {
        Self::new(
            ViolationKind::UnknownStudent,
            student,
            format!("'{student}' is not part of the availability matrix"),
            60,
        )
    }

    /// An entry whose slot the matrix does not know.
    pub fn unknown_slot(slot: Slot) -> Self {
        Self::new(
            ViolationKind::UnknownSlot,
            slot.to_string(),
            format!("{slot} is not part of the availability matrix"),
            60,
        )
    }
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits an assignment.
    pub fn add_entry(&mut self, entry: RosterEntry) {
        self.entries.push(entry);
    }

    /// Records a violation reported by the producing strategy.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Whether the producing strategy reported no violations.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of committed assignments.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pair is assigned.
    pub fn contains(&self, student: &str, slot: Slot) -> bool {
        self.entries
            .iter()
            .any(|e| e.student == student && e.slot == slot)
    }

    /// Per-slot view: slot → assigned students, slots in canonical order,
    /// students in commit order.
    pub fn by_slot(&self) -> BTreeMap<Slot, Vec<&str>> {
        let mut view: BTreeMap<Slot, Vec<&str>> = BTreeMap::new();
        for entry in &self.entries {
            view.entry(entry.slot).or_default().push(&entry.student);
        }
        view
    }

    /// Per-student view: student → assigned slots in canonical order.
    pub fn by_student(&self) -> BTreeMap<&str, Vec<Slot>> {
        let mut view: BTreeMap<&str, Vec<Slot>> = BTreeMap::new();
        for entry in &self.entries {
            view.entry(&entry.student).or_default().push(entry.slot);
        }
        for slots in view.values_mut() {
            slots.sort();
        }
        view
    }

    /// Students assigned to one slot, in commit order.
    pub fn students_for_slot(&self, slot: Slot) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.slot == slot)
            .map(|e| e.student.as_str())
            .collect()
    }

    /// Slots assigned to one student, in canonical order.
    pub fn slots_for_student(&self, student: &str) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self
            .entries
            .iter()
            .filter(|e| e.student == student)
            .map(|e| e.slot)
            .collect();
        slots.sort();
        slots
    }
}
