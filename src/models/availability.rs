//! Availability preferences.
//!
//! The `AvailabilityMatrix` is the engine's sole preference input: one label
//! per (student, slot) pair, absent pairs defaulting to [`AvailabilityLabel::Ok`].
//! Ingestion of spreadsheet exports lives outside this crate; the
//! [`AvailabilityMatrixBuilder`] is the conversion boundary it feeds, so the
//! schedulers never see raw header or cell text.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

use super::Slot;

/// A student's availability for one slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvailabilityLabel {
    /// Hard requirement: the student must staff this slot.
    Must,
    /// Hard exclusion: the student can never staff this slot.
    Cannot,
    /// Eligible but not forced (the default).
    #[default]
    Ok,
}

impl AvailabilityLabel {
    /// Canonicalizes a free-text form response.
    ///
    /// Recognizes the historical spellings (`"MUST-SELECT"`, `"MUST-HAVE"`,
    /// `"CANNOT-SELECT"`, `"UNAVAILABLE"`) case-insensitively; anything else,
    /// including blanks, means eligible.
    pub fn from_response(raw: &str) -> Self {
        let normalized = raw.trim().to_uppercase();
        if normalized.contains("CANNOT") || normalized.contains("UNAVAILABLE") {
            AvailabilityLabel::Cannot
        } else if normalized.contains("MUST") {
            AvailabilityLabel::Must
        } else {
            AvailabilityLabel::Ok
        }
    }
}

/// Normalized student × slot preference grid.
///
/// Students keep their input order (the greedy scheduler's phase-1 order);
/// slots are kept sorted in canonical order. Immutable once built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityMatrix {
    students: Vec<String>,
    slots: Vec<Slot>,
    entries: HashMap<String, HashMap<Slot, AvailabilityLabel>>,
}

impl AvailabilityMatrix {
    /// Students in input order.
    pub fn students(&self) -> &[String] {
        &self.students
    }

    /// Slots in canonical order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Label for a (student, slot) pair. Absent pairs are `Ok`.
    pub fn label(&self, student: &str, slot: Slot) -> AvailabilityLabel {
        self.entries
            .get(student)
            .and_then(|row| row.get(&slot))
            .copied()
            .unwrap_or_default()
    }

    /// Whether the student is part of this matrix.
    pub fn contains_student(&self, student: &str) -> bool {
        self.students.iter().any(|s| s == student)
    }

    /// Whether the slot is part of this matrix.
    pub fn contains_slot(&self, slot: Slot) -> bool {
        self.slots.binary_search(&slot).is_ok()
    }

    /// A student's `Must` slots, in canonical order.
    pub fn must_slots(&self, student: &str) -> Vec<Slot> {
        let Some(row) = self.entries.get(student) else {
            return Vec::new();
        };
        let mut slots: Vec<Slot> = row
            .iter()
            .filter(|(_, &label)| label == AvailabilityLabel::Must)
            .map(|(&slot, _)| slot)
            .collect();
        slots.sort();
        slots
    }

    /// Total number of `Must` pairs in the matrix.
    pub fn must_count(&self) -> usize {
        self.entries
            .values()
            .flat_map(|row| row.values())
            .filter(|&&label| label == AvailabilityLabel::Must)
            .count()
    }
}

/// Incremental builder for [`AvailabilityMatrix`].
///
/// This is the boundary where ingestion hands over: it accepts either
/// canonical labels (`set`) or raw form text (`record`), registers students
/// and slots, and skips malformed records instead of failing the run.
#[derive(Debug, Default)]
pub struct AvailabilityMatrixBuilder {
    students: Vec<String>,
    slots: BTreeSet<Slot>,
    entries: HashMap<String, HashMap<Slot, AvailabilityLabel>>,
}

impl AvailabilityMatrixBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a student without any preferences yet.
    ///
    /// Registration order is preserved and becomes the matrix's student
    /// order. Re-registering is a no-op; blank identities are skipped with
    /// a warning.
    pub fn student(&mut self, student: impl Into<String>) -> &mut Self {
        let student = student.into();
        let trimmed = student.trim();
        if trimmed.is_empty() {
            warn!("skipping availability record with blank student identity");
            return self;
        }
        if !self.students.iter().any(|s| s == trimmed) {
            self.students.push(trimmed.to_string());
        }
        self
    }

    /// Registers a slot that exists in the week, even if nobody labeled it.
    pub fn slot(&mut self, slot: Slot) -> &mut Self {
        self.slots.insert(slot);
        self
    }

    /// Registers several slots at once.
    pub fn slots(&mut self, slots: impl IntoIterator<Item = Slot>) -> &mut Self {
        self.slots.extend(slots);
        self
    }

    /// Sets a canonical label for a (student, slot) pair.
    pub fn set(&mut self, student: &str, slot: Slot, label: AvailabilityLabel) -> &mut Self {
        let trimmed = student.trim();
        if trimmed.is_empty() {
            warn!(%slot, "skipping availability record with blank student identity");
            return self;
        }
        self.student(trimmed);
        self.slot(slot);
        self.entries
            .entry(trimmed.to_string())
            .or_default()
            .insert(slot, label);
        self
    }

    /// Records a raw form response for a (student, slot) pair.
    pub fn record(&mut self, student: &str, slot: Slot, response: &str) -> &mut Self {
        self.set(student, slot, AvailabilityLabel::from_response(response))
    }

    /// Finalizes the matrix.
    pub fn build(self) -> AvailabilityMatrix {
        AvailabilityMatrix {
            students: self.students,
            slots: self.slots.into_iter().collect(),
            entries: self.entries,
        }
    }
}
