//! Capacity policy.
//!
//! Pure configuration: per-slot staffing bounds, per-student workload
//! bounds, the exact solver's `Must` policy, and the tie-break seed.
//! Inconsistent configurations are rejected eagerly by [`CapacityPolicy::validate`]
//! before either scheduler runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AvailabilityMatrix;

/// How the exact solver treats `Must` obligations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverMode {
    /// `Must` pairs are hard constraints; a jointly infeasible set yields
    /// no roster at all.
    Strict,
    /// `Must` satisfaction and minimum-bound coverage are heavily weighted
    /// objective terms; the solver always returns a best-effort roster.
    #[default]
    Soft,
}

/// Staffing and workload bounds for one scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityPolicy {
    /// Minimum students per slot.
    pub slot_min_staff: u32,
    /// Maximum students per slot.
    pub slot_max_staff: u32,
    /// Minimum slots per student.
    pub student_min_hours: u32,
    /// Maximum slots per student.
    pub student_max_hours: u32,
    /// Exact-solver `Must` policy.
    pub solver_mode: SolverMode,
    /// Seed for the greedy scheduler's tie-breaking RNG.
    pub random_seed: u64,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            slot_min_staff: 1,
            slot_max_staff: 2,
            student_min_hours: 2,
            student_max_hours: 3,
            solver_mode: SolverMode::default(),
            random_seed: 0,
        }
    }
}

/// An inconsistent policy, detected before scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// `slot_min_staff` exceeds `slot_max_staff`.
    #[error("slot staffing bounds reversed: min {min} > max {max}")]
    StaffBoundsReversed { min: u32, max: u32 },
    /// `student_min_hours` exceeds `student_max_hours`.
    #[error("student workload bounds reversed: min {min} > max {max}")]
    HourBoundsReversed { min: u32, max: u32 },
    /// The student pool cannot supply the per-slot minimum even at full
    /// workload.
    #[error("minimum coverage needs {required} assignments but the pool supplies at most {available}")]
    InsufficientPool { required: u64, available: u64 },
}

impl CapacityPolicy {
    /// Creates the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-slot staffing bounds.
    pub fn with_slot_staff(mut self, min: u32, max: u32) -> Self {
        self.slot_min_staff = min;
        self.slot_max_staff = max;
        self
    }

    /// Sets the per-student workload bounds.
    pub fn with_student_hours(mut self, min: u32, max: u32) -> Self {
        self.student_min_hours = min;
        self.student_max_hours = max;
        self
    }

    /// Sets the exact-solver mode.
    pub fn with_solver_mode(mut self, mode: SolverMode) -> Self {
        self.solver_mode = mode;
        self
    }

    /// Sets the tie-break seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Checks the policy against a matrix, rejecting configurations no
    /// strategy could satisfy.
    pub fn validate(&self, matrix: &AvailabilityMatrix) -> Result<(), PolicyError> {
        if self.slot_min_staff > self.slot_max_staff {
            return Err(PolicyError::StaffBoundsReversed {
                min: self.slot_min_staff,
                max: self.slot_max_staff,
            });
        }
        if self.student_min_hours > self.student_max_hours {
            return Err(PolicyError::HourBoundsReversed {
                min: self.student_min_hours,
                max: self.student_max_hours,
            });
        }

        let required = matrix.slots().len() as u64 * u64::from(self.slot_min_staff);
        let available = matrix.students().len() as u64 * u64::from(self.student_max_hours);
        if required > available {
            return Err(PolicyError::InsufficientPool {
                required,
                available,
            });
        }

        Ok(())
    }
}
