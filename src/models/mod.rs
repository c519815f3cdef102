//! Duty-roster domain models.
//!
//! Core data types for weekly staffing problems: who is available when
//! ([`AvailabilityMatrix`]), what the staffing and workload bounds are
//! ([`CapacityPolicy`]), and which assignments a strategy committed
//! ([`Roster`]). The matrix and policy are read-only inputs to a run;
//! the roster is its only output.

mod availability;
mod policy;
mod roster;
mod slot;

pub use availability::{AvailabilityLabel, AvailabilityMatrix, AvailabilityMatrixBuilder};
pub use policy::{CapacityPolicy, PolicyError, SolverMode};
pub use roster::{Roster, RosterEntry, Violation, ViolationKind};
pub use slot::{Slot, Weekday};
