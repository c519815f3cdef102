//! Weekly duty roster engine.
//!
//! Assigns students to recurring one-hour shifts from a student × slot
//! preference matrix, honoring forced (`MUST`) and forbidden (`CANNOT`)
//! pairs, per-slot staffing bounds, and per-student workload bounds.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Slot`, `AvailabilityMatrix`,
//!   `CapacityPolicy`, `Roster`, `Violation`
//! - **`scheduler`**: Multi-phase greedy heuristic (forced → coverage →
//!   fill-to-capacity), deterministic for a given seed, never fails
//! - **`milp`**: Exact mixed-integer formulation with strict and soft
//!   `MUST` policies
//! - **`validation`**: Independent, strategy-agnostic roster verification
//!
//! # Architecture
//!
//! One run consumes one read-only matrix and policy and produces one
//! roster; working state never outlives the run. Ingestion of spreadsheet
//! exports and report writing live outside this crate, on either side of
//! the `AvailabilityMatrixBuilder` / `Roster` view boundaries.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Wolsey (2020), "Integer Programming"

pub mod milp;
pub mod models;
pub mod scheduler;
pub mod validation;
