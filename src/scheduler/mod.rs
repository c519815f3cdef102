//! Greedy roster scheduling.
//!
//! Provides the multi-phase priority heuristic: forced assignments first,
//! then coverage of every slot, then fill-to-capacity. Fast, never fails,
//! best-effort on infeasible inputs.
//!
//! # Reference
//!
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4:
//! Priority Dispatching

mod greedy;

pub use greedy::GreedyScheduler;
