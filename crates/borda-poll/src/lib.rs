//! Ranked-choice poll core: ballot validation, the persisted ballot log, Borda-count
//! scoring with a cascading podium tie-break, and the HTTP routes that expose them.

pub mod config;
pub mod error;
pub mod poll;
pub mod telemetry;
