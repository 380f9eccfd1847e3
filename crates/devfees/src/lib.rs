//! Development fee engine.
//!
//! Computes per-fee dollar amounts for a construction project against a
//! jurisdiction's fee schedule, rolls them up into one-time and recurring
//! costs, and compares jurisdictions side by side.

pub mod config;
pub mod error;
pub mod fees;
pub mod telemetry;
