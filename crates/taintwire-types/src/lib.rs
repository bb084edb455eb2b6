//! Core types for the taintwire harness.
//!
//! This crate defines the shared data structures used across the carrier
//! implementations, the scenario harness, and the CLI driver. It contains
//! no business logic.

pub mod carrier;
pub mod error;
pub mod report;
pub mod taint;
