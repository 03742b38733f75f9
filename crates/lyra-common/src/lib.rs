//! Common types and utilities for the lyra analysis engine.
//!
//! This crate provides foundational types used across all lyra crates:
//! - String interning (`Atom`, `Interner`)
//! - Engine limits and thresholds

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Centralized limits and thresholds
pub mod limits;
