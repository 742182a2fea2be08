//! Shared test utilities for hireflow integration tests.
//!
//! This module provides:
//! - `TestHarness` wiring a tracker and relay over an in-memory store
//! - `FailingStore` for injecting store faults per candidate or removal step
//! - Builders for stages and candidates

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{Fault, FailingStore, FixedScorer, RecordingDispatcher, TestHarness};
