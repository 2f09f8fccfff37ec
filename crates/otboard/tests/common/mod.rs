//! Shared test utilities for otboard integration tests.
//!
//! This module provides:
//! - `TestHarness` with an on-disk store, an admin and an operator
//! - Builders for configs and work orders

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
