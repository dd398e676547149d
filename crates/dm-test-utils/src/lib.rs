//! Shared test utilities for the data manager workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`engine`]: [`FakeEngine`], an in-memory storage engine with a call log
//! - [`git`]: inspection helpers for containers backed by real git
//! - [`tree`]: [`TestTree`], a temporary managed root with assertions

pub mod engine;
pub mod git;
pub mod tree;

pub use engine::{Call, FakeEngine};
pub use tree::TestTree;
