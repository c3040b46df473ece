//! Test utilities
//!
//! Manual in-memory implementations of the ports and fixtures for unit tests.
//! The mocks are plain structs rather than generated ones so tests can gate,
//! fail and inspect them directly.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
