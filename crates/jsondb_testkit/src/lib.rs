//! # JsonDB Testkit
//!
//! Test utilities for JsonDB.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - Property-based test generators using proptest
//! - Storage fault injection
//! - Cross-crate integration test helpers
//! - Fuzz testing harnesses
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use jsondb_testkit::prelude::*;
//!
//! let users = TestCollection::memory(user_schema());
//! let created = users.create(scenarios::user(1)).unwrap();
//! assert_eq!(created.id().as_deref(), Some("1"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::FaultyBackend;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::IntegrationHarness;
    pub use crate::stress::{StressConfig, StressTestResult};
}

pub use faults::FaultyBackend;
pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use integration::IntegrationHarness;
pub use stress::*;
