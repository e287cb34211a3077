//! Core domain types
//!
//! This module contains the core domain structures used across Forge services.
//! Agent configuration entities come from the persistent store, payload records
//! are created by the builder, and build stages track a single build's progress.

pub mod agent;
pub mod build;
pub mod payload;
