//! Common types and utilities for the idlh WebIDL conformance harness.
//!
//! This crate provides foundational types used across all idlh crates:
//! - Global scope kinds (`GlobalScope`) and exposure names
//! - Harness limits and thresholds

// Global execution contexts an IDL construct can be exposed in
pub mod scope;
pub use scope::{GlobalScope, WORKER_EXPOSURE_NAMES};

// Centralized limits and thresholds
pub mod limits;
