//! Core infrastructure for tugdocs.
//!
//! This crate provides language-agnostic infrastructure:
//! - Error types and error codes
//! - JSON output types for CLI responses
//! - Text position utilities
//! - Unified diff generation

pub mod diff;
pub mod error;
pub mod output;
pub mod text;
