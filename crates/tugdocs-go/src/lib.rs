//! Go language support for tugdocs.
//!
//! This crate provides what documentation syncing needs from Go sources:
//! - Lexing with semicolon insertion and comment grouping
//! - A declaration-level syntax model and parser
//! - `go.mod` parsing, package discovery and import resolution
//! - Resolution of package-level named types
//! - Printing a file back with an edited comment set

pub mod ast;
pub mod comments;
pub mod error_bridges;
pub mod files;
pub mod gomod;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod printer;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
