//! tugdocs: copy Go interface method documentation onto implementations.
//!
//! A concrete type that asserts an interface with a marker declaration
//!
//! ```go
//! var _ Fooer = (*Concrete)(nil)
//! ```
//!
//! gets each interface method's doc comment copied onto its own method,
//! so the contract's prose is written once.

// Core infrastructure - re-exported from tugdocs-core
pub use tugdocs_core::diff;
pub use tugdocs_core::error;
pub use tugdocs_core::output;
pub use tugdocs_core::text;

// Engine
pub mod annotate;
pub mod engine;
pub mod implements;
pub mod registry;
pub mod rewrite;

// Front door
pub mod cli;
