//! Shared database test infrastructure
//!
//! Every test runs against a fresh in-memory SQLite database migrated with the
//! real migration files. Tests are organized as:
//!
//! - **Repository tests** (`audits.rs`): shared functions taking `&dyn XxxRepo`
//! - **Engine tests** (`purge.rs`): shared functions taking a test context that
//!   seeds rows through [`fixtures::Seed`] and drives the engine in a transaction
//!
//! Each file ends with a `sqlite_tests` module that instantiates the shared
//! functions with a `sqlite_test!` macro.

mod audits;
pub mod harness;
