//! Retention and cascading-deletion engine for code-analysis history.
//!
//! The engine keeps the analysis database bounded: it thins old analyses,
//! sweeps stale branches, retires issues of removed code, ages out finished
//! background tasks, and deletes whole projects or branches without leaving
//! orphaned rows behind.
//!
//! Use [`services::PurgeService`] for transaction-managed calls, or
//! [`purge::PurgeDao`] to run inside a transaction you already hold.

pub mod config;
pub mod db;
pub mod models;
pub mod observability;
pub mod purge;
pub mod services;
