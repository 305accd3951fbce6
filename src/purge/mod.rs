//! Retention and cascading deletion of analysis history.
//!
//! [`PurgeDao`] is the entry point. It resolves the scope of an operation,
//! asks [`RetentionPolicyEvaluator`] what is past retention, and runs the
//! matching [`steps`] through [`PurgeCommands`] on the caller's transaction.

mod background_tasks;
mod clock;
mod commands;
mod configuration;
mod dao;
mod error;
mod evaluator;
pub mod filters;
pub mod issues;
mod profiler;
mod report;
pub mod scope;
mod sinks;
pub mod steps;

pub use background_tasks::purge_old_background_tasks;
pub use clock::{Clock, FixedClock, SystemClock};
pub use commands::PurgeCommands;
pub use configuration::PurgeConfiguration;
pub use dao::{PurgeDao, PurgeOutcome};
pub use error::{PurgeError, PurgeResult};
pub use evaluator::{OldBackgroundTasks, RetentionPolicyEvaluator};
pub use filters::{AnalysisFilter, Period};
pub use issues::{IssueDecision, IssuePlan, RemovalReason};
pub use profiler::PurgeProfiler;
pub use report::PurgeReport;
pub use scope::PurgeScope;
pub use sinks::{
    AuditSink, DbAuditSink, LoggingPurgeListener, NoopAuditSink, NoopPurgeListener, PurgeListener,
};
