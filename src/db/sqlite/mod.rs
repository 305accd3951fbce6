mod audits;
pub(crate) mod common;
pub mod purge_mapper;

pub use audits::SqliteAuditRepo;
