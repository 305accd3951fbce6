mod purge;

pub use purge::PurgeService;
