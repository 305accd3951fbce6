mod audits;

pub use audits::*;
