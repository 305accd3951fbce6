mod analysis;
mod audit;
mod branch;
mod component;
mod issue;

pub use analysis::*;
pub use audit::*;
pub use branch::*;
pub use component::*;
pub use issue::*;
