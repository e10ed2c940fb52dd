mod paths;
mod standardise;

pub use paths::*;
pub use standardise::*;
