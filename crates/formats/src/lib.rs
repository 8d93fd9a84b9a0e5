pub mod dataset;
pub mod resource;

pub use dataset::*;
pub use resource::*;
