pub mod picking;
pub mod query;
pub mod selection;
pub mod world;

pub use selection::*;
pub use world::*;
