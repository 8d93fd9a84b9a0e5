pub mod heatmap;
pub mod parallel;
pub mod planar;
pub mod symbology;

pub use heatmap::*;
pub use parallel::*;
pub use planar::*;
pub use symbology::*;
