pub mod order;
pub mod params;

pub use order::*;
pub use params::*;
