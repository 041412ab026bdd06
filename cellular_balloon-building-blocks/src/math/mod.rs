mod polygon;
mod vector;

pub use polygon::*;
pub use vector::*;
