#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
//! This crate encapsulates the concepts at the boundary of the
//! [cellular_balloon](https://docs.rs/cellular_balloon) contour engine.
//! The engine itself only advances a single contour; everything it consumes from its
//! surroundings (pixel intensities, image gradients) is described by the traits in here.

mod errors;
mod field;
#[cfg(feature = "plotters")]
mod plotting;

pub use errors::*;
pub use field::*;
#[cfg(feature = "plotters")]
pub use plotting::*;
