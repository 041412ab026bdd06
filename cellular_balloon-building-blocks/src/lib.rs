#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
//! # cellular_balloon - Building Blocks
//!
//! The building blocks contain the engine which deforms a single balloon contour.
//! A [Contour] is seeded as a small regular polygon, inflated with
//! [Contour::advance_inflate] until it locks onto the surrounding bright cell walls and then
//! aligned to the image edges with [Contour::advance_optimize].
//! ```rust
//! # use cellular_balloon_building_blocks::prelude::*;
//! let parameters = BalloonParameters {
//!     target_level: 100.0,
//!     ..Default::default()
//! };
//! // A dark disk of radius 20 enclosed by bright walls
//! let image = ndarray::Array2::from_shape_fn((100, 100), |(y, x)| {
//!     let r = ((x as f64 - 50.0).powi(2) + (y as f64 - 50.0).powi(2)).sqrt();
//!     if r < 20.0 { 0.0 } else { 255.0 }
//! });
//! let field = ImageField::new(image)?;
//!
//! let mut contour = Contour::from_parameters([50.0, 50.0], &parameters)?;
//! let mut observed_max_vertices = 0;
//! for step in 0..400 {
//!     contour.advance_inflate(&field, &parameters);
//!     if step % 50 == 49 {
//!         contour.refine(parameters.max_segment_length, &mut observed_max_vertices);
//!     }
//! }
//! let geometry = contour.compute_mass_geometry();
//! assert!(geometry.area > 50.0);
//! assert!(geometry.area < 2000.0);
//! # Result::<(), cellular_balloon_concepts::SetupError>::Ok(())
//! ```
//! The engine itself never owns an image.
//! Everything it needs from its surroundings is passed into every call by implementors of the
//! [IntensityField](cellular_balloon_concepts::IntensityField) and
//! [GradientField](cellular_balloon_concepts::GradientField) traits.

/// Deformable contour with its mechanics, remeshing and geometric analysis
pub mod contour;

/// Image backed implementations of the field traits
pub mod fields;

/// Vector and polygon helpers
pub mod math;

/// Physical and numerical parameters
pub mod parameters;

#[cfg(feature = "plotters")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "plotters")))]
/// Drawing contours with [plotters]
pub mod plotting;

/// Handy re-exports of every building block.
pub mod prelude;

pub use contour::*;
pub use fields::*;
pub use parameters::*;
