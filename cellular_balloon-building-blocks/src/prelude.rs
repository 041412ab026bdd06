pub use crate::contour::*;
pub use crate::fields::*;
pub use crate::math::{normalize, outward_normal, pixel_of, signed_angle, IntegerPolygon};
pub use crate::parameters::*;

pub use cellular_balloon_concepts::{
    GradientField, GradientSample, IndexError, IntensityField, SetupError,
};
