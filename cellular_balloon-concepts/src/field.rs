use serde::{Deserialize, Serialize};

/// Read-only source of pixel intensities which drives the inflation of a contour.
///
/// Positions are sampled at integer pixel coordinates without interpolation.
/// Implementors decide what happens outside of the image; the engine never checks bounds
/// before sampling.
/// Any closure `Fn(i64, i64) -> f64` can act as an intensity field.
/// ```
/// # use cellular_balloon_concepts::IntensityField;
/// let background = |_x: i64, _y: i64| 12.0;
/// assert_eq!(background.intensity_at(3, 4), 12.0);
/// ```
pub trait IntensityField {
    /// Intensity of the pixel at `(x, y)`.
    fn intensity_at(&self, x: i64, y: i64) -> f64;
}

impl<F> IntensityField for F
where
    F: Fn(i64, i64) -> f64,
{
    fn intensity_at(&self, x: i64, y: i64) -> f64 {
        self(x, y)
    }
}

/// The four directional gradient responses at one pixel.
///
/// The positive and negative channels are half-wave rectified responses of opposite kernels, so
/// the signed gradient along x is `x_plus - x_minus`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GradientSample {
    /// Response of the kernel pointing towards positive x.
    pub x_plus: f64,
    /// Response of the kernel pointing towards positive y.
    pub y_plus: f64,
    /// Response of the kernel pointing towards negative x.
    pub x_minus: f64,
    /// Response of the kernel pointing towards negative y.
    pub y_minus: f64,
}

impl GradientSample {
    /// Signed gradient `(x_plus - x_minus, y_plus - y_minus)`.
    pub fn difference(&self) -> [f64; 2] {
        [self.x_plus - self.x_minus, self.y_plus - self.y_minus]
    }
}

/// Read-only source of image gradients which drives the snake refinement of a contour.
pub trait GradientField {
    /// Gradient channels of the pixel at `(x, y)`.
    fn gradient_at(&self, x: i64, y: i64) -> GradientSample;

    /// Width and height of the underlying image in pixels.
    ///
    /// Vertices are clamped to `[0, width-1] x [0, height-1]` during refinement.
    fn dimensions(&self) -> (usize, usize);
}
