use cellular_balloon_concepts::{GradientField, GradientSample, IntensityField, SetupError};
use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Intensity image together with its rectified directional edge gradients.
///
/// The image is stored row-major with `intensity[[y, x]]`.
/// On construction the edge strength $E$ is computed with a Sobel operator.
/// The gradient channels are the responses of $E$ to the half-weighted Sobel kernels
/// \\begin{equation}
///     K\_{x,+} = \frac{1}{2}\begin{pmatrix}1&0&-1\\\\2&0&-2\\\\1&0&-1\end{pmatrix}
///     \hspace{2em}
///     K\_{y,+} = \frac{1}{2}\begin{pmatrix}1&2&1\\\\0&0&0\\\\-1&-2&-1\end{pmatrix}
/// \\end{equation}
/// and their negatives $K\_{x,-}=-K\_{x,+}$, $K\_{y,-}=-K\_{y,+}$.
/// Negative responses are clipped to zero.
/// Borders are extended by replicating the outermost pixels.
///
/// Samples outside of the image are zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageField {
    intensity: Array2<f64>,
    edges: Array2<f64>,
    x_plus: Array2<f64>,
    y_plus: Array2<f64>,
    x_minus: Array2<f64>,
    y_minus: Array2<f64>,
}

/// Copies the image into an array which is larger by one pixel on each side.
fn pad_replicated(image: &Array2<f64>) -> Array2<f64> {
    let (height, width) = image.dim();
    let mut padded = Array2::zeros((height + 2, width + 2));
    padded.slice_mut(s![1..-1, 1..-1]).assign(image);
    padded.slice_mut(s![0, 1..-1]).assign(&image.row(0));
    padded
        .slice_mut(s![-1, 1..-1])
        .assign(&image.row(height - 1));
    // Columns last so that the corners are filled as well
    let first = padded.column(1).to_owned();
    padded.column_mut(0).assign(&first);
    let last = padded.column(width).to_owned();
    padded.column_mut(width + 1).assign(&last);
    padded
}

/// View into a padded array shifted by `(dy, dx)` with the shape of the original image.
fn shifted(padded: &Array2<f64>, dy: isize, dx: isize) -> ArrayView2<'_, f64> {
    let (height, width) = (padded.nrows() - 2, padded.ncols() - 2);
    let y0 = (1 + dy) as usize;
    let x0 = (1 + dx) as usize;
    padded.slice(s![y0..y0 + height, x0..x0 + width])
}

/// Sobel responses `(gx, gy)` where `gx` grows towards positive x and `gy` towards positive y.
fn sobel(image: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
    let padded = pad_replicated(image);
    let padded = &padded;
    let at = move |dy: isize, dx: isize| shifted(padded, dy, dx);
    let gx = &at(-1, 1) + &(&at(0, 1) * 2.0) + &at(1, 1)
        - &at(-1, -1)
        - &(&at(0, -1) * 2.0)
        - &at(1, -1);
    let gy = &at(1, -1) + &(&at(1, 0) * 2.0) + &at(1, 1)
        - &at(-1, -1)
        - &(&at(-1, 0) * 2.0)
        - &at(-1, 1);
    (gx, gy)
}

impl ImageField {
    /// Computes edges and gradient channels of the given image.
    ///
    /// ```
    /// # use cellular_balloon_building_blocks::ImageField;
    /// # use cellular_balloon_concepts::{GradientField, IntensityField};
    /// let image = ndarray::Array2::from_shape_fn((10, 20), |(_, x)| if x >= 10 { 100.0 } else { 0.0 });
    /// let field = ImageField::new(image)?;
    /// assert_eq!(field.dimensions(), (20, 10));
    /// assert_eq!(field.intensity_at(15, 3), 100.0);
    /// assert_eq!(field.intensity_at(25, 3), 0.0);
    /// # Result::<(), cellular_balloon_concepts::SetupError>::Ok(())
    /// ```
    pub fn new(intensity: Array2<f64>) -> Result<Self, SetupError> {
        if intensity.is_empty() {
            return Err(SetupError(format!(
                "Cannot build a field from an empty image of shape {:?}",
                intensity.dim()
            )));
        }
        let (gx, gy) = sobel(&intensity);
        let edges = ndarray::Zip::from(&gx)
            .and(&gy)
            .map_collect(|gx, gy| gx.hypot(*gy));
        let (ex, ey) = sobel(&edges);
        let rectify = |a: &Array2<f64>, sign: f64| a.mapv(|v| (sign * 0.5 * v).max(0.0));
        Ok(Self {
            x_plus: rectify(&ex, -1.0),
            y_plus: rectify(&ey, -1.0),
            x_minus: rectify(&ex, 1.0),
            y_minus: rectify(&ey, 1.0),
            intensity,
            edges,
        })
    }

    /// The original image.
    pub fn intensity(&self) -> &Array2<f64> {
        &self.intensity
    }

    /// Sobel edge strength of the image.
    pub fn edges(&self) -> &Array2<f64> {
        &self.edges
    }

    fn index(&self, x: i64, y: i64) -> Option<[usize; 2]> {
        let (height, width) = self.intensity.dim();
        let x = usize::try_from(x).ok().filter(|&x| x < width)?;
        let y = usize::try_from(y).ok().filter(|&y| y < height)?;
        Some([y, x])
    }
}

impl IntensityField for ImageField {
    fn intensity_at(&self, x: i64, y: i64) -> f64 {
        self.index(x, y).map_or(0.0, |index| self.intensity[index])
    }
}

impl GradientField for ImageField {
    fn gradient_at(&self, x: i64, y: i64) -> GradientSample {
        self.index(x, y)
            .map(|index| GradientSample {
                x_plus: self.x_plus[index],
                y_plus: self.y_plus[index],
                x_minus: self.x_minus[index],
                y_minus: self.y_minus[index],
            })
            .unwrap_or_default()
    }

    fn dimensions(&self) -> (usize, usize) {
        let (height, width) = self.intensity.dim();
        (width, height)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn vertical_step() -> ImageField {
        let image = Array2::from_shape_fn((10, 20), |(_, x)| if x >= 10 { 100.0 } else { 0.0 });
        ImageField::new(image).unwrap()
    }

    #[test]
    fn edges_follow_step() {
        let field = vertical_step();
        assert_eq!(field.edges()[[5, 9]], 400.0);
        assert_eq!(field.edges()[[5, 10]], 400.0);
        assert_eq!(field.edges()[[5, 5]], 0.0);
        assert_eq!(field.edges()[[0, 9]], 400.0);
    }

    #[test]
    fn gradient_points_towards_edge() {
        let field = vertical_step();
        // Left of the ridge the external force -(x_plus - x_minus) points to +x
        let left = field.gradient_at(8, 5);
        assert_eq!(left.difference(), [-800.0, 0.0]);
        let right = field.gradient_at(11, 5);
        assert_eq!(right.difference(), [800.0, 0.0]);
        assert_eq!(field.gradient_at(3, 5), GradientSample::default());
    }

    #[test]
    fn channels_are_rectified() {
        let field = vertical_step();
        for channel in [&field.x_plus, &field.y_plus, &field.x_minus, &field.y_minus] {
            assert!(channel.iter().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn outside_samples_are_zero() {
        let field = vertical_step();
        assert_eq!(field.intensity_at(-1, 0), 0.0);
        assert_eq!(field.intensity_at(0, 10), 0.0);
        assert_eq!(field.gradient_at(20, 0), GradientSample::default());
    }

    #[test]
    fn reject_empty_image() {
        assert!(ImageField::new(Array2::zeros((0, 4))).is_err());
    }

    #[test]
    fn single_pixel_image() {
        let field = ImageField::new(Array2::from_elem((1, 1), 7.0)).unwrap();
        assert_eq!(field.edges()[[0, 0]], 0.0);
        assert_eq!(field.dimensions(), (1, 1));
    }
}
