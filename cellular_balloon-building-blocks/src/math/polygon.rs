use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Rounds a position to the pixel which contains it.
///
/// Halves are rounded towards positive infinity so that `(x + 0.5).floor()` is the pixel index.
pub fn pixel_of(position: &Vector2<f64>) -> [i64; 2] {
    [
        (position.x + 0.5).floor() as i64,
        (position.y + 0.5).floor() as i64,
    ]
}

/// Closed polygon with integer (pixel) corners.
///
/// Used to rasterize contours and to answer inclusion queries.
/// Inclusion follows the even-odd rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegerPolygon {
    corners: Vec<[i64; 2]>,
}

impl IntegerPolygon {
    /// Builds the polygon from already rounded corners.
    pub fn new(corners: Vec<[i64; 2]>) -> Self {
        Self { corners }
    }

    /// Rounds every position with [pixel_of] and builds the polygon from the result.
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a Vector2<f64>>) -> Self {
        Self {
            corners: positions.into_iter().map(pixel_of).collect(),
        }
    }

    /// Corners in order.
    pub fn corners(&self) -> &[[i64; 2]] {
        &self.corners
    }

    /// Axis-aligned bounding box as `([x_min, y_min], [x_max, y_max])`.
    ///
    /// Returns [None] for a polygon without corners.
    pub fn bounding_box(&self) -> Option<([i64; 2], [i64; 2])> {
        let first = *self.corners.first()?;
        Some(
            self.corners
                .iter()
                .fold((first, first), |(min, max), corner| {
                    (
                        [min[0].min(corner[0]), min[1].min(corner[1])],
                        [max[0].max(corner[0]), max[1].max(corner[1])],
                    )
                }),
        )
    }

    /// Even-odd inclusion test of the point `(x, y)`.
    ///
    /// A horizontal ray is cast from the point to positive x and crossings with the edges are
    /// counted. Edges are treated as half-open in y so that shared corners are counted once.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.corners.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = (self.corners[i][0] as f64, self.corners[i][1] as f64);
            let (xj, yj) = (self.corners[j][0] as f64, self.corners[j][1] as f64);
            if (yi > y) != (yj > y) {
                let x_crossing = xi + (xj - xi) * (y - yi) / (yj - yi);
                if x < x_crossing {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Inclusion test of an integer pixel.
    pub fn contains_pixel(&self, x: i64, y: i64) -> bool {
        self.contains(x as f64, y as f64)
    }
}
