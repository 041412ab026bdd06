use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::Contour;
use crate::math::{pixel_of, IntegerPolygon};

/// Shape statistics of the rasterized contour.
///
/// The values are only refreshed by [Contour::compute_mass_geometry] and are stale in between.
///
/// | Field | Description |
/// | --- | --- |
/// | `area` | Number of enclosed pixels |
/// | `ixx`, `iyy`, `ixy` | Second moments $\sum (x-\bar{x})^2$, $\sum (y-\bar{y})^2$, $\sum (x-\bar{x})(y-\bar{y})$ |
/// | `lx` | Number of enclosed pixels along the middle row of the bounding box |
/// | `ly` | Height of the bounding box |
/// | `centroid` | Mean position $(\bar{x}, \bar{y})$ of all enclosed pixels |
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MassGeometry {
    /// Enclosed pixels
    pub area: f64,
    /// Second moment along x
    pub ixx: f64,
    /// Second moment along y
    pub iyy: f64,
    /// Mixed second moment
    pub ixy: f64,
    /// Width along the middle row
    pub lx: f64,
    /// Height of the bounding box
    pub ly: f64,
    /// Mean position of the enclosed pixels
    pub centroid: Vector2<f64>,
}

impl Contour {
    /// The polygon with the rounded vertex positions as corners.
    pub fn integer_polygon(&self) -> IntegerPolygon {
        IntegerPolygon::from_positions(&self.vertices)
    }

    /// Rasterizes the contour and recomputes its [MassGeometry].
    ///
    /// Every pixel of the bounding box of the [integer polygon](Contour::integer_polygon) is
    /// tested for inclusion.
    /// This is by far the most expensive operation on a contour and should not be part of the
    /// per-step loop.
    /// The [center](Contour::center) is replaced by the rounded centroid and the
    /// [radius estimate](Contour::radius_estimate) by the largest vertex distance to the
    /// centroid. The [smallest distance](Contour::radius_min) is measured from the centroid as
    /// well.
    /// A contour which does not enclose any pixel keeps its center.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn compute_mass_geometry(&mut self) -> &MassGeometry {
        let polygon = self.integer_polygon();
        let Some((min, max)) = polygon.bounding_box() else {
            return &self.geometry;
        };
        let pixels: Vec<Vector2<f64>> = (min[0]..=max[0])
            .flat_map(|x| (min[1]..=max[1]).map(move |y| (x, y)))
            .filter(|&(x, y)| polygon.contains_pixel(x, y))
            .map(|(x, y)| Vector2::new(x as f64, y as f64))
            .collect();

        let area = pixels.len() as f64;
        let centroid = if pixels.is_empty() {
            self.center.cast::<f64>()
        } else {
            pixels.iter().sum::<Vector2<f64>>() / area
        };
        let (ixx, iyy, ixy) = pixels.iter().fold((0.0, 0.0, 0.0), |(ixx, iyy, ixy), p| {
            let d = p - centroid;
            (ixx + d.x * d.x, iyy + d.y * d.y, ixy + d.x * d.y)
        });

        // Both bounds are halved separately with truncation
        let middle_row = min[1] / 2 + max[1] / 2;
        let lx = (min[0]..max[0])
            .filter(|&x| polygon.contains_pixel(x, middle_row))
            .count() as f64;
        let ly = (max[1] - min[1]) as f64;

        self.center = pixel_of(&centroid).into();
        let (radius_min, radius) = self
            .vertices
            .iter()
            .map(|v| (v - centroid).norm())
            .fold((f64::INFINITY, 0.0_f64), |(min, max), d| {
                (min.min(d), max.max(d))
            });
        self.radius = radius;
        self.radius_min = radius_min;
        self.geometry = MassGeometry {
            area,
            ixx,
            iyy,
            ixy,
            lx,
            ly,
            centroid,
        };
        &self.geometry
    }
}
