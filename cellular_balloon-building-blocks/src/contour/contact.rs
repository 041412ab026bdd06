use nalgebra::Vector2;

use super::Contour;
use crate::math::{normalize, pixel_of, IntegerPolygon};

impl Contour {
    /// Corners of the contour pushed outwards along their radial direction.
    ///
    /// Each vertex is moved by `interface_width` away from the [center](Contour::center) and
    /// rounded afterwards.
    /// With [None] the rounded raw vertices are returned.
    pub fn expanded_outline(&self, interface_width: Option<f64>) -> Vec<[i64; 2]> {
        let center = self.center.cast::<f64>();
        self.vertices
            .iter()
            .map(|v| match interface_width {
                Some(width) => pixel_of(&(v + normalize(&(v - center)) * width)),
                None => pixel_of(v),
            })
            .collect()
    }

    /// Tests if the point `(x, y)` lies inside the rounded polygon.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let [px, py] = pixel_of(&Vector2::new(x, y));
        self.integer_polygon().contains_pixel(px, py)
    }

    /// Tests if the point `(x, y)` (typically a vertex of a neighbouring contour whose center is
    /// `other_center`) touches this contour.
    ///
    /// The test succeeds if either
    /// 1. the point lies inside the [outline](Contour::expanded_outline) expanded by
    ///    `interface_width` or
    /// 2. the point moved by `interface_width` away from `other_center` lies inside the raw
    ///    polygon.
    ///
    /// ```
    /// # use cellular_balloon_building_blocks::Contour;
    /// let contour = Contour::from_seed([50.0, 50.0], 10.0, 24)?;
    /// assert!(contour.contact_test(50.0, 50.0, [80, 50], 4.0));
    /// assert!(contour.contact_test(62.0, 50.0, [80, 50], 4.0));
    /// assert!(!contour.contact_test(70.0, 50.0, [80, 50], 4.0));
    /// # Result::<(), cellular_balloon_concepts::SetupError>::Ok(())
    /// ```
    pub fn contact_test(
        &self,
        x: f64,
        y: f64,
        other_center: [i64; 2],
        interface_width: f64,
    ) -> bool {
        let point = Vector2::new(x, y);
        let [px, py] = pixel_of(&point);
        let expanded = IntegerPolygon::new(self.expanded_outline(Some(interface_width)));
        if expanded.contains_pixel(px, py) {
            return true;
        }
        let other_center = Vector2::new(other_center[0] as f64, other_center[1] as f64);
        let shifted = point + normalize(&(point - other_center)) * interface_width;
        let [sx, sy] = pixel_of(&shifted);
        self.integer_polygon().contains_pixel(sx, sy)
    }
}
