use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::Contour;

/// Vertex count from which on short segments are merged by [Contour::refine].
pub const MERGE_VERTEX_FLOOR: usize = 20;

/// Outcome of a single [Contour::refine] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineSummary {
    /// Number of midpoints which were inserted
    pub inserted: usize,
    /// Number of vertices which were merged away
    pub removed: usize,
    /// Vertex count after remeshing
    pub vertex_count: usize,
}

impl Contour {
    /// Remeshes the contour such that segment lengths stay within bounds.
    ///
    /// Every segment $(\vec{x}\_{i-1}, \vec{x}\_i)$ is visited once in order:
    ///
    /// | Segment length $l$ | Action |
    /// | --- | --- |
    /// | $l > l\_\text{max}$ | keep $\vec{x}\_{i-1}$ and insert the midpoint after it |
    /// | $l < l\_\text{max}/4$ and more than 20 vertices remain | drop $\vec{x}\_{i-1}$ |
    /// | otherwise | keep $\vec{x}\_{i-1}$ |
    ///
    /// Afterwards all velocities and fixations are reset and every rest length is set to the
    /// length of its new segment.
    /// `observed_max_vertices` is raised to the new vertex count if it was exceeded.
    ///
    /// Indices into the vertex arrays obtained before this call are invalid afterwards.
    /// ```
    /// # use cellular_balloon_building_blocks::Contour;
    /// let mut contour = Contour::from_points([[0.0, 0.0], [40.0, 0.0], [40.0, 10.0], [0.0, 10.0]])?;
    /// let mut observed_max_vertices = 0;
    /// let summary = contour.refine(15.0, &mut observed_max_vertices);
    /// assert_eq!(summary.inserted, 2);
    /// assert_eq!(contour.len(), 6);
    /// assert_eq!(observed_max_vertices, 6);
    /// # Result::<(), cellular_balloon_concepts::SetupError>::Ok(())
    /// ```
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub fn refine(
        &mut self,
        max_segment_length: f64,
        observed_max_vertices: &mut usize,
    ) -> RefineSummary {
        let n = self.len();
        let mut summary = RefineSummary::default();
        let mut new_vertices: Vec<Vector2<f64>> = Vec::with_capacity(n);
        for i in 1..=n {
            let start = self.vertices[i - 1];
            let end = self.vertices[i % n];
            let length = (end - start).norm();
            let remaining = n + summary.inserted - summary.removed;
            if length > max_segment_length {
                new_vertices.push(start);
                new_vertices.push(0.5 * (start + end));
                summary.inserted += 1;
            } else if remaining > MERGE_VERTEX_FLOOR && length < max_segment_length / 4.0 {
                summary.removed += 1;
            } else {
                new_vertices.push(start);
            }
        }

        let n_new = new_vertices.len();
        summary.vertex_count = n_new;
        self.vertices = new_vertices;
        self.velocity = vec![Vector2::zeros(); n_new];
        self.prev_velocity = vec![Vector2::zeros(); n_new];
        self.fixation = vec![0; n_new];
        self.reset_rest_lengths();
        *observed_max_vertices = (*observed_max_vertices).max(n_new);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            inserted = summary.inserted,
            removed = summary.removed,
            vertex_count = summary.vertex_count,
            "remeshed contour"
        );
        summary
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cellular_balloon_concepts::SetupError;

    #[test]
    fn fine_polygon_is_unchanged() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 20.0, 16)?;
        let before = contour.vertices().to_vec();
        let mut observed = 100;
        let summary = contour.refine(15.0, &mut observed);
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.removed, 0);
        assert_eq!(contour.vertices(), &before[..]);
        assert_eq!(observed, 100);
        Ok(())
    }

    #[test]
    fn long_segments_are_split() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([0.0, 0.0], 20.0, 4)?;
        let mut observed = 0;
        contour.refine(15.0, &mut observed);
        // Every edge of the square has length 20·√2 ≈ 28.3
        assert_eq!(contour.len(), 8);
        for i in 0..4 {
            let start = contour.vertices()[2 * i];
            let mid = contour.vertices()[2 * i + 1];
            let end = contour.vertices()[(2 * i + 2) % 8];
            assert_eq!(mid, 0.5 * (start + end));
        }
        Ok(())
    }

    #[test]
    fn short_segments_are_merged_above_floor() -> Result<(), SetupError> {
        // Segment length of a 64-gon with radius 20 is about 1.96 < 15/4
        let mut contour = Contour::from_seed([50.0, 50.0], 20.0, 64)?;
        let mut observed = 0;
        let summary = contour.refine(15.0, &mut observed);
        assert!(summary.removed > 0);
        assert_eq!(contour.len(), MERGE_VERTEX_FLOOR);
        assert_eq!(summary.vertex_count, MERGE_VERTEX_FLOOR);
        assert_eq!(observed, MERGE_VERTEX_FLOOR);
        assert_eq!(contour.check_consistency(), Ok(()));
        Ok(())
    }

    #[test]
    fn small_contour_is_never_merged() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([0.0, 0.0], 1.0, 12)?;
        let mut observed = 0;
        let summary = contour.refine(15.0, &mut observed);
        assert_eq!(summary.removed, 0);
        assert_eq!(contour.len(), 12);
        Ok(())
    }

    #[test]
    fn refine_resets_auxiliary_state() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        contour.encastre(1)?;
        contour.advance_inflate(
            &|_: i64, _: i64| 0.0,
            &crate::BalloonParameters {
                target_level: 50.0,
                ..Default::default()
            },
        );
        let mut observed = 0;
        contour.refine(3.0, &mut observed);
        assert_eq!(contour.len(), 24);
        assert!(contour.fixations().iter().all(|&f| f == 0));
        assert!(contour.prev_velocity().iter().all(|v| v == &Vector2::zeros()));
        for i in 0..contour.len() {
            assert_eq!(contour.rest_lengths()[i], contour.segment_length(i));
        }
        Ok(())
    }
}
