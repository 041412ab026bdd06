mod contact;
mod geometry;
mod history;
mod mechanics;
mod remesh;

pub use geometry::*;
pub use history::*;
pub use remesh::*;

use crate::math::pixel_of;
use cellular_balloon_concepts::{IndexError, SetupError};
use itertools::Itertools;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Number of radius values kept by contours which were not configured otherwise.
pub const DEFAULT_HISTORY_LENGTH: usize = 30;

/// Fixation level of a vertex which touched a neighbour and may slide along its edges once.
pub const SOFT_FIXATION: u8 = 1;

/// Fixation level from which on a vertex is encastred and never moved again.
pub const HARD_FIXATION: u8 = 10;

/// Identifiers which relate a contour to its ancestors.
///
/// This information is carried along for the owner of the contour and never interpreted by the
/// engine itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    /// Identifier of the contour
    pub id: u64,
    /// Identifier of the contour this one originated from
    pub mother_id: Option<u64>,
    /// Number of divisions prior to the birth of this contour
    pub generation: u32,
    /// Identifier shared by all descendants of one initial contour
    pub line_id: Option<u64>,
    /// End points of the segment along which the mother divided
    pub division_line: Option<[[i64; 2]; 2]>,
}

/// A closed deformable contour (balloon) made of point masses connected by springs.
///
/// The vertices form a cyclic sequence: the successor of the last vertex is the first one.
/// For every vertex $i$ the contour stores
///
/// | Field | Description |
/// | --- | --- |
/// | `vertices[i]` | Position $\vec{x}\_i$ |
/// | `velocity[i]` | Velocity $\vec{v}\_i$ computed in the last step |
/// | `prev_velocity[i]` | Velocity used as $\vec{v}\_i(t-\Delta t)$ in the next step |
/// | `rest_length[i]` | Natural length $l\_i$ of the spring between $\vec{x}\_i$ and $\vec{x}\_{i+1}$ |
/// | `fixation[i]` | `0` free, `1..=9` soft contact, `>=10` encastred |
///
/// All of these arrays have the same length at all times.
/// The contour is advanced by [Contour::advance_inflate] and [Contour::advance_optimize],
/// remeshed by [Contour::refine] and analyzed by [Contour::compute_mass_geometry].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    vertices: Vec<Vector2<f64>>,
    velocity: Vec<Vector2<f64>>,
    prev_velocity: Vec<Vector2<f64>>,
    rest_length: Vec<f64>,
    fixation: Vec<u8>,
    center: Vector2<i64>,
    radius: f64,
    radius_min: f64,
    initial_spring_length: f64,
    geometry: MassGeometry,
    history: RadiusHistory,
    /// Opaque lineage information
    pub lineage: Lineage,
}

impl Contour {
    /// Creates a regular polygon with `n_vertices` corners on a circle around `center`.
    ///
    /// The vertices are placed at the angles
    /// \\[
    ///     \varphi\_i = \frac{2\pi i}{N}
    /// \\]
    /// and all rest lengths are set to the chord length
    /// \\[
    ///     l\_0 = r\sqrt{(\cos(2\pi/N) - 1)^2 + \sin^2(2\pi/N)}
    /// \\]
    /// so that the contour starts in equilibrium.
    /// ```
    /// # use cellular_balloon_building_blocks::Contour;
    /// let contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
    /// assert_eq!(contour.len(), 12);
    /// assert_eq!(contour.center(), [50, 50]);
    /// # Result::<(), cellular_balloon_concepts::SetupError>::Ok(())
    /// ```
    pub fn from_seed(
        center: impl Into<Vector2<f64>>,
        radius: f64,
        n_vertices: usize,
    ) -> Result<Self, SetupError> {
        if n_vertices < 3 {
            return Err(SetupError(format!(
                "A contour needs at least 3 vertices but {n_vertices} were requested"
            )));
        }
        if !(radius > 0.0) {
            return Err(SetupError(format!(
                "The seed radius must be positive but got {radius}"
            )));
        }
        let center = center.into();
        let angle_fraction = 2.0 * std::f64::consts::PI / n_vertices as f64;
        let vertices = (0..n_vertices)
            .map(|n| {
                let angle = angle_fraction * n as f64;
                Vector2::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                )
            })
            .collect::<Vec<_>>();
        let chord_length = radius
            * ((angle_fraction.cos() - 1.0).powi(2) + angle_fraction.sin().powi(2)).sqrt();
        let mut contour = Self::with_vertices(vertices, vec![chord_length; n_vertices]);
        contour.center = pixel_of(&center).into();
        contour.initial_spring_length = chord_length;
        contour.refresh_radius_bounds();
        Ok(contour)
    }

    /// Creates a regular polygon around `center` with the seed radius and vertex count of the
    /// given parameters.
    pub fn from_parameters(
        center: impl Into<Vector2<f64>>,
        parameters: &crate::BalloonParameters,
    ) -> Result<Self, SetupError> {
        parameters.validate()?;
        Ok(Self::from_seed(
            center,
            parameters.initial_radius,
            parameters.initial_vertex_count,
        )?
        .with_history_length(parameters.history_length))
    }

    /// Creates a contour from externally supplied vertex coordinates, eg. a stored shape.
    ///
    /// Velocities and fixations start at zero and each rest length is set to the current length
    /// of its segment.
    /// The mass geometry is computed right away.
    /// ```
    /// # use cellular_balloon_building_blocks::Contour;
    /// let contour = Contour::from_points([[0.0, 0.0], [20.0, 0.0], [20.0, 20.0], [0.0, 20.0]])?;
    /// assert_eq!(contour.rest_lengths(), &[20.0; 4]);
    /// assert_eq!(contour.geometry().area, 400.0);
    /// # Result::<(), cellular_balloon_concepts::SetupError>::Ok(())
    /// ```
    pub fn from_points<P>(points: impl IntoIterator<Item = P>) -> Result<Self, SetupError>
    where
        P: Into<Vector2<f64>>,
    {
        let vertices = points.into_iter().map(Into::into).collect::<Vec<_>>();
        let n_vertices = vertices.len();
        if n_vertices < 3 {
            return Err(SetupError(format!(
                "A contour needs at least 3 vertices but only {n_vertices} points were given"
            )));
        }
        let mut contour = Self::with_vertices(vertices, vec![0.0; n_vertices]);
        contour.reset_rest_lengths();
        contour.initial_spring_length =
            contour.rest_length.iter().sum::<f64>() / n_vertices as f64;
        contour.update_center_estimate();
        contour.refresh_radius_bounds();
        contour.compute_mass_geometry();
        Ok(contour)
    }

    /// Replaces the convergence history by a new one of the given length.
    pub fn with_history_length(mut self, history_length: usize) -> Self {
        self.history = RadiusHistory::new(history_length);
        self
    }

    /// Allocates all auxiliary arrays for the given vertices with neutral values.
    fn with_vertices(vertices: Vec<Vector2<f64>>, rest_length: Vec<f64>) -> Self {
        let n_vertices = vertices.len();
        Contour {
            vertices,
            velocity: vec![Vector2::zeros(); n_vertices],
            prev_velocity: vec![Vector2::zeros(); n_vertices],
            rest_length,
            fixation: vec![0; n_vertices],
            center: Vector2::zeros(),
            radius: 0.0,
            radius_min: 0.0,
            initial_spring_length: 0.0,
            geometry: MassGeometry::default(),
            history: RadiusHistory::new(DEFAULT_HISTORY_LENGTH),
            lineage: Lineage::default(),
        }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false for a correctly constructed contour.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Index of the predecessor of vertex `i`.
    pub fn prev(&self, i: usize) -> usize {
        let n = self.len();
        (i + n - 1) % n
    }

    /// Index of the successor of vertex `i`.
    pub fn next(&self, i: usize) -> usize {
        (i + 1) % self.len()
    }

    /// Index of the predecessor of the predecessor of vertex `i`.
    pub fn prev_prev(&self, i: usize) -> usize {
        let n = self.len();
        (i + 2 * n - 2) % n
    }

    /// Index of the successor of the successor of vertex `i`.
    pub fn next_next(&self, i: usize) -> usize {
        (i + 2) % self.len()
    }

    /// Euclidean distance between vertex `i` and its successor.
    pub fn segment_length(&self, i: usize) -> f64 {
        (self.vertices[self.next(i)] - self.vertices[i % self.len()]).norm()
    }

    /// Vertex positions in order.
    pub fn vertices(&self) -> &[Vector2<f64>] {
        &self.vertices
    }

    /// Velocities computed in the last step.
    pub fn velocity(&self) -> &[Vector2<f64>] {
        &self.velocity
    }

    /// Velocities which enter the next step.
    pub fn prev_velocity(&self) -> &[Vector2<f64>] {
        &self.prev_velocity
    }

    /// Rest length of the segment starting at each vertex.
    pub fn rest_lengths(&self) -> &[f64] {
        &self.rest_length
    }

    /// Fixation levels of all vertices.
    pub fn fixations(&self) -> &[u8] {
        &self.fixation
    }

    /// Integer position approximating the centroid.
    ///
    /// Updated from the mean vertex position by every advance and replaced by the exact
    /// centroid in [Contour::compute_mass_geometry].
    pub fn center(&self) -> [i64; 2] {
        [self.center.x, self.center.y]
    }

    /// Largest distance of a vertex to [Contour::center].
    ///
    /// This is a coarse hint for contact searches and not an exact radius.
    pub fn radius_estimate(&self) -> f64 {
        self.radius
    }

    /// Smallest distance of a vertex to [Contour::center].
    pub fn radius_min(&self) -> f64 {
        self.radius_min
    }

    /// Length of the springs of the initial polygon.
    ///
    /// For contours created from points this is the mean initial segment length.
    pub fn initial_spring_length(&self) -> f64 {
        self.initial_spring_length
    }

    /// Result of the last [Contour::compute_mass_geometry] call.
    pub fn geometry(&self) -> &MassGeometry {
        &self.geometry
    }

    /// Recent radius estimates.
    pub fn history(&self) -> &RadiusHistory {
        &self.history
    }

    /// Shifts all vertices by `(dx, dy)`.
    ///
    /// The center is re-estimated from the moved vertices so that repeated sub-pixel shifts do
    /// not accumulate rounding errors.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        let shift = Vector2::new(dx, dy);
        self.vertices.iter_mut().for_each(|v| *v += shift);
        self.update_center_estimate();
        self.geometry.centroid += shift;
    }

    /// Moves the contour such that its center lands on `target`.
    pub fn translate_to(&mut self, target: [i64; 2]) {
        let dx = (target[0] - self.center.x) as f64;
        let dy = (target[1] - self.center.y) as f64;
        self.translate(dx, dy);
    }

    /// Checks a vertex index.
    fn check_index(&self, i: usize) -> Result<(), IndexError> {
        if i < self.len() {
            Ok(())
        } else {
            Err(IndexError(format!(
                "Vertex index {i} is out of range for contour with {} vertices",
                self.len()
            )))
        }
    }

    /// Marks vertex `i` as being in soft contact.
    ///
    /// During the next advance its force is projected onto one of its edges and the fixation is
    /// released afterwards.
    pub fn fix(&mut self, i: usize) -> Result<(), IndexError> {
        self.check_index(i)?;
        self.fixation[i] = SOFT_FIXATION;
        Ok(())
    }

    /// Encastres vertex `i`. It will never be moved by the engine again.
    pub fn encastre(&mut self, i: usize) -> Result<(), IndexError> {
        self.check_index(i)?;
        self.fixation[i] = HARD_FIXATION;
        Ok(())
    }

    /// Fixation level of vertex `i`.
    pub fn fixation(&self, i: usize) -> Result<u8, IndexError> {
        self.check_index(i)?;
        Ok(self.fixation[i])
    }

    /// True if vertex `i` is encastred.
    pub fn is_encastred(&self, i: usize) -> bool {
        self.fixation.get(i).is_some_and(|&f| f >= HARD_FIXATION)
    }

    /// Prepares the contour for [Contour::advance_optimize].
    ///
    /// Rest lengths are set to the current segment lengths, all velocities are zeroed and every
    /// fixation is released.
    pub fn reset_for_optimization(&mut self) {
        self.reset_rest_lengths();
        self.velocity.fill(Vector2::zeros());
        self.prev_velocity.fill(Vector2::zeros());
        self.fixation.fill(0);
    }

    /// Sets every rest length to the current length of its segment.
    fn reset_rest_lengths(&mut self) {
        self.rest_length = self
            .vertices
            .iter()
            .circular_tuple_windows()
            .map(|(p1, p2)| (p2 - p1).norm())
            .collect();
    }

    /// Verifies that the per-vertex arrays agree in length and describe a usable polygon.
    pub fn check_consistency(&self) -> Result<(), IndexError> {
        let n = self.vertices.len();
        if n < 3 {
            return Err(IndexError(format!(
                "Contour has {n} vertices but needs at least 3"
            )));
        }
        let lengths = [
            ("velocity", self.velocity.len()),
            ("prev_velocity", self.prev_velocity.len()),
            ("rest_length", self.rest_length.len()),
            ("fixation", self.fixation.len()),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(IndexError(format!(
                    "Array {name} has length {len} but the contour has {n} vertices"
                )));
            }
        }
        Ok(())
    }

    /// Panics if [Contour::check_consistency] fails.
    ///
    /// Advancing an inconsistent contour would silently corrupt its geometry.
    fn assert_consistency(&self) {
        if let Err(error) = self.check_consistency() {
            panic!(
                "{}",
                cellular_balloon_concepts::format_error_message!(
                    "inconsistent contour",
                    error.to_string()
                )
            );
        }
    }

    /// Sets the center to the rounded mean vertex position.
    fn update_center_estimate(&mut self) {
        let mean = self.vertices.iter().sum::<Vector2<f64>>() / self.len() as f64;
        self.center = pixel_of(&mean).into();
    }

    /// Recomputes the largest and smallest vertex distance to the center.
    fn refresh_radius_bounds(&mut self) {
        let center = self.center.cast::<f64>();
        let (radius_min, radius) = self
            .vertices
            .iter()
            .map(|v| (v - center).norm())
            .fold((f64::INFINITY, 0.0_f64), |(min, max), d| {
                (min.min(d), max.max(d))
            });
        self.radius = radius;
        self.radius_min = radius_min;
    }

    /// Bookkeeping at the end of every advance.
    fn finish_step(&mut self) {
        self.update_center_estimate();
        self.refresh_radius_bounds();
        self.history.push(self.radius);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn seed_is_regular() -> Result<(), SetupError> {
        let contour = Contour::from_seed([10.0, 20.0], 5.0, 8)?;
        assert_eq!(contour.len(), 8);
        for v in contour.vertices() {
            assert_abs_diff_eq!((v - Vector2::new(10.0, 20.0)).norm(), 5.0, epsilon = 1e-12);
        }
        for i in 0..contour.len() {
            assert_abs_diff_eq!(
                contour.segment_length(i),
                contour.rest_lengths()[i],
                epsilon = 1e-12
            );
        }
        assert_abs_diff_eq!(contour.radius_estimate(), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(contour.radius_min(), 5.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn seed_requires_three_vertices() {
        assert!(Contour::from_seed([0.0, 0.0], 5.0, 2).is_err());
        assert!(Contour::from_seed([0.0, 0.0], 0.0, 5).is_err());
        assert!(Contour::from_points([[0.0, 0.0], [1.0, 1.0]]).is_err());
    }

    #[test]
    fn neighbour_indices_wrap() -> Result<(), SetupError> {
        let contour = Contour::from_seed([0.0, 0.0], 5.0, 5)?;
        assert_eq!(contour.prev(0), 4);
        assert_eq!(contour.next(4), 0);
        assert_eq!(contour.prev_prev(1), 4);
        assert_eq!(contour.prev_prev(0), 3);
        assert_eq!(contour.next_next(3), 0);
        assert_eq!(contour.next_next(4), 1);
        Ok(())
    }

    #[test]
    fn from_points_starts_in_equilibrium() -> Result<(), SetupError> {
        let contour = Contour::from_points([[0.0, 0.0], [30.0, 0.0], [30.0, 10.0], [0.0, 10.0]])?;
        assert_eq!(contour.rest_lengths(), &[30.0, 10.0, 30.0, 10.0]);
        assert!(contour.velocity().iter().all(|v| v == &Vector2::zeros()));
        assert!(contour.fixations().iter().all(|&f| f == 0));
        assert_eq!(contour.initial_spring_length(), 20.0);
        Ok(())
    }

    #[test]
    fn translate_moves_vertices_and_center() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        let before = contour.vertices().to_vec();
        contour.translate(3.0, -4.0);
        assert_eq!(contour.center(), [53, 46]);
        for (a, b) in before.iter().zip(contour.vertices()) {
            assert_eq!(b - a, Vector2::new(3.0, -4.0));
        }
        contour.translate_to([0, 0]);
        assert_eq!(contour.center(), [0, 0]);
        Ok(())
    }

    #[test]
    fn fractional_translations_keep_center_on_contour() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        let rounded_mean = |contour: &Contour| {
            let mean = contour.vertices().iter().sum::<Vector2<f64>>() / contour.len() as f64;
            pixel_of(&mean)
        };
        for _ in 0..4 {
            contour.translate(0.5, 0.5);
        }
        assert_eq!(contour.center(), rounded_mean(&contour));
        assert_eq!(contour.center(), [52, 52]);
        for _ in 0..10 {
            contour.translate(0.4, 0.0);
        }
        assert_eq!(contour.center(), rounded_mean(&contour));
        assert_eq!(contour.center(), [56, 52]);
        Ok(())
    }

    #[test]
    fn from_points_measures_radii_from_one_center() -> Result<(), SetupError> {
        let contour = Contour::from_points([[0.0, 0.0], [30.0, 0.0], [30.0, 10.0], [0.0, 10.0]])?;
        let centroid = contour.geometry().centroid;
        let distances = contour
            .vertices()
            .iter()
            .map(|v| (v - centroid).norm())
            .collect::<Vec<_>>();
        let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
        let max = distances.iter().copied().fold(0.0, f64::max);
        assert_eq!(contour.radius_min(), min);
        assert_eq!(contour.radius_estimate(), max);
        Ok(())
    }

    #[test]
    fn fix_and_encastre_vertices() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        contour.fix(2)?;
        contour.encastre(5)?;
        assert_eq!(contour.fixation(2)?, SOFT_FIXATION);
        assert!(contour.is_encastred(5));
        assert!(!contour.is_encastred(2));
        assert!(contour.fix(12).is_err());
        assert!(contour.encastre(100).is_err());
        Ok(())
    }

    #[test]
    fn reset_for_optimization_releases_everything() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        contour.encastre(0)?;
        contour.translate(1.0, 1.0);
        contour.reset_for_optimization();
        assert!(contour.fixations().iter().all(|&f| f == 0));
        assert!(contour.prev_velocity().iter().all(|v| v == &Vector2::zeros()));
        for i in 0..contour.len() {
            assert_eq!(contour.rest_lengths()[i], contour.segment_length(i));
        }
        Ok(())
    }

    #[test]
    fn serialize_lineage() {
        use serde_test::{assert_tokens, Token};
        let lineage = Lineage {
            id: 4,
            mother_id: Some(1),
            generation: 2,
            line_id: None,
            division_line: None,
        };
        assert_tokens(
            &lineage,
            &[
                Token::Struct {
                    name: "Lineage",
                    len: 5,
                },
                Token::Str("id"),
                Token::U64(4),
                Token::Str("mother_id"),
                Token::Some,
                Token::U64(1),
                Token::Str("generation"),
                Token::U32(2),
                Token::Str("line_id"),
                Token::None,
                Token::Str("division_line"),
                Token::None,
                Token::StructEnd,
            ],
        );
    }
}
