use cellular_balloon_concepts::{GradientField, IntensityField};
use nalgebra::Vector2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{Contour, HARD_FIXATION, SOFT_FIXATION};
use crate::math::{normalize, outward_normal, pixel_of, signed_angle};
use crate::BalloonParameters;

/// Edges and normal in the neighbourhood of one vertex.
///
/// ```text
///  prev_prev ---- prev ---- i ---- next ---- next_next
///                  prev_edge  next_edge
/// ```
struct LocalFrame {
    prev_edge: Vector2<f64>,
    next_edge: Vector2<f64>,
    prev_length: f64,
    next_length: f64,
    normal: Vector2<f64>,
}

/// How velocities are turned into displacements.
struct Integrator {
    viscosity: f64,
    time_scale: f64,
    max_displacement: Option<f64>,
}

impl Contour {
    /// Gathers the edges adjacent to vertex `i` and the unnormalized normal of their mean.
    fn local_frame(&self, i: usize) -> LocalFrame {
        let pos_prev = self.vertices[self.prev(i)];
        let pos_curr = self.vertices[i];
        let pos_next = self.vertices[self.next(i)];
        let prev_edge = pos_curr - pos_prev;
        let next_edge = pos_next - pos_curr;
        let tangent = (prev_edge + next_edge) * 0.5;
        LocalFrame {
            prev_length: prev_edge.norm(),
            next_length: next_edge.norm(),
            prev_edge,
            next_edge,
            normal: outward_normal(&tangent),
        }
    }

    /// One-sided spring force acting on vertex `i`.
    ///
    /// With $\Delta\_1 = k(|\vec{e}\_1| - l\_{i-1})$ and $\Delta\_2 = k(|\vec{e}\_2| - l\_i)$ the force
    /// \\[
    ///     \vec{F} = \Delta\_2\vec{e}\_2 - \Delta\_1\vec{e}\_1
    /// \\]
    /// only acts when both springs are stretched. Compressed springs do not push back.
    fn spring_force(
        &self,
        i: usize,
        frame: &LocalFrame,
        parameters: &BalloonParameters,
    ) -> Vector2<f64> {
        let stretch_prev =
            (frame.prev_length - self.rest_length[self.prev(i)]) * parameters.stiffness;
        let stretch_next = (frame.next_length - self.rest_length[i]) * parameters.stiffness;
        if stretch_prev > 0.0 && stretch_next > 0.0 {
            frame.next_edge * stretch_next - frame.prev_edge * stretch_prev
        } else {
            Vector2::zeros()
        }
    }

    /// Cubed turn angle at vertex `i` scaled by the bending prefactor.
    fn turn_moment(&self, i: usize, parameters: &BalloonParameters) -> f64 {
        let pos = self.vertices[i];
        let to_next = self.vertices[self.next(i)] - pos;
        let to_prev = self.vertices[self.prev(i)] - pos;
        let turn = std::f64::consts::PI - signed_angle(&to_next, &to_prev);
        turn.powi(3) * parameters.bending_scale
    }

    /// Discrete curvature penalty at vertex `i` or [None] if the vertex is too sharp.
    ///
    /// A vertex is considered too sharp if
    /// \\[
    ///     \frac{r\_\text{min}}{|\bar{l}\cos(\pi - \varphi\_i)|} > s
    /// \\]
    /// where $\bar{l}$ is the mean length of both adjacent edges.
    /// In this case the vertex is snapped onto the midpoint of its neighbours and its velocity
    /// history is erased.
    fn bending_force_or_snap(
        &mut self,
        i: usize,
        frame: &LocalFrame,
        parameters: &BalloonParameters,
    ) -> Option<Vector2<f64>> {
        let mean_length = 0.5 * (frame.prev_length + frame.next_length);
        let pos = self.vertices[i];
        let to_next = self.vertices[self.next(i)] - pos;
        let to_prev = self.vertices[self.prev(i)] - pos;
        let turn = std::f64::consts::PI - signed_angle(&to_next, &to_prev);
        let sharpness = self.radius_min / (mean_length * turn.cos()).abs();
        // A vanishing denominator yields inf (snap) or NaN (also snap)
        if !(sharpness <= parameters.sharpness_threshold) {
            let midpoint = 0.5 * (self.vertices[self.prev(i)] + self.vertices[self.next(i)]);
            self.vertices[i] = midpoint;
            self.prev_velocity[i] = Vector2::zeros();
            return None;
        }
        let moment_prev = self.turn_moment(self.prev(i), parameters);
        let moment_curr = turn.powi(3) * parameters.bending_scale;
        let moment_next = self.turn_moment(self.next(i), parameters);
        Some(
            frame.normal * parameters.bending_stiffness
                * (moment_next + moment_prev - 2.0 * moment_curr)
                / mean_length,
        )
    }

    /// Lets a softly fixed vertex slide along one of its edges and releases it afterwards.
    fn resolve_soft_fixation(
        &mut self,
        i: usize,
        force: Vector2<f64>,
        frame: &LocalFrame,
    ) -> Vector2<f64> {
        if self.fixation[i] < SOFT_FIXATION || self.fixation[i] >= HARD_FIXATION {
            return force;
        }
        self.fixation[i] = 0;
        let direction = if force.dot(&frame.next_edge) > 0.0 {
            normalize(&frame.next_edge)
        } else {
            normalize(&frame.prev_edge)
        };
        direction * force.dot(&direction)
    }

    /// Damped point mass update of vertex `i`.
    ///
    /// \\begin{align}
    ///     \vec{v}\_i(t) &= \vec{v}\_i(t-\Delta t) + \left(\vec{F}\_i - \lambda\vec{v}\_i(t-\Delta t)\right)\frac{\Delta t}{m}c\\\\
    ///     \vec{x}\_i(t+\Delta t) &= \vec{x}\_i(t) + \vec{v}\_i(t)\Delta t
    /// \\end{align}
    fn integrate(
        &mut self,
        i: usize,
        force: Vector2<f64>,
        integrator: &Integrator,
        parameters: &BalloonParameters,
    ) {
        let prev_velocity = self.prev_velocity[i];
        let velocity = prev_velocity
            + (force - prev_velocity * integrator.viscosity) * parameters.dt / parameters.mass
                * integrator.time_scale;
        let mut displacement = velocity * parameters.dt;
        if let Some(limit) = integrator.max_displacement {
            displacement = displacement.map(|d| d.min(limit));
        }
        self.vertices[i] += displacement;
        self.velocity[i] = velocity;
        self.prev_velocity[i] = velocity;
    }

    /// Performs one inflation step.
    ///
    /// Every vertex which is not encastred is visited once in order and updated in place, so
    /// later vertices already see the new positions of earlier ones.
    /// The force acting on vertex $i$ consists of
    ///
    /// | Contribution | Expression |
    /// | --- | --- |
    /// | Pressure | $p\max(I\_0 - I(\vec{x}\_i), 0)\vec{n}\_i$ |
    /// | Springs | see the one-sided spring model below |
    /// | Bending | $\frac{\eta}{\bar{l}}(M\_{i-1} - 2M\_i + M\_{i+1})\vec{n}\_i$ with $M\_j = c\_b(\pi-\varphi\_j)^3$ |
    ///
    /// Springs only act when both springs adjacent to a vertex are stretched.
    /// During inflation the rest length of every spring drifts towards its current length with
    /// the rate $\alpha$.
    /// After all vertices have been moved the center and the radius estimates are refreshed and
    /// the radius is pushed into the [history](Contour::history).
    ///
    /// # Panics
    /// If the contour has fewer than 3 vertices or inconsistent vertex arrays.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn advance_inflate<F>(&mut self, field: &F, parameters: &BalloonParameters)
    where
        F: IntensityField + ?Sized,
    {
        self.assert_consistency();
        let integrator = Integrator {
            viscosity: parameters.viscosity,
            time_scale: 1.0,
            max_displacement: None,
        };
        for i in 0..self.len() {
            if self.fixation[i] >= HARD_FIXATION {
                continue;
            }
            let frame = self.local_frame(i);
            let [px, py] = pixel_of(&self.vertices[i]);
            let pressure = (parameters.target_level - field.intensity_at(px, py)).max(0.0)
                * parameters.pressure_ratio;
            let mut force = frame.normal * pressure + self.spring_force(i, &frame, parameters);
            self.rest_length[i] +=
                (frame.next_length - self.rest_length[i]) * parameters.plasticity;
            force = match self.bending_force_or_snap(i, &frame, parameters) {
                Some(bending) => force + bending,
                None => Vector2::zeros(),
            };
            let force = self.resolve_soft_fixation(i, force, &frame);
            self.integrate(i, force, &integrator, parameters);
        }
        self.finish_step();
    }

    /// Performs one refinement step along the image gradient (snake).
    ///
    /// Vertices are first clamped to $[0, w-1]\times[0, h-1]$ where $(w, h)$ are the
    /// [dimensions](GradientField::dimensions) of the field.
    /// Touching or crossing the boundary marks the vertex as out of bounds.
    /// A fixed vertex which is out of bounds stays where it is while a fixed vertex inside the
    /// image may still move.
    /// Encastred vertices are neither clamped nor moved.
    ///
    /// The external force is $-p(\vec{g}\_+ - \vec{g}\_-)$.
    /// Springs and bending act as in [Contour::advance_inflate] but rest lengths are frozen.
    /// The viscosity is multiplied by the optimization damping factor, the time increment by the
    /// optimization time scale and each displacement component is bounded from above by the
    /// optimization step fraction of the [initial spring length](Contour::initial_spring_length).
    ///
    /// # Panics
    /// If the contour has fewer than 3 vertices or inconsistent vertex arrays.
    #[cfg_attr(feature = "tracing", instrument(skip_all))]
    pub fn advance_optimize<G>(&mut self, field: &G, parameters: &BalloonParameters)
    where
        G: GradientField + ?Sized,
    {
        self.assert_consistency();
        let (width, height) = field.dimensions();
        let upper = Vector2::new(
            width.saturating_sub(1) as f64,
            height.saturating_sub(1) as f64,
        );
        let integrator = Integrator {
            viscosity: parameters.viscosity * parameters.optimization_damping_factor,
            time_scale: parameters.optimization_time_scale,
            max_displacement: Some(
                parameters.optimization_step_fraction * self.initial_spring_length,
            ),
        };
        for i in 0..self.len() {
            if self.fixation[i] >= HARD_FIXATION {
                continue;
            }
            let mut out_of_bounds = false;
            for (coordinate, bound) in self.vertices[i].iter_mut().zip(upper.iter()) {
                if *coordinate <= 0.0 {
                    *coordinate = 0.0;
                    out_of_bounds = true;
                }
                if *coordinate >= *bound {
                    *coordinate = *bound;
                    out_of_bounds = true;
                }
            }
            if self.fixation[i] >= SOFT_FIXATION && out_of_bounds {
                continue;
            }
            let frame = self.local_frame(i);
            let [px, py] = pixel_of(&self.vertices[i]);
            let [gx, gy] = field.gradient_at(px, py).difference();
            let external = -Vector2::new(gx, gy) * parameters.pressure_ratio;
            let mut force = external + self.spring_force(i, &frame, parameters);
            force = match self.bending_force_or_snap(i, &frame, parameters) {
                Some(bending) => force + bending,
                None => Vector2::zeros(),
            };
            let force = self.resolve_soft_fixation(i, force, &frame);
            self.integrate(i, force, &integrator, parameters);
        }
        self.finish_step();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cellular_balloon_concepts::{GradientSample, SetupError};

    struct FlatGradient {
        sample: GradientSample,
        width: usize,
        height: usize,
    }

    impl GradientField for FlatGradient {
        fn gradient_at(&self, _x: i64, _y: i64) -> GradientSample {
            self.sample
        }

        fn dimensions(&self) -> (usize, usize) {
            (self.width, self.height)
        }
    }

    fn constant(level: f64) -> impl Fn(i64, i64) -> f64 {
        move |_, _| level
    }

    fn inflating_parameters() -> BalloonParameters {
        BalloonParameters {
            target_level: 100.0,
            ..Default::default()
        }
    }

    #[test]
    fn pressure_pushes_outwards() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        let center = Vector2::new(50.0, 50.0);
        let before = contour.vertices().to_vec();
        contour.advance_inflate(&constant(0.0), &inflating_parameters());
        for (old, new) in before.iter().zip(contour.vertices()) {
            assert!((new - center).norm() > (old - center).norm());
        }
        Ok(())
    }

    #[test]
    fn bright_field_does_not_inflate() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        let before = contour.vertices().to_vec();
        contour.advance_inflate(&constant(255.0), &inflating_parameters());
        for (old, new) in before.iter().zip(contour.vertices()) {
            assert!((new - old).norm() < 1e-9);
        }
        Ok(())
    }

    #[test]
    fn plasticity_relaxes_rest_lengths() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        let initial = contour.rest_lengths().to_vec();
        for _ in 0..20 {
            contour.advance_inflate(&constant(0.0), &inflating_parameters());
        }
        let grown = contour
            .rest_lengths()
            .iter()
            .zip(initial.iter())
            .all(|(new, old)| new > old);
        assert!(grown);
        Ok(())
    }

    #[test]
    fn encastred_vertex_is_untouched() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        contour.encastre(3)?;
        let pinned = contour.vertices()[3];
        for _ in 0..5 {
            contour.advance_inflate(&constant(0.0), &inflating_parameters());
        }
        assert_eq!(contour.vertices()[3], pinned);
        assert_eq!(contour.fixation(3)?, HARD_FIXATION);
        Ok(())
    }

    #[test]
    fn soft_fixation_is_released_after_one_step() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        contour.fix(0)?;
        let before = contour.vertices()[0];
        let prev_edge = before - contour.vertices()[11];
        contour.advance_inflate(&constant(0.0), &inflating_parameters());
        assert_eq!(contour.fixation(0)?, 0);
        // The vertex slides along the edge towards its predecessor
        let displacement = contour.vertices()[0] - before;
        assert!(displacement.norm() > 0.0);
        assert!(displacement.perp(&prev_edge).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn history_receives_one_value_per_step() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        contour.advance_inflate(&constant(0.0), &inflating_parameters());
        contour.advance_inflate(&constant(0.0), &inflating_parameters());
        assert_eq!(contour.history().len(), 30);
        assert_eq!(contour.history().newest(), Some(contour.radius_estimate()));
        assert!(contour.radius_estimate() > 10.0);
        Ok(())
    }

    #[test]
    fn optimization_clamps_to_image() -> Result<(), SetupError> {
        // Vertex 0 sits at (60, 50) which lies beyond the last column of the image
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        contour.reset_for_optimization();
        let field = FlatGradient {
            sample: GradientSample::default(),
            width: 60,
            height: 100,
        };
        contour.advance_optimize(&field, &BalloonParameters::default());
        let clamped = contour.vertices()[0];
        assert!(clamped.x <= 59.0);
        assert!(clamped.x > 58.9);
        Ok(())
    }

    #[test]
    fn fixed_vertex_out_of_bounds_is_frozen() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([0.0, 20.0], 10.0, 12)?;
        contour.reset_for_optimization();
        // Vertex 6 sits at (-10, 20) and is clamped onto the left border
        contour.fix(6)?;
        let field = FlatGradient {
            sample: GradientSample {
                x_plus: 0.0,
                y_plus: 0.0,
                x_minus: 50.0,
                y_minus: 0.0,
            },
            width: 40,
            height: 40,
        };
        contour.advance_optimize(&field, &BalloonParameters::default());
        assert_eq!(contour.vertices()[6].x, 0.0);
        assert!((contour.vertices()[6].y - 20.0).abs() < 1e-9);
        assert_eq!(contour.fixation(6)?, SOFT_FIXATION);
        Ok(())
    }

    #[test]
    fn sharp_corner_snaps_to_neighbour_midpoint() -> Result<(), SetupError> {
        // The right angle at vertex 0 exceeds the sharpness threshold by far
        let mut contour = Contour::from_points([
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [5.0, 10.5],
            [0.0, 10.0],
        ])?;
        let midpoint = 0.5 * (contour.vertices()[4] + contour.vertices()[1]);
        contour.advance_inflate(&constant(255.0), &BalloonParameters::default());
        assert_eq!(contour.vertices()[0], midpoint);
        assert_eq!(contour.vertices()[0], Vector2::new(5.0, 5.0));
        assert_eq!(contour.prev_velocity()[0], Vector2::zeros());
        assert_eq!(contour.velocity()[0], Vector2::zeros());
        Ok(())
    }

    #[test]
    fn smooth_polygon_is_never_snapped() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 20.0, 64)?;
        let center = Vector2::new(50.0, 50.0);
        let before = contour.vertices().to_vec();
        contour.advance_inflate(&constant(0.0), &inflating_parameters());
        for (i, (old, new)) in before.iter().zip(contour.vertices()).enumerate() {
            // A snapped vertex would lose its velocity and move inwards
            assert!(contour.prev_velocity()[i].norm() > 0.0);
            assert!((new - center).norm() > (old - center).norm());
        }
        Ok(())
    }

    #[test]
    fn fixed_vertex_inside_image_slides() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        contour.reset_for_optimization();
        // Vertex 0 sits at (60, 50) well inside the image
        contour.fix(0)?;
        let before = contour.vertices()[0];
        let prev_edge = before - contour.vertices()[11];
        let field = FlatGradient {
            sample: GradientSample {
                x_plus: 0.0,
                y_plus: 0.0,
                x_minus: 50.0,
                y_minus: 0.0,
            },
            width: 100,
            height: 100,
        };
        contour.advance_optimize(&field, &BalloonParameters::default());
        let displacement = contour.vertices()[0] - before;
        assert!(displacement.norm() > 0.0);
        assert!(displacement.perp(&prev_edge).abs() < 1e-9);
        assert_eq!(contour.fixation(0)?, 0);
        Ok(())
    }

    #[test]
    fn optimization_step_is_bounded() -> Result<(), SetupError> {
        let mut contour = Contour::from_seed([50.0, 50.0], 10.0, 12)?;
        contour.reset_for_optimization();
        let field = FlatGradient {
            sample: GradientSample {
                x_plus: 0.0,
                y_plus: 0.0,
                x_minus: 1e6,
                y_minus: 1e6,
            },
            width: 100,
            height: 100,
        };
        let before = contour.vertices().to_vec();
        contour.advance_optimize(&field, &BalloonParameters::default());
        let limit = 0.05 * contour.initial_spring_length();
        for (old, new) in before.iter().zip(contour.vertices()) {
            let step = new - old;
            assert!(step.x <= limit + 1e-12);
            assert!(step.y <= limit + 1e-12);
            assert!(step.x > 0.0 && step.y > 0.0);
        }
        Ok(())
    }

    #[test]
    #[should_panic]
    fn advancing_degenerate_contour_panics() {
        let mut contour = Contour::from_seed([0.0, 0.0], 10.0, 3).unwrap();
        contour.vertices.truncate(2);
        contour.advance_inflate(&constant(0.0), &BalloonParameters::default());
    }
}
