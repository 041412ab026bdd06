use cellular_balloon_concepts::SetupError;
use serde::{Deserialize, Serialize};

/// Physical and numerical parameters of a balloon contour.
///
/// # Parameters
/// | Symbol | Struct Field | Description |
/// | --- | --- | --- |
/// | $k$ | `stiffness` | Tension of the springs connecting neighbouring vertices. |
/// | $\alpha$ | `plasticity` | Rate at which rest lengths drift towards the current length. |
/// | $\eta$ | `bending_stiffness` | Stiffness of the rotational springs at each vertex. |
/// | $c_b$ | `bending_scale` | Prefactor applied to the cubed turn angle. |
/// | $s$ | `sharpness_threshold` | Curvature ratio above which a vertex is snapped instead of bent. |
/// | $w$ | `interface_width` | Width of the interface used by contact queries. |
/// | $m$ | `mass` | Mass of each vertex. |
/// | $\Delta t$ | `dt` | Time increment of a single step. |
/// | $\lambda$ | `viscosity` | Viscous damping of the vertex motion. |
/// | $p$ | `pressure_ratio` | Conversion from image signal to normal pressure. |
/// | $I_0$ | `target_level` | Intensity below which pixels push the contour outwards. |
///
/// The remaining fields configure seeding, remeshing and the refinement phase.
/// All fields fall back to their default value when they are missing in a configuration file.
/// ```
/// # use cellular_balloon_building_blocks::BalloonParameters;
/// let parameters = BalloonParameters::from_ron_str("(stiffness: 0.4, target_level: 120.0)")?;
/// assert_eq!(parameters.stiffness, 0.4);
/// assert_eq!(parameters.viscosity, BalloonParameters::default().viscosity);
/// # Result::<(), cellular_balloon_concepts::SetupError>::Ok(())
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalloonParameters {
    /// Spring stiffness $k$
    pub stiffness: f64,
    /// Plastic drift $\alpha$ of the rest lengths during inflation
    pub plasticity: f64,
    /// Bending stiffness $\eta$
    pub bending_stiffness: f64,
    /// Prefactor $c_b$ of the cubed turn angle
    pub bending_scale: f64,
    /// Threshold $s$ of the sharpness guard
    pub sharpness_threshold: f64,
    /// Interface width $w$ in pixels
    pub interface_width: f64,
    /// Vertex mass $m$
    pub mass: f64,
    /// Time increment $\Delta t$
    pub dt: f64,
    /// Viscous damping $\lambda$
    pub viscosity: f64,
    /// Pressure ratio $p$
    pub pressure_ratio: f64,
    /// Target intensity level $I_0$
    pub target_level: f64,
    /// Number of vertices of a freshly seeded contour
    pub initial_vertex_count: usize,
    /// Radius of a freshly seeded contour
    pub initial_radius: f64,
    /// Multiplier of the viscosity during refinement
    pub optimization_damping_factor: f64,
    /// Multiplier of the time increment during refinement
    pub optimization_time_scale: f64,
    /// Largest per-axis displacement during refinement relative to the initial spring length
    pub optimization_step_fraction: f64,
    /// Number of radius values kept in the convergence history
    pub history_length: usize,
    /// Segments longer than this are split by remeshing
    pub max_segment_length: f64,
}

impl Default for BalloonParameters {
    fn default() -> Self {
        Self {
            stiffness: 0.2,
            plasticity: 0.01,
            bending_stiffness: 0.05,
            bending_scale: 0.002,
            sharpness_threshold: 45.0,
            interface_width: 4.0,
            mass: 1.0,
            dt: 0.05,
            viscosity: 2.0,
            pressure_ratio: 0.05,
            target_level: 0.0,
            initial_vertex_count: 15,
            initial_radius: 4.0,
            optimization_damping_factor: 10.0,
            optimization_time_scale: 0.3,
            optimization_step_fraction: 0.05,
            history_length: 30,
            max_segment_length: 15.0,
        }
    }
}

impl BalloonParameters {
    /// Parses parameters from a [RON](https://docs.rs/ron) document and validates them.
    pub fn from_ron_str(input: &str) -> Result<Self, SetupError> {
        let parameters: Self = ron::from_str(input)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Parses parameters from a JSON document and validates them.
    pub fn from_json_str(input: &str) -> Result<Self, SetupError> {
        let parameters: Self = serde_json::from_str(input)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Writes the parameters as a pretty-printed RON document.
    pub fn to_ron_string(&self) -> Result<String, SetupError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Checks that all quantities which are divided by or used as sizes are positive.
    pub fn validate(&self) -> Result<(), SetupError> {
        let positive = [
            ("mass", self.mass),
            ("dt", self.dt),
            ("max_segment_length", self.max_segment_length),
            ("initial_radius", self.initial_radius),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(SetupError(format!(
                    "Parameter {name} must be positive but got {value}"
                )));
            }
        }
        if self.history_length == 0 {
            return Err(SetupError(
                "Parameter history_length must be at least 1".to_owned(),
            ));
        }
        if self.initial_vertex_count < 3 {
            return Err(SetupError(format!(
                "Parameter initial_vertex_count must be at least 3 but got {}",
                self.initial_vertex_count
            )));
        }
        Ok(())
    }
}
