//! Small vector helpers on top of [nalgebra] used by the contour engine.
//!
//! All functions are free of side effects and return freshly allocated values.
use nalgebra::{SVector, Vector2, Vector3};
use num::Zero;

/// Fallback angle returned by [signed_angle] when the angle cannot be resolved reliably.
pub const DEGENERATE_ANGLE: f64 = -std::f64::consts::PI;

/// Cosine below which two vectors are considered anti-parallel by [signed_angle].
pub const ANTIPARALLEL_COSINE: f64 = -0.98;

/// Out-of-plane axis used to rotate tangents into normals.
pub const OUT_OF_PLANE: [f64; 3] = [0.0, 0.0, -1.0];

/// Componentwise sum `a + b`.
pub fn add<const D: usize>(a: &SVector<f64, D>, b: &SVector<f64, D>) -> SVector<f64, D> {
    a + b
}

/// Componentwise difference `a - b`.
pub fn sub<const D: usize>(a: &SVector<f64, D>, b: &SVector<f64, D>) -> SVector<f64, D> {
    a - b
}

/// Multiplies every component of `a` by the scalar `s`.
pub fn scale<const D: usize>(a: &SVector<f64, D>, s: f64) -> SVector<f64, D> {
    a * s
}

/// Multiplies `a` and `b` component by component.
pub fn scale_elementwise<const D: usize>(
    a: &SVector<f64, D>,
    b: &SVector<f64, D>,
) -> SVector<f64, D> {
    a.component_mul(b)
}

/// Euclidean inner product.
pub fn dot<const D: usize>(a: &SVector<f64, D>, b: &SVector<f64, D>) -> f64 {
    a.dot(b)
}

/// Euclidean length.
pub fn norm<const D: usize>(a: &SVector<f64, D>) -> f64 {
    a.norm()
}

/// Unit vector in the direction of `a`.
///
/// A vector of zero length is returned unchanged instead of producing `NaN` components.
/// ```
/// # use cellular_balloon_building_blocks::math::normalize;
/// # use nalgebra::Vector2;
/// assert_eq!(normalize(&Vector2::new(3.0, 4.0)), Vector2::new(0.6, 0.8));
/// assert_eq!(normalize(&Vector2::<f64>::zeros()), Vector2::zeros());
/// ```
pub fn normalize<const D: usize>(a: &SVector<f64, D>) -> SVector<f64, D> {
    let length = a.norm();
    if length > 0.0 {
        a / length
    } else {
        SVector::<f64, D>::zero()
    }
}

/// Cross product of two three-component vectors given as slices.
///
/// Inputs of any other length are a programming error: a diagnostic is emitted and the zero
/// vector is returned.
pub fn cross(a: &[f64], b: &[f64]) -> Vector3<f64> {
    if a.len() != 3 || b.len() != 3 {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            len_a = a.len(),
            len_b = b.len(),
            "cross product is defined for three-component vectors only"
        );
        return Vector3::zeros();
    }
    Vector3::new(
        a[1] * b[2] - b[1] * a[2],
        a[2] * b[0] - b[2] * a[0],
        a[0] * b[1] - b[0] * a[1],
    )
}

/// Rotates an in-plane `tangent` by 90° with the cross product against [OUT_OF_PLANE].
///
/// For a contour traversed counter-clockwise (in a y-up frame) the result points outwards.
/// Its length equals the length of the tangent.
pub fn outward_normal(tangent: &Vector2<f64>) -> Vector2<f64> {
    let normal = cross(&OUT_OF_PLANE, &[tangent.x, tangent.y, 0.0]);
    Vector2::new(normal.x, normal.y)
}

/// Angle from `v` to `u` in `[0, 2π)`.
///
/// The sign of the 2D cross product `u × v` selects between `acos(c)` and `2π - acos(c)`.
/// When the cosine `c` drops below [ANTIPARALLEL_COSINE] (where `acos` becomes ill
/// conditioned) or one of the vectors has zero length, [DEGENERATE_ANGLE] is returned.
/// ```
/// # use cellular_balloon_building_blocks::math::*;
/// # use nalgebra::Vector2;
/// let right_angle = signed_angle(&Vector2::new(1.0, 0.0), &Vector2::new(0.0, 1.0));
/// assert!((right_angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// let straight = signed_angle(&Vector2::new(1.0, 0.0), &Vector2::new(-1.0, 0.0));
/// assert_eq!(straight, DEGENERATE_ANGLE);
/// ```
pub fn signed_angle(u: &Vector2<f64>, v: &Vector2<f64>) -> f64 {
    let lengths = u.norm() * v.norm();
    if lengths == 0.0 {
        return DEGENERATE_ANGLE;
    }
    let cosine = u.dot(v) / lengths;
    let sine = u.perp(v) / lengths;
    if cosine < ANTIPARALLEL_COSINE {
        DEGENERATE_ANGLE
    } else if sine >= 0.0 {
        cosine.clamp(-1.0, 1.0).acos()
    } else {
        2.0 * std::f64::consts::PI - cosine.clamp(-1.0, 1.0).acos()
    }
}
