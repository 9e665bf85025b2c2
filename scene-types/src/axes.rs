//! Axis-convention mapping between the source document frame and the
//! renderer frame.
//!
//! Robot descriptions use a right-handed Z-up frame; the target renderer is
//! left-handed Y-up. The functions here are the only place in the pipeline
//! where the permutation, handedness flip, and fixed angular offsets live.
//! Callers apply them exactly once per quantity: a visual origin and the
//! mesh fragments beneath it are each mapped in their own local frame, and
//! the renderer composes parent transforms hierarchically.
//!
//! Targeting a renderer with a different convention means editing this
//! module and nothing else.

use std::f64::consts::FRAC_PI_2;

use nalgebra::Vector3;

/// Map a position from the source frame into the renderer frame.
///
/// `(x, y, z) -> (-y, z, x)`
///
/// # Example
///
/// ```
/// use nalgebra::Vector3;
/// use scene_types::axes::map_position;
///
/// let p = map_position(Vector3::new(1.0, 2.0, 3.0));
/// assert_eq!(p, Vector3::new(-2.0, 3.0, 1.0));
/// ```
#[inline]
#[must_use]
pub fn map_position(p: Vector3<f64>) -> Vector3<f64> {
    Vector3::new(-p.y, p.z, p.x)
}

/// Inverse of [`map_position`].
///
/// `(x, y, z) -> (z, -x, y)`
#[inline]
#[must_use]
pub fn unmap_position(p: Vector3<f64>) -> Vector3<f64> {
    Vector3::new(p.z, -p.x, p.y)
}

/// Map roll/pitch/yaw Euler angles from the source frame into the renderer
/// frame.
///
/// `(r, p, y) -> (y, p, -r)`
#[inline]
#[must_use]
pub fn map_euler(r: Vector3<f64>) -> Vector3<f64> {
    Vector3::new(r.z, r.y, -r.x)
}

/// Map the rotation of a visual origin.
///
/// Applies [`map_euler`] plus the fixed yaw offset that aligns the asset
/// library's authored forward axis with the renderer's.
#[inline]
#[must_use]
pub fn map_visual_euler(r: Vector3<f64>) -> Vector3<f64> {
    map_euler(r) + Vector3::new(0.0, FRAC_PI_2, 0.0)
}

/// Map a mesh-local rotation recovered from a node-transform decomposition.
///
/// Applies [`map_euler`] plus the fixed offsets that align mesh-library
/// authoring orientation with the renderer frame.
#[inline]
#[must_use]
pub fn map_mesh_euler(r: Vector3<f64>) -> Vector3<f64> {
    map_euler(r) + Vector3::new(-FRAC_PI_2, 0.0, FRAC_PI_2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn position_mapping_permutes_and_negates() {
        let p = map_position(Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(p.x, -2.0);
        assert_relative_eq!(p.y, 3.0);
        assert_relative_eq!(p.z, 1.0);
    }

    #[test]
    fn position_mapping_round_trips() {
        let p = Vector3::new(0.25, -1.5, 7.125);
        let back = unmap_position(map_position(p));
        assert_relative_eq!(back.x, p.x);
        assert_relative_eq!(back.y, p.y);
        assert_relative_eq!(back.z, p.z);
    }

    #[test]
    fn position_mapping_is_not_identity() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert_ne!(map_position(p), p);
    }

    #[test]
    fn euler_mapping_swaps_and_negates() {
        let r = map_euler(Vector3::new(0.1, 0.2, 0.3));
        assert_relative_eq!(r.x, 0.3);
        assert_relative_eq!(r.y, 0.2);
        assert_relative_eq!(r.z, -0.1);
    }

    #[test]
    fn mesh_euler_offsets_stay_in_range() {
        // Decomposed angles are in (-pi, pi]; the offsets must not push any
        // component to 2*pi or beyond, or validation would reject the scene.
        let r = map_mesh_euler(Vector3::new(std::f64::consts::PI, 0.0, -std::f64::consts::PI));
        for c in &r {
            assert!(c.abs() < 2.0 * std::f64::consts::PI);
        }
    }
}
