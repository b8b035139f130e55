//! Pixel → world-frame projection of detected rift edges.
//!
//! The camera is modelled as a pinhole looking at a plane at constant
//! `standoff` distance.  One pixel then spans
//!
//! ```text
//! pixel_size = 2 * standoff * tan(horizontal_fov / 2) / image_width
//! ```
//!
//! metres on that plane.  Edge pixel `(row, col)` becomes the sensor-local
//! point `(row * pixel_size, -standoff, col * pixel_size)`, which the sensor
//! [`Pose`] rotates and translates into the world frame.
//!
//! # Example
//!
//! ```rust
//! use riftwalk_perception::edges::EdgePixel;
//! use riftwalk_perception::projector::FrameProjector;
//! use riftwalk_perception::transform::{Pose, Vec3};
//!
//! let projector = FrameProjector::new(std::f32::consts::FRAC_PI_2).unwrap();
//! let pose = Pose::from_euler(Vec3::new(0.0, 0.0, 1.0), 0.0, 0.0, 0.0);
//! let cloud = projector
//!     .project(&[EdgePixel { row: 2, col: 3 }], 1.0, &pose, 10)
//!     .unwrap();
//! let p = cloud.points()[0];
//! assert!((p.x - 0.4).abs() < 1e-5 && (p.y + 1.0).abs() < 1e-5 && (p.z - 1.6).abs() < 1e-5);
//! ```

use std::f32::consts::PI;

use riftwalk_types::{RiftError, WorldPoint, WorldPointSet};

use crate::edges::EdgePixel;
use crate::transform::{Pose, Vec3};

/// Default horizontal field of view of the forward camera (radians).
pub const DEFAULT_HORIZONTAL_FOV: f32 = 0.616;

/// Project `edges` onto the standoff plane and into the world frame.
///
/// Validation runs in this order: `image_width` and `horizontal_fov`, then
/// the empty-set short-circuit, then `standoff`.  An empty edge set is
/// therefore [`WorldPointSet::Empty`] even when no range data is available.
///
/// # Errors
///
/// Returns [`RiftError::InvalidGeometry`] when `image_width == 0`,
/// `horizontal_fov` is outside `(0, π)`, or (for a non-empty edge set)
/// `standoff` is not a finite positive distance.
pub fn project(
    edges: &[EdgePixel],
    standoff: f32,
    pose: &Pose,
    horizontal_fov: f32,
    image_width: u32,
) -> Result<WorldPointSet, RiftError> {
    if image_width == 0 {
        return Err(RiftError::InvalidGeometry("image width must be positive".to_string()));
    }
    validate_fov(horizontal_fov)?;
    if edges.is_empty() {
        return Ok(WorldPointSet::Empty);
    }
    if !standoff.is_finite() || standoff <= 0.0 {
        return Err(RiftError::InvalidGeometry(format!(
            "standoff distance must be positive, got {standoff}"
        )));
    }

    let pixel_size = 2.0 * standoff * (horizontal_fov / 2.0).tan() / image_width as f32;
    let points = edges
        .iter()
        .map(|px| {
            let local = Vec3::new(px.row as f32 * pixel_size, -standoff, px.col as f32 * pixel_size);
            let world = pose.transform_point(local);
            WorldPoint::new(world.x, world.y, world.z)
        })
        .collect();
    Ok(WorldPointSet::from_points(points))
}

fn validate_fov(horizontal_fov: f32) -> Result<(), RiftError> {
    if horizontal_fov.is_finite() && horizontal_fov > 0.0 && horizontal_fov < PI {
        Ok(())
    } else {
        Err(RiftError::InvalidGeometry(format!(
            "horizontal field of view must lie in (0, π), got {horizontal_fov}"
        )))
    }
}

/// [`project`] bound to a fixed camera field of view.
#[derive(Debug, Clone, Copy)]
pub struct FrameProjector {
    horizontal_fov: f32,
}

impl Default for FrameProjector {
    fn default() -> Self {
        Self {
            horizontal_fov: DEFAULT_HORIZONTAL_FOV,
        }
    }
}

impl FrameProjector {
    /// # Errors
    ///
    /// Returns [`RiftError::InvalidGeometry`] if `horizontal_fov` is outside
    /// `(0, π)`.
    pub fn new(horizontal_fov: f32) -> Result<Self, RiftError> {
        validate_fov(horizontal_fov)?;
        Ok(Self { horizontal_fov })
    }

    pub fn horizontal_fov(&self) -> f32 {
        self.horizontal_fov
    }

    pub fn project(
        &self,
        edges: &[EdgePixel],
        standoff: f32,
        pose: &Pose,
        image_width: u32,
    ) -> Result<WorldPointSet, RiftError> {
        project(edges, standoff, pose, self.horizontal_fov, image_width)
    }
}
