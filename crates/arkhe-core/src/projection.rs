//! Perspective projection of world-space points onto a 2D viewport.
//!
//! Everything here is pure: a point and a [`ProjectionCamera`] map to a
//! [`Projected`] screen position plus the perspective scale factor used for
//! size and opacity falloff.
//!
//! # Precondition
//! `fov + rotated_z + viewer_distance` must stay well away from zero.
//! [`project`] does not check this; choosing `fov`/`viewer_distance` large
//! relative to the scene's z range is the caller's job
//! ([`crate::config::ArkheConfig::validate`] enforces it for the torus scene).

use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;

pub type Point3 = nalgebra::Point3<f64>;

/// Camera for a single frame. Rebuilt every frame, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionCamera {
    pub fov: f64,
    pub viewer_distance: f64,
    pub tilt_x: f64,
    pub tilt_y: f64,
    pub user_scale: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Time-derived torus spin, applied by the layout as a rotation offset.
    pub spin: f64,
}

impl ProjectionCamera {
    pub fn for_frame(cfg: &CameraConfig, width: u32, height: u32, time: f64) -> Self {
        Self {
            fov: cfg.fov,
            viewer_distance: cfg.viewer_distance,
            tilt_x: cfg.tilt_x,
            tilt_y: cfg.tilt_y,
            user_scale: cfg.user_scale,
            viewport_width: width as f64,
            viewport_height: height as f64,
            spin: time * cfg.spin_rate,
        }
    }

    /// Tilt about X first, then about Y.
    #[inline]
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&Vector3::y_axis(), self.tilt_y)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), self.tilt_x)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    /// `fov / (fov + z + viewer_distance)`; larger means closer.
    pub scale: f64,
}

pub fn project(point: &Point3, camera: &ProjectionCamera) -> Projected {
    project_with(point, &camera.rotation(), camera)
}

/// Same as [`project`] with a rotation already built for the frame, so batch
/// callers build the rotation matrix once.
pub fn project_with(
    point: &Point3,
    rotation: &Rotation3<f64>,
    camera: &ProjectionCamera,
) -> Projected {
    let rotated = rotation * point;
    let scale = camera.fov / (camera.fov + rotated.z + camera.viewer_distance);
    Projected {
        x: rotated.x * scale * camera.user_scale + camera.viewport_width / 2.0,
        y: rotated.y * scale * camera.user_scale + camera.viewport_height / 2.0,
        scale,
    }
}

pub fn project_all<'a, I>(points: I, camera: &ProjectionCamera) -> Vec<Projected>
where
    I: IntoIterator<Item = &'a Point3>,
{
    let rotation = camera.rotation();
    points
        .into_iter()
        .map(|p| project_with(p, &rotation, camera))
        .collect()
}

/// Opacity for a projected scale: nearer points are more opaque.
#[inline]
pub fn depth_alpha(scale: f64) -> f64 {
    scale.clamp(0.15, 1.0)
}
