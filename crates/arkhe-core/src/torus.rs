//! Toroidal layout: semantic vectors placed on a torus of radii `(R, r)`.
//!
//! `omega` picks the poloidal angle (around the tube), `phase` plus the
//! frame's rotation offset picks the toroidal angle (around the symmetry
//! axis). The decorative wireframe goes through [`TorusGeometry::point`] too,
//! so nodes always sit on the drawn mesh.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::config::TorusConfig;
use crate::projection::Point3;
use crate::space::SemanticVector;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorusGeometry {
    pub major_radius: f64,
    pub minor_radius: f64,
}

impl TorusGeometry {
    pub fn new(major_radius: f64, minor_radius: f64) -> Self {
        Self {
            major_radius,
            minor_radius,
        }
    }

    /// Surface point for poloidal angle `theta` and toroidal angle `phi`.
    #[inline]
    pub fn point(&self, theta: f64, phi: f64) -> Point3 {
        let (st, ct) = theta.sin_cos();
        let (sp, cp) = phi.sin_cos();
        let ring = self.major_radius + self.minor_radius * ct;
        Point3::new(ring * cp, ring * sp, self.minor_radius * st)
    }

    /// Squared distance of `p` from the tube's centre circle minus `r²`.
    /// Zero (within rounding) for points on the surface.
    pub fn surface_residual(&self, p: &Point3) -> f64 {
        let d = p.x.hypot(p.y) - self.major_radius;
        d * d + p.z * p.z - self.minor_radius * self.minor_radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToroidalLayout {
    geometry: TorusGeometry,
    omega_max: f64,
    ring_segments: usize,
}

impl ToroidalLayout {
    pub fn new(geometry: TorusGeometry, omega_max: f64, ring_segments: usize) -> Self {
        Self {
            geometry,
            omega_max,
            ring_segments: ring_segments.max(3),
        }
    }

    pub fn from_config(cfg: &TorusConfig, omega_max: f64) -> Self {
        Self::new(
            TorusGeometry::new(cfg.major_radius, cfg.minor_radius),
            omega_max,
            cfg.ring_segments,
        )
    }

    #[inline]
    pub fn geometry(&self) -> &TorusGeometry {
        &self.geometry
    }

    #[inline]
    pub fn omega_max(&self) -> f64 {
        self.omega_max
    }

    /// Poloidal angle for an omega value: `omega / omega_max · 2π`.
    #[inline]
    pub fn theta_for(&self, omega: f64) -> f64 {
        (omega / self.omega_max) * TAU
    }

    pub fn place_on_torus(&self, vector: &SemanticVector, rotation_offset: f64) -> Point3 {
        self.geometry.point(
            self.theta_for(vector.omega),
            vector.phase + rotation_offset,
        )
    }

    /// Backdrop mesh: `poloidal` tube cross-sections followed by `toroidal`
    /// circles around the axis, each a closed polyline.
    pub fn wireframe_rings(
        &self,
        poloidal: usize,
        toroidal: usize,
        rotation_offset: f64,
    ) -> WireframeRings {
        WireframeRings {
            geometry: self.geometry,
            poloidal,
            toroidal,
            segments: self.ring_segments,
            rotation_offset,
            next: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingKind {
    /// Fixed toroidal angle, sweeping around the tube.
    Poloidal,
    /// Fixed poloidal angle, sweeping around the axis.
    Toroidal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub kind: RingKind,
    /// `segments + 1` points; the last repeats the first.
    pub points: Vec<Point3>,
}

/// Lazy, finite ring sequence. Clone it to restart from the same state.
#[derive(Debug, Clone)]
pub struct WireframeRings {
    geometry: TorusGeometry,
    poloidal: usize,
    toroidal: usize,
    segments: usize,
    rotation_offset: f64,
    next: usize,
}

impl WireframeRings {
    pub fn geometry(&self) -> &TorusGeometry {
        &self.geometry
    }

    /// Vertex count over the whole (unconsumed) sequence.
    pub fn vertex_count(&self) -> usize {
        self.len() * (self.segments + 1)
    }

    fn ring(&self, kind: RingKind, fixed: f64) -> Ring {
        let points = (0..=self.segments)
            .map(|s| {
                let sweep = TAU * (s % self.segments) as f64 / self.segments as f64;
                match kind {
                    RingKind::Poloidal => self.geometry.point(sweep, fixed),
                    RingKind::Toroidal => {
                        self.geometry.point(fixed, sweep + self.rotation_offset)
                    }
                }
            })
            .collect();
        Ring { kind, points }
    }
}

impl Iterator for WireframeRings {
    type Item = Ring;

    fn next(&mut self) -> Option<Ring> {
        let i = self.next;
        let ring = if i < self.poloidal {
            let phi = TAU * i as f64 / self.poloidal as f64 + self.rotation_offset;
            self.ring(RingKind::Poloidal, phi)
        } else if i < self.poloidal + self.toroidal {
            let j = i - self.poloidal;
            let theta = TAU * j as f64 / self.toroidal as f64;
            self.ring(RingKind::Toroidal, theta)
        } else {
            return None;
        };
        self.next += 1;
        Some(ring)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.poloidal + self.toroidal).saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for WireframeRings {}

impl std::iter::FusedIterator for WireframeRings {}
