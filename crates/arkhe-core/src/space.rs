//! Semantic vector space: the data model and its algebra.
//!
//! A [`SemanticVectorSpace`] is an immutable snapshot of [`SemanticVector`]s
//! plus the two constants that govern the algebra (`omega_max` and
//! `delta_omega_max`). Every operation is a pure function of the snapshot.
//!
//! # Omega distance
//! The omega gap between two vectors is measured linearly, `|a.omega - b.omega|`,
//! never cyclically modulo `omega_max`. Two vectors at `0.0` and `omega_max` are
//! therefore as far apart as the space allows, even though both sit on the same
//! poloidal angle of the torus.

use std::collections::HashMap;
use std::f64::consts::TAU;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SpaceConfig;

/// Categorical tag used only for color coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Anchor,
    #[default]
    Node,
    Bridge,
    Observer,
    Composite,
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Display color as RGB.
    pub fn color(self) -> [u8; 3] {
        match self {
            Role::Anchor => [255, 196, 87],
            Role::Node => [96, 200, 255],
            Role::Bridge => [168, 120, 255],
            Role::Observer => [120, 230, 160],
            Role::Composite => [255, 120, 170],
            Role::Unknown => [160, 160, 160],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticVector {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub coords: [f64; 3],
    pub omega: f64,
    #[serde(default)]
    pub phase: f64,
    pub c: f64,
    pub f: f64,
    #[serde(default)]
    pub satoshi: f64,
}

impl SemanticVector {
    pub fn dot(&self, other: &SemanticVector) -> f64 {
        let [ax, ay, az] = self.coords;
        let [bx, by, bz] = other.coords;
        ax * bx + ay * by + az * bz
    }

    pub fn euclidean_norm(&self) -> f64 {
        self.dot(self).sqrt()
    }
}

/// Inner product result: a real magnitude and a display-only phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InnerProduct {
    pub magnitude: f64,
    /// `(a.phase - b.phase)` wrapped into `[0, 2π)`. Never feeds back into
    /// `magnitude`.
    pub phase: f64,
}

impl InnerProduct {
    /// `magnitude · e^{i·phase}`
    pub fn as_complex(&self) -> Complex64 {
        Complex64::from_polar(self.magnitude, self.phase)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgebraError {
    #[error("vector not found: {id}")]
    NotFound { id: String },
    #[error(
        "incompatible omega: |{left_omega} - {right_omega}| = {delta} >= {limit} ({left} vs {right})"
    )]
    IncompatibleOmega {
        left: String,
        right: String,
        left_omega: f64,
        right_omega: f64,
        delta: f64,
        limit: f64,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpaceError {
    #[error("duplicate vector id: {0}")]
    DuplicateId(String),
    #[error("invalid vector {id}: {reason}")]
    InvalidVector { id: String, reason: String },
    #[error("invalid space constants: {0}")]
    InvalidConstants(String),
}

/// Input contract: an externally produced snapshot of the vector collection.
/// Constants missing from the snapshot fall back to configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SpaceSnapshot {
    pub vectors: Vec<SemanticVector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omega_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_omega_max: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SemanticVectorSpace {
    vectors: Vec<SemanticVector>,
    index: HashMap<String, usize>,
    omega_max: f64,
    delta_omega_max: f64,
}

impl SemanticVectorSpace {
    /// Admit a collection of vectors, validating every invariant.
    ///
    /// Phases are normalized into `[0, 2π)`. Any violation rejects the whole
    /// collection; a space is never partially built.
    pub fn new(
        vectors: Vec<SemanticVector>,
        omega_max: f64,
        delta_omega_max: f64,
    ) -> Result<Self, SpaceError> {
        if !(omega_max.is_finite() && omega_max > 0.0) {
            return Err(SpaceError::InvalidConstants(format!(
                "omega_max must be positive, got {}",
                omega_max
            )));
        }
        if !(delta_omega_max.is_finite() && delta_omega_max > 0.0) {
            return Err(SpaceError::InvalidConstants(format!(
                "delta_omega_max must be positive, got {}",
                delta_omega_max
            )));
        }

        let mut index = HashMap::with_capacity(vectors.len());
        let mut admitted = Vec::with_capacity(vectors.len());
        for mut v in vectors {
            check_vector(&v, omega_max)?;
            v.phase = wrap_phase(v.phase);
            if index.insert(v.id.clone(), admitted.len()).is_some() {
                return Err(SpaceError::DuplicateId(v.id));
            }
            admitted.push(v);
        }

        log::debug!(
            "semantic space admitted {} vectors (omega_max={}, delta_omega_max={})",
            admitted.len(),
            omega_max,
            delta_omega_max
        );

        Ok(Self {
            vectors: admitted,
            index,
            omega_max,
            delta_omega_max,
        })
    }

    pub fn from_snapshot(snapshot: SpaceSnapshot, cfg: &SpaceConfig) -> Result<Self, SpaceError> {
        Self::new(
            snapshot.vectors,
            snapshot.omega_max.unwrap_or(cfg.omega_max),
            snapshot.delta_omega_max.unwrap_or(cfg.delta_omega_max),
        )
    }

    pub fn empty(cfg: &SpaceConfig) -> Self {
        Self {
            vectors: Vec::new(),
            index: HashMap::new(),
            omega_max: cfg.omega_max,
            delta_omega_max: cfg.delta_omega_max,
        }
    }

    #[inline]
    pub fn omega_max(&self) -> f64 {
        self.omega_max
    }

    #[inline]
    pub fn delta_omega_max(&self) -> f64 {
        self.delta_omega_max
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vectors in snapshot order.
    pub fn iter(&self) -> std::slice::Iter<'_, SemanticVector> {
        self.vectors.iter()
    }

    pub fn vectors(&self) -> &[SemanticVector] {
        &self.vectors
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.vectors.iter().map(|v| v.id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get_by_id(&self, id: &str) -> Result<&SemanticVector, AlgebraError> {
        self.index
            .get(id)
            .map(|&i| &self.vectors[i])
            .ok_or_else(|| AlgebraError::NotFound { id: id.to_string() })
    }

    /// Arkhe norm: `sqrt(|v|² · c) · (1 - f)`.
    ///
    /// Never exceeds the Euclidean length for `c ≤ 1, f ≥ 0`; equal to it only
    /// when `c = 1` and `f = 0`.
    pub fn norm(&self, v: &SemanticVector) -> f64 {
        (v.dot(v) * v.c).sqrt() * (1.0 - v.f)
    }

    /// Omega penalty factor in `[0, 1]`: 1 for equal omegas, 0 once the gap
    /// reaches `delta_omega_max`.
    pub fn omega_penalty(&self, a: &SemanticVector, b: &SemanticVector) -> f64 {
        (1.0 - (a.omega - b.omega).abs() / self.delta_omega_max).clamp(0.0, 1.0)
    }

    pub fn inner_product(&self, a: &SemanticVector, b: &SemanticVector) -> InnerProduct {
        let magnitude = a.dot(b) * self.omega_penalty(a, b) * (a.c * b.c).sqrt();
        InnerProduct {
            magnitude,
            phase: wrap_phase(a.phase - b.phase),
        }
    }

    pub fn is_compatible(&self, a: &SemanticVector, b: &SemanticVector) -> bool {
        (a.omega - b.omega).abs() < self.delta_omega_max
    }

    /// Compatibility-gated sum. Fails instead of producing a meaningless
    /// composite when the omega gap is `>= delta_omega_max`.
    pub fn add(
        &self,
        a: &SemanticVector,
        b: &SemanticVector,
    ) -> Result<SemanticVector, AlgebraError> {
        let delta = (a.omega - b.omega).abs();
        if delta >= self.delta_omega_max {
            log::debug!(
                "add denied: {} ({}) and {} ({}) are {} apart",
                a.id,
                a.omega,
                b.id,
                b.omega,
                delta
            );
            return Err(AlgebraError::IncompatibleOmega {
                left: a.id.clone(),
                right: b.id.clone(),
                left_omega: a.omega,
                right_omega: b.omega,
                delta,
                limit: self.delta_omega_max,
            });
        }

        let [ax, ay, az] = a.coords;
        let [bx, by, bz] = b.coords;
        Ok(SemanticVector {
            id: format!("{}+{}", a.id, b.id),
            name: format!("{} ⊕ {}", a.name, b.name),
            role: if a.role == b.role {
                a.role
            } else {
                Role::Composite
            },
            coords: [ax + bx, ay + by, az + bz],
            omega: (a.omega + b.omega) / 2.0,
            phase: circular_mean(a.phase, b.phase),
            c: a.c.min(b.c),
            f: a.f.max(b.f),
            satoshi: a.satoshi + b.satoshi,
        })
    }

    pub fn norm_of(&self, id: &str) -> Result<f64, AlgebraError> {
        Ok(self.norm(self.get_by_id(id)?))
    }

    pub fn inner_product_of(&self, a: &str, b: &str) -> Result<InnerProduct, AlgebraError> {
        Ok(self.inner_product(self.get_by_id(a)?, self.get_by_id(b)?))
    }

    pub fn add_by_id(&self, a: &str, b: &str) -> Result<SemanticVector, AlgebraError> {
        self.add(self.get_by_id(a)?, self.get_by_id(b)?)
    }
}

impl<'a> IntoIterator for &'a SemanticVectorSpace {
    type Item = &'a SemanticVector;
    type IntoIter = std::slice::Iter<'a, SemanticVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.vectors.iter()
    }
}

fn check_vector(v: &SemanticVector, omega_max: f64) -> Result<(), SpaceError> {
    let invalid = |reason: String| SpaceError::InvalidVector {
        id: v.id.clone(),
        reason,
    };

    if v.id.is_empty() {
        return Err(invalid("id must not be empty".to_string()));
    }
    if v.coords.iter().any(|x| !x.is_finite()) {
        return Err(invalid(format!("coords must be finite, got {:?}", v.coords)));
    }
    if !(0.0..=omega_max).contains(&v.omega) {
        return Err(invalid(format!(
            "omega {} outside [0, {}]",
            v.omega, omega_max
        )));
    }
    if !v.phase.is_finite() {
        return Err(invalid(format!("phase must be finite, got {}", v.phase)));
    }
    if !(0.0..=1.0).contains(&v.c) {
        return Err(invalid(format!("coherence {} outside [0, 1]", v.c)));
    }
    if !(0.0..=1.0).contains(&v.f) {
        return Err(invalid(format!("fluctuation {} outside [0, 1]", v.f)));
    }
    if !(v.satoshi.is_finite() && v.satoshi >= 0.0) {
        return Err(invalid(format!("satoshi {} must be >= 0", v.satoshi)));
    }
    Ok(())
}

/// Mean direction of two angles in `[0, 2π)`. Opposite angles have no mean
/// direction; the first angle wins.
fn circular_mean(a: f64, b: f64) -> f64 {
    let s = a.sin() + b.sin();
    let c = a.cos() + b.cos();
    if s.hypot(c) < 1e-12 {
        return wrap_phase(a);
    }
    wrap_phase(s.atan2(c))
}

/// Wrap an angle into `[0, 2π)`. `rem_euclid` alone rounds tiny negative
/// angles up to exactly `2π`.
#[inline]
fn wrap_phase(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
