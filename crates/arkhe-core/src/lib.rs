//! Arkhe core: semantic vector algebra, toroidal layout, perspective
//! projection and the per-surface frame scheduler.
//!
//! Data flows one way. A [`SpaceSnapshot`] is admitted into a
//! [`SemanticVectorSpace`]; each frame the [`ToroidalLayout`] places every
//! vector on the torus, [`projection::project`] maps it to the screen, and the
//! [`FrameScheduler`] repaints. Algebra (norm, inner product, gated addition)
//! runs on demand against the same immutable snapshot.
//!
//! Everything is single-threaded and synchronous; no operation blocks.

pub mod config;
pub mod panel;
pub mod projection;
pub mod scheduler;
pub mod space;
pub mod surface;
pub mod torus;

#[cfg(test)]
pub mod tests_config;
#[cfg(test)]
pub mod tests_proptest;

// ============================================================================
// CURATED PUBLIC API EXPORTS
// ============================================================================

pub use config::{ArkheConfig, ConfigError};

pub use space::{
    AlgebraError, InnerProduct, Role, SemanticVector, SemanticVectorSpace, SpaceError,
    SpaceSnapshot,
};

pub use projection::{Point3, Projected, ProjectionCamera};

pub use torus::{Ring, RingKind, ToroidalLayout, TorusGeometry, WireframeRings};

pub use scheduler::{
    DrawResult, FrameHandle, FrameInfo, FrameRenderer, FrameScheduler, FrameSource, FrameStatus,
    ManualFrameSource, SchedulerError,
};

pub use surface::{DrawCommand, DrawContext, Point2, RecordingSurface, Rgba, Stroke, Surface};

pub use panel::{
    readout_text, AlgebraOutcome, Operation, PanelError, PanelEvent, ProjectedVector, Slot,
    VectorAlgebraPanel,
};
