//! Vector algebra panel: the interactive view over a semantic space.
//!
//! The panel is a [`FrameRenderer`]: mount it on a [`FrameScheduler`] and each
//! frame places every vector on the torus (spinning with scheduler time),
//! projects it, and draws the wireframe backdrop, nodes and labels. Between
//! frames the host selects operands and an operation through
//! [`FrameScheduler::renderer_mut`] and asks the panel to evaluate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ArkheConfig, CameraConfig, PanelConfig, SchedulerConfig, TorusConfig};
use crate::projection::{depth_alpha, project_with, ProjectionCamera};
use crate::scheduler::{DrawResult, FrameRenderer, FrameScheduler, FrameSource};
use crate::space::{AlgebraError, Role, SemanticVector, SemanticVectorSpace};
use crate::surface::{DrawContext, Point2, Rgba, Stroke, Surface};
use crate::torus::ToroidalLayout;

const WIREFRAME_RGB: [u8; 3] = [90, 110, 150];
const LABEL_RGB: [u8; 3] = [220, 225, 235];
const HALO_RGB: [u8; 3] = [255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[default]
    Norm,
    InnerProduct,
    Add,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Left,
    Right,
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Left => write!(f, "left"),
            Slot::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlgebraOutcome {
    Norm {
        id: String,
        value: f64,
    },
    InnerProduct {
        left: String,
        right: String,
        magnitude: f64,
        phase: f64,
    },
    Sum {
        vector: SemanticVector,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PanelError {
    #[error("no {0} operand selected")]
    MissingOperand(Slot),
    #[error(transparent)]
    Algebra(#[from] AlgebraError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PanelEvent {
    SnapshotReplaced {
        vectors: usize,
    },
    SelectionChanged {
        left: Option<String>,
        right: Option<String>,
    },
    OperationEvaluated {
        operation: Operation,
        outcome: AlgebraOutcome,
    },
    OperationDenied {
        operation: Operation,
        reason: String,
    },
}

/// One vector's screen placement for the current frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedVector {
    pub id: String,
    pub role: Role,
    pub screen_x: f64,
    pub screen_y: f64,
    pub projected_scale: f64,
    pub radius: f64,
    pub alpha: f64,
}

#[derive(Debug, Clone)]
pub struct VectorAlgebraPanel {
    space: SemanticVectorSpace,
    layout: ToroidalLayout,
    torus: TorusConfig,
    camera: CameraConfig,
    style: PanelConfig,
    left: Option<String>,
    right: Option<String>,
    operation: Operation,
    events: Vec<PanelEvent>,
}

impl VectorAlgebraPanel {
    pub fn new(space: SemanticVectorSpace, cfg: &ArkheConfig) -> Self {
        let layout = ToroidalLayout::from_config(&cfg.torus, space.omega_max());
        let vectors = space.len();
        Self {
            space,
            layout,
            torus: cfg.torus,
            camera: cfg.camera,
            style: cfg.panel,
            left: None,
            right: None,
            operation: Operation::default(),
            events: vec![PanelEvent::SnapshotReplaced { vectors }],
        }
    }

    pub fn space(&self) -> &SemanticVectorSpace {
        &self.space
    }

    pub fn layout(&self) -> &ToroidalLayout {
        &self.layout
    }

    /// Swap in a new snapshot wholesale. Selections whose ids are gone are
    /// cleared.
    pub fn replace_space(&mut self, space: SemanticVectorSpace) {
        self.layout = ToroidalLayout::from_config(&self.torus, space.omega_max());
        self.space = space;
        self.events.push(PanelEvent::SnapshotReplaced {
            vectors: self.space.len(),
        });

        let before = (self.left.clone(), self.right.clone());
        self.left = self.left.take().filter(|id| self.space.contains(id));
        self.right = self.right.take().filter(|id| self.space.contains(id));
        if before != (self.left.clone(), self.right.clone()) {
            self.push_selection();
        }
    }

    pub fn selection(&self) -> (Option<&str>, Option<&str>) {
        (self.left.as_deref(), self.right.as_deref())
    }

    pub fn select(&mut self, slot: Slot, id: &str) -> Result<(), AlgebraError> {
        self.space.get_by_id(id)?;
        let target = match slot {
            Slot::Left => &mut self.left,
            Slot::Right => &mut self.right,
        };
        if target.as_deref() != Some(id) {
            *target = Some(id.to_string());
            self.push_selection();
        }
        Ok(())
    }

    pub fn clear_selection(&mut self, slot: Slot) {
        let target = match slot {
            Slot::Left => &mut self.left,
            Slot::Right => &mut self.right,
        };
        if target.take().is_some() {
            self.push_selection();
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn set_operation(&mut self, operation: Operation) {
        self.operation = operation;
    }

    /// Run the selected operation on the selected operands.
    ///
    /// Algebra errors are expected outcomes (the panel shows them through
    /// [`readout_text`]); they are recorded as `OperationDenied` events.
    pub fn evaluate(&mut self) -> Result<AlgebraOutcome, PanelError> {
        let operation = self.operation;
        let result = self.compute(operation);
        match &result {
            Ok(outcome) => self.events.push(PanelEvent::OperationEvaluated {
                operation,
                outcome: outcome.clone(),
            }),
            Err(e) => {
                log::info!("{:?} denied: {}", operation, e);
                self.events.push(PanelEvent::OperationDenied {
                    operation,
                    reason: e.to_string(),
                });
            }
        }
        result
    }

    fn compute(&self, operation: Operation) -> Result<AlgebraOutcome, PanelError> {
        let a = self.operand(Slot::Left)?;
        match operation {
            Operation::Norm => Ok(AlgebraOutcome::Norm {
                id: a.id.clone(),
                value: self.space.norm(a),
            }),
            Operation::InnerProduct => {
                let b = self.operand(Slot::Right)?;
                let ip = self.space.inner_product(a, b);
                Ok(AlgebraOutcome::InnerProduct {
                    left: a.id.clone(),
                    right: b.id.clone(),
                    magnitude: ip.magnitude,
                    phase: ip.phase,
                })
            }
            Operation::Add => {
                let b = self.operand(Slot::Right)?;
                Ok(AlgebraOutcome::Sum {
                    vector: self.space.add(a, b)?,
                })
            }
        }
    }

    fn operand(&self, slot: Slot) -> Result<&SemanticVector, PanelError> {
        let id = match slot {
            Slot::Left => self.left.as_deref(),
            Slot::Right => self.right.as_deref(),
        }
        .ok_or(PanelError::MissingOperand(slot))?;
        Ok(self.space.get_by_id(id)?)
    }

    pub fn drain_events(&mut self) -> Vec<PanelEvent> {
        std::mem::take(&mut self.events)
    }

    /// Node radius: grows with coherence, satoshi weight and nearness.
    pub fn node_radius(&self, v: &SemanticVector, scale: f64) -> f64 {
        self.style.node_base_radius
            * scale
            * (0.5 + 0.5 * v.c)
            * (1.0 + self.style.satoshi_gain * v.satoshi.ln_1p())
    }

    /// Screen placement of every vector at `time`, in snapshot order.
    pub fn frame_layout(&self, time: f64, width: u32, height: u32) -> Vec<ProjectedVector> {
        let camera = ProjectionCamera::for_frame(&self.camera, width, height, time);
        let rotation = camera.rotation();
        self.space
            .iter()
            .map(|v| {
                let world = self.layout.place_on_torus(v, camera.spin);
                let p = project_with(&world, &rotation, &camera);
                ProjectedVector {
                    id: v.id.clone(),
                    role: v.role,
                    screen_x: p.x,
                    screen_y: p.y,
                    projected_scale: p.scale,
                    radius: self.node_radius(v, p.scale),
                    alpha: depth_alpha(p.scale),
                }
            })
            .collect()
    }

    fn push_selection(&mut self) {
        self.events.push(PanelEvent::SelectionChanged {
            left: self.left.clone(),
            right: self.right.clone(),
        });
    }

    fn is_selected(&self, id: &str) -> bool {
        self.left.as_deref() == Some(id) || self.right.as_deref() == Some(id)
    }

    fn draw_wireframe(&self, camera: &ProjectionCamera, ctx: &mut dyn DrawContext) {
        let rotation = camera.rotation();
        let rings = self.layout.wireframe_rings(
            self.torus.poloidal_rings,
            self.torus.toroidal_rings,
            camera.spin,
        );
        let mut path = Vec::with_capacity(self.torus.ring_segments + 1);
        for ring in rings {
            path.clear();
            let mut scale_sum = 0.0;
            for p in &ring.points {
                let q = project_with(p, &rotation, camera);
                scale_sum += q.scale;
                path.push(Point2::new(q.x, q.y));
            }
            let mean_scale = scale_sum / ring.points.len().max(1) as f64;
            ctx.stroke_path(
                &path,
                Stroke {
                    color: Rgba::new(WIREFRAME_RGB, 0.35 * depth_alpha(mean_scale)),
                    width: 1.0,
                },
            );
        }
    }
}

impl FrameRenderer for VectorAlgebraPanel {
    fn draw(&mut self, time: f64, ctx: &mut dyn DrawContext, width: u32, height: u32) -> DrawResult {
        let camera = ProjectionCamera::for_frame(&self.camera, width, height, time);
        self.draw_wireframe(&camera, ctx);

        let mut nodes: Vec<(&SemanticVector, ProjectedVector)> = self
            .space
            .iter()
            .zip(self.frame_layout(time, width, height))
            .collect();
        // far to near, so nearer nodes paint over farther ones
        nodes.sort_by(|a, b| a.1.projected_scale.total_cmp(&b.1.projected_scale));

        for (v, node) in &nodes {
            let center = Point2::new(node.screen_x, node.screen_y);
            if self.is_selected(&v.id) {
                ctx.fill_circle(center, node.radius * 2.2, Rgba::new(HALO_RGB, 0.25 * node.alpha));
            }
            ctx.fill_circle(center, node.radius, Rgba::new(v.role.color(), node.alpha));
            if self.style.show_labels {
                ctx.fill_text(
                    &v.name,
                    Point2::new(node.screen_x + node.radius + 4.0, node.screen_y),
                    Rgba::new(LABEL_RGB, node.alpha),
                );
            }
        }
        Ok(())
    }
}

/// Display line for an evaluation result.
pub fn readout_text(result: &Result<AlgebraOutcome, PanelError>) -> String {
    match result {
        Ok(AlgebraOutcome::Norm { id, value }) => format!("‖{}‖ = {:.4}", id, value),
        Ok(AlgebraOutcome::InnerProduct {
            left,
            right,
            magnitude,
            phase,
        }) => format!(
            "⟨{}|{}⟩ = {:.4} · e^(i·{:.3})",
            left, right, magnitude, phase
        ),
        Ok(AlgebraOutcome::Sum { vector }) => format!(
            "{} = ({:.3}, {:.3}, {:.3}) ω={:.3} c={:.3}",
            vector.id, vector.coords[0], vector.coords[1], vector.coords[2], vector.omega, vector.c
        ),
        Err(PanelError::Algebra(AlgebraError::IncompatibleOmega { delta, limit, .. })) => format!(
            "this combination is not permitted (Δω = {:.3} ≥ {:.3})",
            delta, limit
        ),
        Err(PanelError::Algebra(AlgebraError::NotFound { id })) => {
            format!("unknown vector: {}", id)
        }
        Err(PanelError::MissingOperand(slot)) => format!("select a {} operand", slot),
    }
}

/// Mount a panel on a fresh scheduler and start its loop.
pub fn mount<S, F>(
    panel: VectorAlgebraPanel,
    surface: S,
    source: F,
    cfg: &SchedulerConfig,
) -> FrameScheduler<S, F, VectorAlgebraPanel>
where
    S: Surface,
    F: FrameSource,
{
    let mut scheduler = FrameScheduler::new(surface, source, cfg);
    scheduler.start(panel);
    scheduler
}
