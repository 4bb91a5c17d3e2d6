//! Drawing surface abstraction.
//!
//! The engine needs only a handful of primitives from a canvas-like target:
//! read the displayed size, resize the backing buffer, and stroke/fill/text
//! through a [`DrawContext`]. [`RecordingSurface`] keeps the commands of the
//! last frame in memory for headless hosts and tests.

use serde::{Deserialize, Serialize};

pub type Point2 = nalgebra::Point2<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub rgb: [u8; 3],
    pub alpha: f64,
}

impl Rgba {
    pub fn new(rgb: [u8; 3], alpha: f64) -> Self {
        Self {
            rgb,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
}

pub trait DrawContext {
    fn clear(&mut self, width: u32, height: u32);
    fn stroke_path(&mut self, points: &[Point2], stroke: Stroke);
    fn fill_circle(&mut self, center: Point2, radius: f64, fill: Rgba);
    fn fill_text(&mut self, text: &str, at: Point2, fill: Rgba);
}

pub trait Surface {
    /// Size the surface is displayed at, in layout pixels.
    fn display_size(&self) -> (u32, u32);
    /// Size of the pixel buffer behind the display.
    fn backing_size(&self) -> (u32, u32);
    fn resize_backing(&mut self, width: u32, height: u32);
    fn context(&mut self) -> &mut dyn DrawContext;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear {
        width: u32,
        height: u32,
    },
    StrokePath {
        points: Vec<Point2>,
        stroke: Stroke,
    },
    FillCircle {
        center: Point2,
        radius: f64,
        fill: Rgba,
    },
    FillText {
        text: String,
        at: Point2,
        fill: Rgba,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RecordingContext {
    commands: Vec<DrawCommand>,
}

impl RecordingContext {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl DrawContext for RecordingContext {
    /// Starts a new frame: earlier commands are discarded.
    fn clear(&mut self, width: u32, height: u32) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn stroke_path(&mut self, points: &[Point2], stroke: Stroke) {
        self.commands.push(DrawCommand::StrokePath {
            points: points.to_vec(),
            stroke,
        });
    }

    fn fill_circle(&mut self, center: Point2, radius: f64, fill: Rgba) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            fill,
        });
    }

    fn fill_text(&mut self, text: &str, at: Point2, fill: Rgba) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            at,
            fill,
        });
    }
}

/// In-memory surface. The display size is set by the host (a layout change);
/// the backing size only moves when the scheduler resizes it.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    display: (u32, u32),
    backing: (u32, u32),
    resizes: u32,
    ctx: RecordingContext,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            display: (width, height),
            backing: (0, 0),
            resizes: 0,
            ctx: RecordingContext::default(),
        }
    }

    pub fn set_display_size(&mut self, width: u32, height: u32) {
        self.display = (width, height);
    }

    pub fn resize_count(&self) -> u32 {
        self.resizes
    }

    /// Commands drawn since the last clear.
    pub fn commands(&self) -> &[DrawCommand] {
        self.ctx.commands()
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        self.ctx.take_commands()
    }
}

impl Surface for RecordingSurface {
    fn display_size(&self) -> (u32, u32) {
        self.display
    }

    fn backing_size(&self) -> (u32, u32) {
        self.backing
    }

    fn resize_backing(&mut self, width: u32, height: u32) {
        self.backing = (width, height);
        self.resizes += 1;
    }

    fn context(&mut self) -> &mut dyn DrawContext {
        &mut self.ctx
    }
}
