//! Per-surface render loop.
//!
//! [`FrameScheduler`] owns one surface and keeps at most one frame request
//! pending with its [`FrameSource`] (the host's animation-frame facility).
//! When the host fires that request, the scheduler advances its logical
//! clock by a fixed step, syncs the backing buffer with the displayed size,
//! clears, and hands the frame to the [`FrameRenderer`].
//!
//! Time is a constant increment per callback, not wall-clock delta: animation
//! speed follows the host's frame rate, and a given number of frames always
//! reproduces the same picture.
//!
//! A renderer error is neither retried nor swallowed. The scheduler stops
//! itself and returns [`SchedulerError::DrawFailed`]; whether to log and
//! restart is up to the host.
//!
//! # Example
//! ```rust
//! use arkhe_core::config::SchedulerConfig;
//! use arkhe_core::scheduler::{DrawResult, FrameScheduler, FrameStatus, ManualFrameSource};
//! use arkhe_core::surface::{DrawContext, RecordingSurface};
//!
//! let mut scheduler = FrameScheduler::new(
//!     RecordingSurface::new(320, 200),
//!     ManualFrameSource::default(),
//!     &SchedulerConfig::default(),
//! );
//! scheduler.start(|_time: f64, _ctx: &mut dyn DrawContext, _w: u32, _h: u32| -> DrawResult {
//!     Ok(())
//! });
//! assert!(matches!(scheduler.pump(), Ok(FrameStatus::Drawn(_))));
//! scheduler.stop();
//! scheduler.stop();
//! assert!(matches!(scheduler.pump(), Ok(FrameStatus::Idle)));
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SchedulerConfig;
use crate::surface::{DrawContext, Surface};

pub type DrawResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub trait FrameRenderer {
    fn draw(&mut self, time: f64, ctx: &mut dyn DrawContext, width: u32, height: u32)
        -> DrawResult;
}

impl<F> FrameRenderer for F
where
    F: FnMut(f64, &mut dyn DrawContext, u32, u32) -> DrawResult,
{
    fn draw(
        &mut self,
        time: f64,
        ctx: &mut dyn DrawContext,
        width: u32,
        height: u32,
    ) -> DrawResult {
        self(time, ctx, width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

/// Host animation-frame facility.
pub trait FrameSource {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Deterministic frame source: requests queue up until the host pulls them
/// with [`ManualFrameSource::next_due`].
#[derive(Debug, Default)]
pub struct ManualFrameSource {
    next_id: u64,
    queued: VecDeque<FrameHandle>,
    cancelled: u64,
}

impl ManualFrameSource {
    pub fn next_due(&mut self) -> Option<FrameHandle> {
        self.queued.pop_front()
    }

    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameSource for ManualFrameSource {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.queued.push_back(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.queued.len();
        self.queued.retain(|h| *h != handle);
        if self.queued.len() != before {
            self.cancelled += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameInfo {
    /// 1-based index of the drawn frame.
    pub frame: u64,
    pub time: f64,
    pub width: u32,
    pub height: u32,
    /// The backing buffer was resized before this frame.
    pub resized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameStatus {
    Drawn(FrameInfo),
    /// The handle was stale (cancelled or superseded); nothing happened.
    Skipped,
    /// No frame was due.
    Idle,
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("draw callback failed on frame {frame}: {source}")]
    DrawFailed {
        frame: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub struct FrameScheduler<S, F, R> {
    surface: S,
    source: F,
    renderer: Option<R>,
    pending: Option<FrameHandle>,
    time: f64,
    time_step: f64,
    pixel_ratio: f64,
    frames: u64,
}

impl<S, F, R> std::fmt::Debug for FrameScheduler<S, F, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("running", &self.pending.is_some())
            .field("pending", &self.pending)
            .field("time", &self.time)
            .field("time_step", &self.time_step)
            .field("frames", &self.frames)
            .finish()
    }
}

impl<S, F, R> FrameScheduler<S, F, R>
where
    S: Surface,
    F: FrameSource,
    R: FrameRenderer,
{
    pub fn new(surface: S, source: F, cfg: &SchedulerConfig) -> Self {
        Self {
            surface,
            source,
            renderer: None,
            pending: None,
            time: 0.0,
            time_step: cfg.time_step,
            pixel_ratio: cfg.pixel_ratio,
            frames: 0,
        }
    }

    /// Install `renderer` and request the first frame. Starting a running
    /// scheduler swaps the renderer and replaces its pending request, so
    /// there is never more than one outstanding.
    pub fn start(&mut self, renderer: R) {
        if let Some(handle) = self.pending.take() {
            self.source.cancel_frame(handle);
        }
        self.renderer = Some(renderer);
        self.pending = Some(self.source.request_frame());
        log::debug!("frame scheduler started at t={:.3}", self.time);
    }

    /// Cancel the pending frame. No-op when idle; safe to call repeatedly.
    /// A draw already in progress is not interrupted.
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.source.cancel_frame(handle);
            log::debug!(
                "frame scheduler stopped after {} frames (t={:.3})",
                self.frames,
                self.time
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Host entry point for a fired frame request.
    pub fn on_animation_frame(&mut self, handle: FrameHandle) -> Result<FrameStatus, SchedulerError> {
        if self.pending != Some(handle) {
            return Ok(FrameStatus::Skipped);
        }
        self.pending = None;

        let renderer = match self.renderer.as_mut() {
            Some(r) => r,
            None => return Ok(FrameStatus::Skipped),
        };

        self.time += self.time_step;
        self.frames += 1;

        let (width, height) = self.surface.display_size();
        let backing = (
            (width as f64 * self.pixel_ratio).round() as u32,
            (height as f64 * self.pixel_ratio).round() as u32,
        );
        let resized = self.surface.backing_size() != backing;
        if resized {
            log::debug!(
                "resizing backing buffer to {}x{} (display {}x{})",
                backing.0,
                backing.1,
                width,
                height
            );
            self.surface.resize_backing(backing.0, backing.1);
        }

        let ctx = self.surface.context();
        ctx.clear(backing.0, backing.1);
        if let Err(source) = renderer.draw(self.time, ctx, width, height) {
            log::warn!("draw failed on frame {}, stopping loop: {}", self.frames, source);
            return Err(SchedulerError::DrawFailed {
                frame: self.frames,
                source,
            });
        }

        self.pending = Some(self.source.request_frame());
        Ok(FrameStatus::Drawn(FrameInfo {
            frame: self.frames,
            time: self.time,
            width,
            height,
            resized,
        }))
    }

    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    pub fn renderer(&self) -> Option<&R> {
        self.renderer.as_ref()
    }

    /// Mutate view state between frames.
    pub fn renderer_mut(&mut self) -> Option<&mut R> {
        self.renderer.as_mut()
    }
}

impl<S, R> FrameScheduler<S, ManualFrameSource, R>
where
    S: Surface,
    R: FrameRenderer,
{
    /// Fire the next queued frame request, if any.
    pub fn pump(&mut self) -> Result<FrameStatus, SchedulerError> {
        match self.source.next_due() {
            Some(handle) => self.on_animation_frame(handle),
            None => Ok(FrameStatus::Idle),
        }
    }
}
