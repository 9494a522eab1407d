//! Floating window geometry and the drag/resize state machine.
//!
//! Geometry is kept in viewport-fraction units (percent of the viewport), so
//! it survives viewport resizes unchanged. Pointer positions arrive in device
//! pixels (terminal cells for the TUI) and are converted with the current
//! [`Viewport`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::trace;

pub const MIN_WIDTH: f64 = 30.0;
pub const MAX_WIDTH: f64 = 90.0;
pub const MIN_HEIGHT: f64 = 40.0;
pub const MAX_HEIGHT: f64 = 90.0;

pub const DEFAULT_X: f64 = 55.0;
pub const DEFAULT_Y: f64 = 8.0;
pub const DEFAULT_WIDTH: f64 = 40.0;
pub const DEFAULT_HEIGHT: f64 = 84.0;

/// Viewport size in device pixels, never smaller than one pixel per side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: f64,
    height: f64,
}

/// NaN and sizes below one pixel become one pixel.
fn pixel_extent(value: f64) -> f64 {
    if value.is_finite() {
        value.max(1.0)
    } else if value == f64::INFINITY {
        f64::MAX
    } else {
        1.0
    }
}

impl Viewport {
    pub fn new(width: impl Into<f64>, height: impl Into<f64>) -> Self {
        Self {
            width: pixel_extent(width.into()),
            height: pixel_extent(height.into()),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn to_fraction(&self, x_px: f64, y_px: f64) -> (f64, f64) {
        (x_px * 100.0 / self.width, y_px * 100.0 / self.height)
    }

    pub fn to_pixels(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.width / 100.0, y * self.height / 100.0)
    }
}

/// Pointer position in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

impl Pointer {
    pub fn new(x: impl Into<f64>, y: impl Into<f64>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            x: DEFAULT_X,
            y: DEFAULT_Y,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

fn nan_or(value: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value
    }
}

impl WindowGeometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let mut geometry = Self { x, y, width, height };
        geometry.clamp_size();
        geometry.clamp_position();
        geometry
    }

    // NaN components fall back to their defaults; `f64::clamp` panics on a
    // NaN bound.
    fn clamp_size(&mut self) {
        self.width = nan_or(self.width, DEFAULT_WIDTH).clamp(MIN_WIDTH, MAX_WIDTH);
        self.height = nan_or(self.height, DEFAULT_HEIGHT).clamp(MIN_HEIGHT, MAX_HEIGHT);
    }

    fn clamp_position(&mut self) {
        self.x = nan_or(self.x, DEFAULT_X).clamp(0.0, 100.0 - self.width);
        self.y = nan_or(self.y, DEFAULT_Y).clamp(0.0, 100.0 - self.height);
    }

    /// True when the window is fully inside the viewport and within bounds.
    pub fn is_valid(&self) -> bool {
        (MIN_WIDTH..=MAX_WIDTH).contains(&self.width)
            && (MIN_HEIGHT..=MAX_HEIGHT).contains(&self.height)
            && self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= 100.0
            && self.y + self.height <= 100.0
    }
}

/// Counts live pointer captures. Stands in for the move/up listeners a
/// gesture subscribes to while it is active.
#[derive(Debug, Clone, Default)]
pub struct PointerListeners {
    active: Arc<AtomicUsize>,
}

impl PointerListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> PointerCapture {
        self.active.fetch_add(1, Ordering::SeqCst);
        PointerCapture {
            active: Arc::clone(&self.active),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Held for the lifetime of a drag or resize; released on drop.
#[derive(Debug)]
pub struct PointerCapture {
    active: Arc<AtomicUsize>,
}

impl Drop for PointerCapture {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Idle,
    Dragging,
    Resizing,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Dragging {
        offset_x: f64,
        offset_y: f64,
        _capture: PointerCapture,
    },
    Resizing {
        start: Pointer,
        start_width: f64,
        start_height: f64,
        _capture: PointerCapture,
    },
}

#[derive(Debug)]
pub struct GeometryController {
    geometry: WindowGeometry,
    phase: Phase,
    listeners: PointerListeners,
}

impl Default for GeometryController {
    fn default() -> Self {
        Self::new(WindowGeometry::default())
    }
}

impl GeometryController {
    pub fn new(geometry: WindowGeometry) -> Self {
        Self {
            geometry,
            phase: Phase::Idle,
            listeners: PointerListeners::new(),
        }
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    pub fn phase(&self) -> PhaseKind {
        match self.phase {
            Phase::Idle => PhaseKind::Idle,
            Phase::Dragging { .. } => PhaseKind::Dragging,
            Phase::Resizing { .. } => PhaseKind::Resizing,
        }
    }

    /// Whether pointer-move events should be routed here.
    pub fn is_capturing(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn listeners(&self) -> &PointerListeners {
        &self.listeners
    }

    /// Pointer pressed on the header. Ignored unless idle.
    pub fn begin_drag(&mut self, pointer: Pointer, viewport: Viewport) -> bool {
        if !matches!(self.phase, Phase::Idle) {
            return false;
        }
        let (left, top) = viewport.to_pixels(self.geometry.x, self.geometry.y);
        self.phase = Phase::Dragging {
            offset_x: pointer.x - left,
            offset_y: pointer.y - top,
            _capture: self.listeners.acquire(),
        };
        trace!(x = pointer.x, y = pointer.y, "drag started");
        true
    }

    /// Pointer pressed on the resize handle. Ignored unless idle.
    pub fn begin_resize(&mut self, pointer: Pointer) -> bool {
        if !matches!(self.phase, Phase::Idle) {
            return false;
        }
        self.phase = Phase::Resizing {
            start: pointer,
            start_width: self.geometry.width,
            start_height: self.geometry.height,
            _capture: self.listeners.acquire(),
        };
        trace!(x = pointer.x, y = pointer.y, "resize started");
        true
    }

    /// Pointer moved while a gesture is active. Returns whether geometry
    /// changed hands to the gesture (false when idle).
    pub fn pointer_move(&mut self, pointer: Pointer, viewport: Viewport) -> bool {
        match &self.phase {
            Phase::Idle => false,
            Phase::Dragging {
                offset_x, offset_y, ..
            } => {
                let (x, y) = viewport.to_fraction(pointer.x - offset_x, pointer.y - offset_y);
                if !(x.is_finite() && y.is_finite()) {
                    return false;
                }
                self.geometry.x = x;
                self.geometry.y = y;
                self.geometry.clamp_position();
                true
            }
            Phase::Resizing {
                start,
                start_width,
                start_height,
                ..
            } => {
                let (dx, dy) = viewport.to_fraction(pointer.x - start.x, pointer.y - start.y);
                if !(dx.is_finite() && dy.is_finite()) {
                    return false;
                }
                self.geometry.width = start_width + dx;
                self.geometry.height = start_height + dy;
                self.geometry.clamp_size();
                self.geometry.clamp_position();
                true
            }
        }
    }

    /// Pointer released anywhere; ends any gesture and releases the capture.
    pub fn pointer_up(&mut self) {
        if self.is_capturing() {
            trace!(phase = ?self.phase(), "gesture ended");
        }
        self.phase = Phase::Idle;
    }

    /// Back to idle with default geometry.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.geometry = WindowGeometry::default();
    }
}
