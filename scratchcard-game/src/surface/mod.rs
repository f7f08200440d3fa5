pub mod overlay;

pub use overlay::{compute_coverage, OverlayBuffer, OVERLAY_LABEL};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceState {
    Fresh,
    Scratching,
    Revealed,
}

/// Why a surface revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealCause {
    Threshold,
    Forced,
}

/// Pointer or touch input in surface-local logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    /// Release, cancel or leaving the surface.
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSettings {
    pub brush_radius: f64,
    /// Coverage percentage that must be exceeded to reveal.
    pub reveal_threshold: f64,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            brush_radius: 35.0,
            reveal_threshold: 45.0,
        }
    }
}

/// Erasable overlay for one play.
///
/// Input handlers return `Some(cause)` exactly once, on the transition into
/// `Revealed`; every later call returns `None`.
pub struct ScratchSurface {
    overlay: OverlayBuffer,
    settings: SurfaceSettings,
    state: SurfaceState,
    dragging: bool,
    percent_revealed: f64,
}

impl ScratchSurface {
    pub fn new(width: u32, height: u32, settings: SurfaceSettings) -> Self {
        Self {
            overlay: OverlayBuffer::new(width, height),
            settings,
            state: SurfaceState::Fresh,
            dragging: false,
            percent_revealed: 0.0,
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_revealed(&self) -> bool {
        self.state == SurfaceState::Revealed
    }

    pub fn percent_revealed(&self) -> f64 {
        self.percent_revealed
    }

    pub fn overlay(&self) -> &OverlayBuffer {
        &self.overlay
    }

    pub fn size(&self) -> (u32, u32) {
        (self.overlay.width(), self.overlay.height())
    }

    pub fn handle(&mut self, input: PointerInput) -> Option<RevealCause> {
        match input {
            PointerInput::Down { x, y } => self.pointer_down(x, y),
            PointerInput::Move { x, y } => self.pointer_move(x, y),
            PointerInput::Up => {
                self.pointer_up();
                None
            }
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<RevealCause> {
        if self.is_revealed() {
            return None;
        }
        self.dragging = true;
        self.state = SurfaceState::Scratching;
        self.erase_at(x, y)
    }

    /// Moves only erase while a drag is active.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<RevealCause> {
        if !self.dragging || self.is_revealed() {
            return None;
        }
        self.erase_at(x, y)
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Reveal without reaching the threshold.
    pub fn force_reveal(&mut self) -> Option<RevealCause> {
        self.reveal(RevealCause::Forced)
    }

    /// Redraw at the new size. Coverage restarts from zero unless the
    /// surface is already revealed, in which case nothing changes.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.is_revealed() {
            return;
        }

        tracing::debug!(
            "Surface resized to {}x{}, coverage reset from {:.1}%",
            width,
            height,
            self.percent_revealed
        );
        self.overlay = OverlayBuffer::new(width, height);
        self.state = SurfaceState::Fresh;
        self.dragging = false;
        self.percent_revealed = 0.0;
    }

    fn erase_at(&mut self, x: f64, y: f64) -> Option<RevealCause> {
        self.overlay.erase_disc(x, y, self.settings.brush_radius);
        self.percent_revealed = compute_coverage(&self.overlay);

        if self.percent_revealed > self.settings.reveal_threshold {
            self.reveal(RevealCause::Threshold)
        } else {
            None
        }
    }

    fn reveal(&mut self, cause: RevealCause) -> Option<RevealCause> {
        if self.is_revealed() {
            return None;
        }

        self.state = SurfaceState::Revealed;
        self.dragging = false;
        tracing::debug!(
            "Surface revealed ({:?}) at {:.1}% coverage",
            cause,
            self.percent_revealed
        );
        Some(cause)
    }
}

impl std::fmt::Debug for ScratchSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchSurface")
            .field("size", &self.size())
            .field("state", &self.state)
            .field("dragging", &self.dragging)
            .field("percent_revealed", &self.percent_revealed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> ScratchSurface {
        ScratchSurface::new(200, 100, SurfaceSettings::default())
    }

    /// Horizontal strokes across the whole surface.
    fn sweep(surface: &mut ScratchSurface) -> Vec<RevealCause> {
        let mut events = Vec::new();
        for row in [20.0, 50.0, 80.0] {
            events.extend(surface.handle(PointerInput::Down { x: 0.0, y: row }));
            let mut x = 0.0;
            while x <= 200.0 {
                events.extend(surface.handle(PointerInput::Move { x, y: row }));
                x += 10.0;
            }
            events.extend(surface.handle(PointerInput::Up));
        }
        events
    }

    #[test]
    fn test_threshold_reveals_once() {
        let mut surface = surface();
        let events = sweep(&mut surface);

        assert_eq!(events, vec![RevealCause::Threshold]);
        assert!(surface.is_revealed());
        assert!(surface.percent_revealed() > 45.0);

        // further scratching after the reveal is ignored
        assert!(sweep(&mut surface).is_empty());
    }

    #[test]
    fn test_move_without_drag_does_nothing() {
        let mut surface = surface();
        assert_eq!(surface.pointer_move(100.0, 50.0), None);
        assert_eq!(surface.percent_revealed(), 0.0);
        assert_eq!(surface.state(), SurfaceState::Fresh);
    }

    #[test]
    fn test_small_scratch_stays_below_threshold() {
        let mut surface = surface();
        assert_eq!(surface.pointer_down(100.0, 50.0), None);
        surface.pointer_up();

        assert_eq!(surface.state(), SurfaceState::Scratching);
        assert!(surface.percent_revealed() > 0.0);
        assert!(surface.percent_revealed() < 45.0);
    }

    #[test]
    fn test_forced_reveal_is_idempotent() {
        let mut surface = surface();
        assert_eq!(surface.force_reveal(), Some(RevealCause::Forced));
        assert_eq!(surface.force_reveal(), None);
        assert_eq!(surface.pointer_down(10.0, 10.0), None);
        assert!(sweep(&mut surface).is_empty());
    }

    #[test]
    fn test_resize_resets_coverage_until_revealed() {
        let mut surface = surface();
        let _ = surface.pointer_down(100.0, 50.0);
        surface.resize(300, 150);

        assert_eq!(surface.percent_revealed(), 0.0);
        assert_eq!(surface.state(), SurfaceState::Fresh);
        assert_eq!(surface.size(), (300, 150));

        let _ = surface.force_reveal();
        surface.resize(50, 50);
        assert_eq!(surface.size(), (300, 150));
        assert!(surface.is_revealed());
    }
}
