//! Frame-driven animation clock for the spinner and the animated ellipsis.

/// Spinner rotation per tick, in degrees.
pub const ANGLE_STEP_DEGREES: f32 = 10.0;
/// Ticks between two ellipsis phases.
pub const DOTS_INTERVAL_TICKS: u64 = 15;
/// Number of ellipsis phases (1 to 4 dots).
pub const DOTS_PHASES: u8 = 4;

const FULL_TURN: f32 = 360.0;
const DOTS: [&str; DOTS_PHASES as usize] = [".", "..", "...", "...."];

/// Snapshot of the clock handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    /// Spinner rotation in degrees, always in `0.0..360.0`.
    pub angle: f32,
    /// Ellipsis phase in `0..DOTS_PHASES`.
    pub dots_phase: u8,
}

impl AnimationFrame {
    /// The widest ellipsis, used to reserve layout space.
    pub const WIDEST_DOTS: &'static str = "....";

    /// Ellipsis for this phase.
    pub fn dots(&self) -> &'static str {
        DOTS[usize::from(self.dots_phase % DOTS_PHASES)]
    }
}

impl Default for AnimationFrame {
    fn default() -> Self {
        Self {
            angle: 0.0,
            dots_phase: 0,
        }
    }
}

/// Free-running clock advanced once per host frame.
///
/// State changes of the request never reset it; only a new clock starts over.
#[derive(Debug, Clone)]
pub struct AnimationClock {
    step: f32,
    dots_interval: u64,
    ticks: u64,
    frame: AnimationFrame,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationClock {
    #[must_use]
    pub fn new() -> Self {
        Self::with_timing(ANGLE_STEP_DEGREES, DOTS_INTERVAL_TICKS)
    }

    /// Clock with a custom rotation step and ellipsis interval.
    #[must_use]
    pub fn with_timing(step_degrees: f32, dots_interval: u64) -> Self {
        Self {
            step: step_degrees.rem_euclid(FULL_TURN),
            dots_interval: dots_interval.max(1),
            ticks: 0,
            frame: AnimationFrame::default(),
        }
    }

    /// Advance by one tick and return the new frame.
    pub fn advance(&mut self) -> AnimationFrame {
        self.ticks = self.ticks.wrapping_add(1);
        self.frame.angle = (self.frame.angle + self.step).rem_euclid(FULL_TURN);
        if self.ticks % self.dots_interval == 0 {
            self.frame.dots_phase = (self.frame.dots_phase + 1) % DOTS_PHASES;
        }
        self.frame
    }

    pub fn frame(&self) -> AnimationFrame {
        self.frame
    }

    /// Number of ticks since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
