/// Frame timing and fixed-step accumulation
///
/// The host measures variable frame deltas with [`FrameClock`]; the physics
/// adapter converts them into a whole number of fixed sub-steps with
/// [`FixedTimestep`] so simulation stability never depends on frame rate.
use std::time::{Duration, Instant};

/// Target physics step (60 steps per second)
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// Maximum number of physics sub-steps per frame; remaining time is dropped
pub const MAX_SUBSTEPS: u32 = 3;

/// Longest frame delta the host will report (covers window drags, breakpoints)
const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// FPS tracking window (average over last N frames)
const FPS_WINDOW_SIZE: usize = 60;

/// Converts variable frame time into fixed-size simulation steps
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            step,
            max_substeps,
            accumulator: 0.0,
        }
    }

    /// Add elapsed frame time, returns the number of fixed steps to run
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        self.accumulator += dt;

        // Tolerance so that exact 1/60 deltas are not lost to rounding
        let epsilon = self.step * 1e-3;
        let mut steps = 0;
        while self.accumulator + epsilon >= self.step && steps < self.max_substeps {
            self.accumulator = (self.accumulator - self.step).max(0.0);
            steps += 1;
        }

        // Prevent a spiral of death: time we could not simulate is discarded
        if steps == self.max_substeps && self.accumulator >= self.step {
            self.accumulator = 0.0;
        }

        steps
    }

    /// Fixed step size in seconds
    pub fn step(&self) -> f32 {
        self.step
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(FIXED_TIMESTEP, MAX_SUBSTEPS)
    }
}

/// Host frame clock: measures real time between rendered frames
pub struct FrameClock {
    /// Time of last frame
    last_frame_time: Instant,

    /// Frame timing history for FPS calculation
    frame_times: Vec<Duration>,

    /// Current frame number
    frame_count: u64,

    /// Current FPS (updated periodically)
    current_fps: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame_time: now,
            frame_times: Vec::with_capacity(FPS_WINDOW_SIZE),
            frame_count: 0,
            current_fps: 0.0,
        }
    }

    /// Begin a new frame, returns the elapsed time since the previous one in seconds
    pub fn begin_frame(&mut self) -> f32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame_time).min(MAX_FRAME_DELTA);
        self.last_frame_time = now;
        self.frame_count += 1;

        self.frame_times.push(frame_time);
        if self.frame_times.len() > FPS_WINDOW_SIZE {
            self.frame_times.remove(0);
        }

        // Update FPS counter every 10 frames
        if self.frame_count % 10 == 0 {
            self.update_fps();
        }

        frame_time.as_secs_f32()
    }

    /// Restart timing, e.g. after the sequence was reset
    pub fn restart(&mut self) {
        *self = Self::new();
    }

    pub fn fps(&self) -> f32 {
        self.current_fps
    }

    fn update_fps(&mut self) {
        if self.frame_times.is_empty() {
            self.current_fps = 0.0;
            return;
        }

        let total: Duration = self.frame_times.iter().sum();
        let avg_frame_time = total / self.frame_times.len() as u32;

        self.current_fps = if avg_frame_time.as_secs_f32() > 0.0 {
            1.0 / avg_frame_time.as_secs_f32()
        } else {
            0.0
        };
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
