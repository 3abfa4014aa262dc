//! Frame timing for the viewer loop.
//!
//! [`FrameTimer::tick`] is called once per redraw. It measures wall-clock
//! frame time (for camera easing and the FPS readout) and derives the
//! simulation step from it, or from a fixed step when one is configured.
//!
//! ```ignore
//! let mut timer = FrameTimer::new().with_fixed_step(Some(1.0 / 60.0));
//! let tick = timer.tick();
//! camera.update(tick.frame_secs);
//! simulation.step(tick.sim_dt);
//! ```

use std::time::{Duration, Instant};

/// Longest wall-clock frame fed to the simulation; longer stalls are cut.
const MAX_FRAME_SECS: f64 = 0.25;

/// Timing for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Wall-clock seconds since the previous tick.
    pub frame_secs: f32,
    /// Simulated seconds to advance. Zero while paused.
    pub sim_dt: f64,
}

/// Wall-clock timer with pause, time scale and an FPS estimate.
#[derive(Debug)]
pub struct FrameTimer {
    last_tick: Instant,
    frames: u64,
    fps: f32,
    fps_window_start: Instant,
    fps_window_frames: u64,
    fps_interval: Duration,
    fixed_step: Option<f64>,
    time_scale: f64,
    paused: bool,
}

impl FrameTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_tick: now,
            frames: 0,
            fps: 0.0,
            fps_window_start: now,
            fps_window_frames: 0,
            fps_interval: Duration::from_millis(500),
            fixed_step: None,
            time_scale: 1.0,
            paused: false,
        }
    }

    /// Advance the simulation by `step` seconds per frame instead of the
    /// measured frame time. `None` or a non-positive step uses wall time.
    pub fn with_fixed_step(mut self, step: Option<f64>) -> Self {
        self.fixed_step = step.filter(|s| *s > 0.0 && s.is_finite());
        self
    }

    /// Measure the frame and return how far to advance.
    pub fn tick(&mut self) -> FrameTick {
        let now = Instant::now();
        let frame = now.duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;
        self.frames += 1;

        self.fps_window_frames += 1;
        let window = now.duration_since(self.fps_window_start);
        if window >= self.fps_interval {
            self.fps = self.fps_window_frames as f32 / window.as_secs_f32();
            self.fps_window_frames = 0;
            self.fps_window_start = now;
        }

        let sim_dt = if self.paused {
            0.0
        } else {
            self.fixed_step.unwrap_or(frame.min(MAX_FRAME_SECS)) * self.time_scale
        };

        FrameTick {
            frame_secs: frame as f32,
            sim_dt,
        }
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames per second over the last half second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    #[inline]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
