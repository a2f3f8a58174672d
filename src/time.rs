//! Frame clock.
//!
//! Tracks wall-clock frame deltas, a frame counter and a smoothed FPS value,
//! and converts wall seconds into simulation years:
//!
//! ```text
//! sim_dt = wall_dt * years_per_second * time_scale
//! ```
//!
//! While paused the wall delta is still measured (for FPS) but no simulation
//! time is produced.

use std::time::{Duration, Instant};

/// Interval between FPS recalculations.
pub const FPS_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on a single wall delta, so a stalled frame (debugger, window
/// drag) does not jump the simulation.
pub const MAX_FRAME_DELTA: f64 = 0.25;

/// Wall-clock frame timing and simulation-time conversion.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    /// Last wall delta in seconds.
    wall_delta: f64,
    /// Last simulation delta in years.
    sim_delta: f64,
    frame_count: u64,
    fps: f64,
    fps_frame_count: u64,
    fps_update_time: Instant,
    paused: bool,
    /// Simulation years per wall second at scale 1.
    years_per_second: f64,
    time_scale: f64,
    fixed_delta: Option<f64>,
}

impl FrameClock {
    pub fn new(years_per_second: f64, time_scale: f64) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            wall_delta: 0.0,
            sim_delta: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            paused: false,
            years_per_second: years_per_second.max(0.0),
            time_scale: time_scale.max(0.0),
            fixed_delta: None,
        }
    }

    /// Advance one frame using the current instant. Returns the simulation
    /// delta in years.
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Advance one frame as if it ended at `now`.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        let raw = now.saturating_duration_since(self.last_frame).as_secs_f64();
        self.wall_delta = self.fixed_delta.unwrap_or(raw).min(MAX_FRAME_DELTA);
        self.last_frame = now;
        self.frame_count += 1;

        let since_fps = now.saturating_duration_since(self.fps_update_time);
        if since_fps >= FPS_UPDATE_INTERVAL {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f64 / since_fps.as_secs_f64();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.sim_delta = if self.paused {
            0.0
        } else {
            self.wall_delta * self.years_per_second * self.time_scale
        };
        self.sim_delta
    }

    /// Wall seconds since the clock was created.
    pub fn wall_elapsed(&self) -> Duration {
        self.last_frame.saturating_duration_since(self.start)
    }

    #[inline]
    pub fn wall_delta(&self) -> f64 {
        self.wall_delta
    }

    /// Simulation years produced by the last tick.
    #[inline]
    pub fn sim_delta(&self) -> f64 {
        self.sim_delta
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn years_per_second(&self) -> f64 {
        self.years_per_second
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Negative scales clamp to 0.
    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale.max(0.0);
    }

    pub fn set_years_per_second(&mut self, years: f64) {
        self.years_per_second = years.max(0.0);
    }

    /// Use a fixed wall delta instead of measured time. `None` restores
    /// real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f64>) {
        self.fixed_delta = delta;
    }

    /// Restart counters from now. Keeps scale and pause state.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last_frame = now;
        self.wall_delta = 0.0;
        self.sim_delta = 0.0;
        self.frame_count = 0;
        self.fps = 0.0;
        self.fps_frame_count = 0;
        self.fps_update_time = now;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_new() {
        let clock = FrameClock::default();
        assert_eq!(clock.frame(), 0);
        assert!(!clock.is_paused());
        assert_eq!(clock.time_scale(), 1.0);
    }

    #[test]
    fn test_sim_delta_conversion() {
        let mut clock = FrameClock::new(2.0, 3.0);
        let start = clock.last_frame;
        let dt = clock.tick_at(start + Duration::from_millis(100));
        assert!((clock.wall_delta() - 0.1).abs() < 1e-9);
        assert!((dt - 0.6).abs() < 1e-9);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_pause_stops_sim_time() {
        let mut clock = FrameClock::default();
        let start = clock.last_frame;
        clock.toggle_pause();
        let dt = clock.tick_at(start + Duration::from_millis(50));
        assert_eq!(dt, 0.0);
        assert!(clock.wall_delta() > 0.0);
        clock.set_paused(false);
        assert!(clock.tick_at(start + Duration::from_millis(100)) > 0.0);
    }

    #[test]
    fn test_stalled_frame_is_capped() {
        let mut clock = FrameClock::default();
        let start = clock.last_frame;
        clock.tick_at(start + Duration::from_secs(5));
        assert_eq!(clock.wall_delta(), MAX_FRAME_DELTA);
    }

    #[test]
    fn test_fps_updates_on_interval() {
        let mut clock = FrameClock::default();
        let start = clock.last_frame;
        for i in 1..=30 {
            clock.tick_at(start + Duration::from_millis(i * 20));
        }
        // 25 frames in the first 500 ms window.
        assert!((clock.fps() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_scale_clamps_and_fixed_delta() {
        let mut clock = FrameClock::default();
        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);

        clock.set_time_scale(1.0);
        clock.set_fixed_delta(Some(1.0 / 60.0));
        let start = clock.last_frame;
        let dt = clock.tick_at(start + Duration::from_millis(200));
        assert!((dt - 1.0 / 60.0).abs() < 1e-12);
    }
}
