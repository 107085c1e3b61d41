//! Shared utilities

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::info;

// ============================================================================
// Block Timer
// ============================================================================

/// Logs how long a named block took when dropped
///
/// ```
/// # use graybmp::util::BlockTimer;
/// {
///     let _t = BlockTimer::new("frame");
///     // ... work ...
/// }
/// ```
pub struct BlockTimer {
    name: &'static str,
    start: Instant,
}

impl BlockTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for BlockTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        info!(block = self.name, elapsed_ms, "block finished");
    }
}

// ============================================================================
// FPS Counter
// ============================================================================

/// FPS counter with rolling average
pub struct FpsCounter {
    frame_times: VecDeque<f32>,
    last_frame: Instant,
    sample_count: usize,
}

impl FpsCounter {
    /// Create a new FPS counter with specified sample window
    pub fn new(sample_count: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(sample_count),
            last_frame: Instant::now(),
            sample_count: sample_count.max(1),
        }
    }

    /// Call at the start of each frame to record timing
    /// Returns (delta_time, average_fps)
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.frame_times.push_back(dt);
        if self.frame_times.len() > self.sample_count {
            self.frame_times.pop_front();
        }

        let avg_dt = self.avg_frame_time_ms() / 1000.0;
        let avg_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
        (dt, avg_fps)
    }

    /// Get the average frame time in milliseconds
    pub fn avg_frame_time_ms(&self) -> f32 {
        let avg_dt: f32 =
            self.frame_times.iter().sum::<f32>() / self.frame_times.len().max(1) as f32;
        avg_dt * 1000.0
    }

    /// Get total number of frames recorded
    pub fn frame_count(&self) -> usize {
        self.frame_times.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_window_is_bounded() {
        let mut fps = FpsCounter::new(3);
        for _ in 0..10 {
            fps.tick();
        }
        assert_eq!(fps.frame_count(), 3);
        assert!(fps.avg_frame_time_ms() >= 0.0);
    }

    #[test]
    fn test_block_timer_measures() {
        let t = BlockTimer::new("test");
        std::thread::sleep(Duration::from_millis(2));
        assert!(t.elapsed() >= Duration::from_millis(2));
    }
}
