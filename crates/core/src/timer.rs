//! Frame timing.

use std::time::{Duration, Instant};

/// Measures the time between consecutive frames.
#[derive(Debug)]
pub struct FrameTimer {
    last_tick: Instant,
}

impl FrameTimer {
    /// Create a new timer, starting from now.
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    /// Time since the previous call to `tick()`.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        delta
    }

    /// Like [`tick`](Self::tick), in seconds.
    pub fn delta_secs(&mut self) -> f32 {
        self.tick().as_secs_f32()
    }

    /// Restart the measurement so the next tick starts from now.
    pub fn reset(&mut self) {
        self.last_tick = Instant::now();
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_tick_measures_interval() {
        let mut timer = FrameTimer::new();
        thread::sleep(Duration::from_millis(5));
        let dt = timer.tick();
        assert!(dt >= Duration::from_millis(5));
    }

    #[test]
    fn test_reset_restarts_tick() {
        let mut timer = FrameTimer::new();
        thread::sleep(Duration::from_millis(50));
        timer.reset();
        assert!(timer.tick() < Duration::from_millis(50));
    }
}
