//! Frame rate sampling.

/// Number of frames averaged per FPS report.
pub const FPS_WINDOW: usize = 128;

/// Averages instantaneous frame rates over fixed windows of
/// [`FPS_WINDOW`] frames.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    samples: Vec<f32>,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            samples: Vec::with_capacity(FPS_WINDOW),
        }
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a frame that took `delta_secs`.
    ///
    /// Returns the average frame rate when this sample completes a window;
    /// the window then starts over. Non-positive deltas are ignored.
    pub fn record(&mut self, delta_secs: f32) -> Option<f32> {
        if delta_secs.is_nan() || delta_secs <= 0.0 {
            return None;
        }
        self.samples.push(1.0 / delta_secs);
        if self.samples.len() < FPS_WINDOW {
            return None;
        }

        let average = self.samples.iter().sum::<f32>() / self.samples.len() as f32;
        self.samples.clear();
        Some(average)
    }

    /// Samples collected in the current window.
    pub fn pending(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_once_per_window() {
        let mut fps = FpsCounter::new();
        for _ in 0..FPS_WINDOW - 1 {
            assert_eq!(fps.record(1.0 / 60.0), None);
        }

        let average = fps.record(1.0 / 60.0).unwrap();
        assert!((average - 60.0).abs() < 0.01);
        assert_eq!(fps.pending(), 0);
    }

    #[test]
    fn test_averages_rates_not_durations() {
        let mut fps = FpsCounter::new();
        let mut report = None;
        for i in 0..FPS_WINDOW {
            let dt = if i % 2 == 0 { 0.01 } else { 0.02 };
            report = fps.record(dt);
        }

        // Mean of 100 and 50
        assert!((report.unwrap() - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_ignores_degenerate_delta() {
        let mut fps = FpsCounter::new();
        assert_eq!(fps.record(0.0), None);
        assert_eq!(fps.record(-1.0), None);
        assert_eq!(fps.record(f32::NAN), None);
        assert_eq!(fps.pending(), 0);
    }
}
