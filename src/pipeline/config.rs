use std::time::Duration;

/// Tunables for one pipeline session.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Longer side cap for the image handed to the remover
    pub max_working_dimension: u32,

    /// Segmentation runs slower than this are reported as timeouts once
    /// they return
    pub timeout: Duration,

    /// Warn when less memory than this is available at segmentation start
    pub low_memory_threshold_mb: u64,

    /// Bounds for the advisory duration estimate
    pub min_estimate: Duration,
    pub max_estimate: Duration,

    /// How often the wait loop polls for cancellation
    pub tick_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_working_dimension: 1000,
            timeout: Duration::from_secs(30),
            low_memory_threshold_mb: 500,
            min_estimate: Duration::from_secs(5),
            max_estimate: Duration::from_secs(30),
            tick_interval: Duration::from_millis(100),
        }
    }
}

impl PipelineConfig {
    /// Rough segmentation time estimate: one second per megapixel, clamped.
    pub fn estimate_duration(&self, width: u32, height: u32) -> Duration {
        let megapixels = width as f64 * height as f64 / 1_000_000.0;
        Duration::from_secs_f64(megapixels).clamp(self.min_estimate, self.max_estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_is_clamped() {
        let config = PipelineConfig::default();
        assert_eq!(config.estimate_duration(100, 100), Duration::from_secs(5));
        assert_eq!(config.estimate_duration(10_000, 10_000), Duration::from_secs(30));
        assert_eq!(config.estimate_duration(4000, 3000), Duration::from_secs(12));
    }
}
