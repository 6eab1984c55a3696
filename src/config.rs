/// Runtime configuration for a queue.
///
/// Capacity is a compile-time parameter of [`Queue`](crate::Queue); the
/// runtime knobs cover endpoint registration bounds and metrics.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Maximum number of readers that may register.
    pub max_readers: usize,
    /// Maximum number of writers that may register.
    pub max_writers: usize,
    /// Enable metrics collection (slight overhead).
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint bound is 0 or greater than 128.
    pub const fn new(max_readers: usize, max_writers: usize, enable_metrics: bool) -> Self {
        assert!(
            max_readers > 0 && max_readers <= 128,
            "max_readers must be between 1 and 128"
        );
        assert!(
            max_writers > 0 && max_writers <= 128,
            "max_writers must be between 1 and 128"
        );

        Self {
            max_readers,
            max_writers,
            enable_metrics,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_readers: 16,
            max_writers: 16,
            enable_metrics: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds() {
        let config = Config::default();
        assert_eq!(config.max_readers, 16);
        assert_eq!(config.max_writers, 16);
        assert!(!config.enable_metrics);
    }

    #[test]
    #[should_panic(expected = "max_readers")]
    fn rejects_zero_readers() {
        let _ = Config::new(0, 1, false);
    }

    #[test]
    #[should_panic(expected = "max_writers")]
    fn rejects_oversized_writer_bound() {
        let _ = Config::new(1, 129, false);
    }
}
