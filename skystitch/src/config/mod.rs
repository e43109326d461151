//! Retrieval configuration.
//!
//! Groups the tunables of the level search and tile fan-out into one
//! immutable config object with builder-style setters and documented
//! defaults.

/// Default pixel budget for one composite: 8192 * 8192 * 8.
pub const DEFAULT_MAX_PIXELS: u64 = 8192 * 8192 * 8;

/// Default cap on concurrent tile fetches within one level.
pub const DEFAULT_PARALLEL_FETCHES: usize = 32;

/// Configuration for one retrieval session.
///
/// # Example
///
/// ```
/// use skystitch::config::RetrievalConfig;
///
/// let config = RetrievalConfig::default();
/// assert_eq!(config.max_pixels(), 8192 * 8192 * 8);
/// assert_eq!(config.parallel_fetches(), 32);
///
/// let config = RetrievalConfig::new()
///     .with_max_pixels(4096 * 4096)
///     .with_parallel_fetches(8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalConfig {
    /// Maximum composite area in pixels before a level is skipped
    max_pixels: u64,
    /// Maximum number of concurrent tile fetches
    parallel_fetches: usize,
}

impl RetrievalConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pixel budget for one composite.
    ///
    /// A candidate zoom level whose bounding-box pixel area exceeds this
    /// budget is skipped in favour of the next coarser level.
    /// Default: `8192 * 8192 * 8`.
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Set the cap on concurrent tile fetches within one level.
    ///
    /// Higher values shorten wall-clock time for large tile ranges at the
    /// cost of more open connections. Default: 32.
    pub fn with_parallel_fetches(mut self, parallel: usize) -> Self {
        self.parallel_fetches = parallel;
        self
    }

    /// Get the pixel budget.
    pub fn max_pixels(&self) -> u64 {
        self.max_pixels
    }

    /// Get the concurrent-fetch cap.
    pub fn parallel_fetches(&self) -> usize {
        self.parallel_fetches
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
            parallel_fetches: DEFAULT_PARALLEL_FETCHES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.max_pixels(), DEFAULT_MAX_PIXELS);
        assert_eq!(config.parallel_fetches(), DEFAULT_PARALLEL_FETCHES);
    }

    #[test]
    fn test_builder() {
        let config = RetrievalConfig::new()
            .with_max_pixels(1024)
            .with_parallel_fetches(4);
        assert_eq!(config.max_pixels(), 1024);
        assert_eq!(config.parallel_fetches(), 4);
    }
}
