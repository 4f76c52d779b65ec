//! Configuration types for controlling fixture behavior.

use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Invalid recursion depth (must be > 0)
    #[error("Invalid recursion depth: {0} (must be > 0)")]
    InvalidRecursionDepth(usize),
}

/// Number of elements produced for "many" requests unless a count is given
pub const DEFAULT_REPEAT_COUNT: usize = 3;

/// How many times a request may appear on the resolution stack before it counts as recursion
pub const DEFAULT_RECURSION_DEPTH: usize = 1;

/// Configuration for a [`Fixture`](crate::Fixture)
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureConfig {
    /// Number of elements produced for sequence and collection requests
    pub repeat_count: usize,
    /// Occurrences of a request on the resolution stack that trigger the recursion guard
    pub recursion_depth: usize,
    /// Skip populating writable members after construction
    pub omit_auto_properties: bool,
    /// Optional seed for reproducible numeric sequences
    pub seed: Option<u64>,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            repeat_count: DEFAULT_REPEAT_COUNT,
            recursion_depth: DEFAULT_RECURSION_DEPTH,
            omit_auto_properties: false,
            seed: None,
        }
    }
}

impl FixtureConfig {
    /// Create a new fixture configuration with validation
    pub fn new(
        repeat_count: usize,
        recursion_depth: usize,
        omit_auto_properties: bool,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            repeat_count,
            recursion_depth,
            omit_auto_properties,
            seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the fixture configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recursion_depth == 0 {
            return Err(ConfigError::InvalidRecursionDepth(self.recursion_depth));
        }
        Ok(())
    }

    /// Set the repeat count
    pub fn with_repeat_count(mut self, repeat_count: usize) -> Self {
        self.repeat_count = repeat_count;
        self
    }

    /// Set the recursion depth
    pub fn with_recursion_depth(mut self, recursion_depth: usize) -> Self {
        self.recursion_depth = recursion_depth;
        self
    }

    /// Enable or disable auto-population of writable members
    pub fn with_omit_auto_properties(mut self, omit: bool) -> Self {
        self.omit_auto_properties = omit;
        self
    }

    /// Set the seed used by the random numeric generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_config_defaults() {
        let config = FixtureConfig::default();
        assert_eq!(config.repeat_count, 3);
        assert_eq!(config.recursion_depth, 1);
        assert!(!config.omit_auto_properties);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fixture_config_new_validates() {
        assert!(FixtureConfig::new(5, 2, true, Some(7)).is_ok());
        assert_eq!(
            FixtureConfig::new(5, 0, false, None),
            Err(ConfigError::InvalidRecursionDepth(0))
        );
    }

    #[test]
    fn test_zero_repeat_count_is_allowed() {
        let config = FixtureConfig::default().with_repeat_count(0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_style_setters() {
        let config = FixtureConfig::default()
            .with_repeat_count(10)
            .with_recursion_depth(3)
            .with_omit_auto_properties(true)
            .with_seed(42);

        assert_eq!(config.repeat_count, 10);
        assert_eq!(config.recursion_depth, 3);
        assert!(config.omit_auto_properties);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::InvalidRecursionDepth(0);
        assert_eq!(
            format!("{}", error),
            "Invalid recursion depth: 0 (must be > 0)"
        );
    }
}
