//! TweakDB loading configuration.

/// Configuration for loading a TweakDB blob.
#[derive(Debug, Clone)]
pub struct TweakDbConfig {
    /// Magic the header must carry, or `None` to accept any.
    pub expected_magic: Option<u32>,

    /// Upper bound on the descriptor count read from the blob.
    pub max_pools: u32,

    /// Whether pools of unknown type are kept as opaque bytes.
    ///
    /// When false an unknown pool fails the load with `UnsupportedFormat`.
    pub allow_unknown_pools: bool,

    /// Whether a repeated value inside a pool fails the load.
    ///
    /// When false the first occurrence wins and later copies are dropped,
    /// which shifts every following index.
    pub reject_duplicates: bool,
}

impl Default for TweakDbConfig {
    fn default() -> Self {
        Self {
            expected_magic: None,
            max_pools: 4096,
            allow_unknown_pools: true,
            reject_duplicates: true,
        }
    }
}

impl TweakDbConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the header magic to equal `magic`.
    #[must_use]
    pub const fn expected_magic(mut self, magic: u32) -> Self {
        self.expected_magic = Some(magic);
        self
    }

    /// Sets the maximum descriptor count.
    #[must_use]
    pub const fn max_pools(mut self, count: u32) -> Self {
        self.max_pools = count;
        self
    }

    /// Sets whether unknown pool types are kept as opaque bytes.
    #[must_use]
    pub const fn allow_unknown_pools(mut self, value: bool) -> Self {
        self.allow_unknown_pools = value;
        self
    }

    /// Sets whether duplicate pool values fail the load.
    #[must_use]
    pub const fn reject_duplicates(mut self, value: bool) -> Self {
        self.reject_duplicates = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TweakDbConfig::default();
        assert_eq!(config.expected_magic, None);
        assert!(config.allow_unknown_pools);
        assert!(config.reject_duplicates);
    }

    #[test]
    fn builder_pattern() {
        let config = TweakDbConfig::new()
            .expected_magic(0x0bb1_db57)
            .max_pools(8)
            .allow_unknown_pools(false)
            .reject_duplicates(false);

        assert_eq!(config.expected_magic, Some(0x0bb1_db57));
        assert_eq!(config.max_pools, 8);
        assert!(!config.allow_unknown_pools);
        assert!(!config.reject_duplicates);
    }
}
