use serde::{Deserialize, Serialize};

/// Pending count above which `put` flushes every buffered path.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 100_000;

/// Buffer tuning, readable from the `[ingest]` section of a repository
/// config file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub flush_threshold: usize,
}

impl BufferConfig {
    pub fn with_threshold(flush_threshold: usize) -> Self {
        Self { flush_threshold }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold() {
        assert_eq!(BufferConfig::default().flush_threshold, 100_000);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: BufferConfig = toml::from_str("").unwrap();
        assert_eq!(config, BufferConfig::default());

        let config: BufferConfig = toml::from_str("flush_threshold = 5").unwrap();
        assert_eq!(config, BufferConfig::with_threshold(5));
    }
}
