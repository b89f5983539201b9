//! Configuration for the scoring engine

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Metrics listen address
    pub metrics_listen_addr: String,

    /// RocksDB configuration
    pub rocksdb: RocksDbConfig,

    /// Consensus configuration
    pub consensus: ConsensusConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/scoring"),
            service_name: "scoring-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            metrics_listen_addr: "0.0.0.0:9090".to_string(),
            rocksdb: RocksDbConfig::default(),
            consensus: ConsensusConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Consensus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Minimum size of the agreeing group before consensus is accepted.
    ///
    /// The strict-majority check (`m > n/2`) applies on top of this floor;
    /// a floor below 2 would let a single uncorroborated entry verify
    /// itself, so values below 2 are clamped on load.
    pub min_corroborating_entries: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            min_corroborating_entries: 2,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.clamp();
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("SCORING_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(addr) = std::env::var("SCORING_METRICS_ADDR") {
            config.metrics_listen_addr = addr;
        }

        if let Ok(floor) = std::env::var("SCORING_MIN_CORROBORATION") {
            config.consensus.min_corroborating_entries = floor
                .parse()
                .map_err(|e| crate::Error::Config(format!("SCORING_MIN_CORROBORATION: {}", e)))?;
        }

        config.clamp();
        Ok(config)
    }

    fn clamp(&mut self) {
        if self.consensus.min_corroborating_entries < 2 {
            self.consensus.min_corroborating_entries = 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "scoring-core");
        assert_eq!(config.consensus.min_corroborating_entries, 2);
    }

    #[test]
    fn test_corroboration_floor_clamped() {
        let toml_str = r#"
            data_dir = "/tmp/scoring"
            service_name = "scoring-core"
            service_version = "0.1.0"
            metrics_listen_addr = "0.0.0.0:9090"

            [rocksdb]
            write_buffer_size_mb = 64
            max_write_buffer_number = 4
            max_background_jobs = 2
            enable_statistics = false

            [consensus]
            min_corroborating_entries = 1
        "#;
        let mut config: Config = toml::from_str(toml_str).unwrap();
        config.clamp();
        assert_eq!(config.consensus.min_corroborating_entries, 2);
    }
}
