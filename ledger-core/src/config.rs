//! Configuration for the ledger
//!
//! Money values are decimals and must be written as strings in TOML
//! (`like_payout = "0.05"`).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Store selection
    pub storage: StorageConfig,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Writer actor configuration
    pub actor: ActorConfig,

    /// Payout and eligibility rules
    pub monetization: MonetizationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/ledger"),
            service_name: "elosya-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            storage: StorageConfig::default(),
            rocksdb: RocksDBConfig::default(),
            actor: ActorConfig::default(),
            monetization: MonetizationConfig::default(),
        }
    }
}

/// Which store backs the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory (lost on restart)
    #[default]
    Memory,
    /// RocksDB under `data_dir` (feature `persistent`)
    Rocksdb,
}

/// Store selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend
    pub backend: StorageBackend,
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Writer actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

/// Payout rules applied by the monetization engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonetizationConfig {
    /// Likes per payout
    pub like_threshold: u64,

    /// Paid each time the like counter reaches a multiple of `like_threshold`
    pub like_payout: Decimal,

    /// Shares per payout
    pub share_threshold: u64,

    /// Paid each time the share counter reaches a multiple of `share_threshold`
    pub share_payout: Decimal,

    /// Price of one coin
    pub coin_unit_price: Decimal,

    /// Fraction of a coin gift credited to the creator
    pub creator_share: Decimal,

    /// Advertised revenue per 1000 views (estimate only, never paid)
    pub estimated_per_1000_views: Decimal,

    /// Advertised revenue per 50 comments (estimate only, never paid)
    pub estimated_per_50_comments: Decimal,

    /// Eligibility requirements
    pub eligibility: EligibilityRequirements,
}

impl Default for MonetizationConfig {
    fn default() -> Self {
        Self {
            like_threshold: 20,
            like_payout: dec!(0.05),
            share_threshold: 10,
            share_payout: dec!(0.10),
            coin_unit_price: dec!(0.10),
            creator_share: dec!(0.85),
            estimated_per_1000_views: dec!(0.01),
            estimated_per_50_comments: dec!(0.02),
            eligibility: EligibilityRequirements::default(),
        }
    }
}

/// Creator monetization requirements
///
/// Only `min_videos` is enforced; the others are declared but inactive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityRequirements {
    /// Minimum published videos
    pub min_videos: u64,

    /// Minimum followers (inactive)
    pub min_followers: u64,

    /// Minimum engagement rate (inactive)
    pub min_engagement_rate: Decimal,
}

impl Default for EligibilityRequirements {
    fn default() -> Self {
        Self {
            min_videos: 10,
            min_followers: 10_000,
            min_engagement_rate: dec!(0.05),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("ELOSYA_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(backend) = std::env::var("ELOSYA_STORAGE_BACKEND") {
            config.storage.backend = match backend.to_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "rocksdb" => StorageBackend::Rocksdb,
                other => {
                    return Err(crate::Error::Config(format!(
                        "Unknown storage backend: {}",
                        other
                    )))
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject rule sets the engine cannot apply
    pub fn validate(&self) -> crate::Result<()> {
        let m = &self.monetization;

        if m.like_threshold == 0 || m.share_threshold == 0 {
            return Err(crate::Error::Config(
                "Payout thresholds must be positive".to_string(),
            ));
        }

        if m.like_payout.is_sign_negative() || m.share_payout.is_sign_negative() {
            return Err(crate::Error::Config(
                "Payout amounts cannot be negative".to_string(),
            ));
        }

        if m.coin_unit_price <= Decimal::ZERO {
            return Err(crate::Error::Config(
                "Coin unit price must be positive".to_string(),
            ));
        }

        if m.creator_share < Decimal::ZERO || m.creator_share > Decimal::ONE {
            return Err(crate::Error::Config(format!(
                "Creator share must be within [0, 1], got {}",
                m.creator_share
            )));
        }

        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "Actor mailbox capacity must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
