//! Main ledger orchestration layer
//!
//! Ties the store, the monetization engine and the writer actor into the
//! API the engagement service calls. Mutations are serialized through the
//! actor; reads go straight to the store.
//!
//! # Example
//!
//! ```no_run
//! use elosya_ledger::{Config, Ledger, NewUser, UserId};
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() -> elosya_ledger::Result<()> {
//!     let ledger = Ledger::open(Config::default())?;
//!
//!     ledger
//!         .register_user(NewUser {
//!             user_id: UserId::new("alice"),
//!             username: "alice".to_string(),
//!             opening_balance: Decimal::ZERO,
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    config::StorageBackend,
    engine::{CoinGiftOutcome, EarningsEstimate, LikeOutcome, MonetizationEngine, ShareOutcome},
    metrics::Metrics,
    reporting::{self, EarningsSummary},
    storage::{LedgerStore, MemoryStore},
    types::{NewUser, NewVideo, Transaction, UserId, Video, VideoId, Wallet},
    Config, Error, Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One page of the public feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    /// Videos on this page, newest first
    pub videos: Vec<Video>,
    /// 1-based page number
    pub page: usize,
    /// Public videos across all pages
    pub total: usize,
}

/// Main ledger interface
pub struct Ledger {
    /// Actor handle for mutations
    handle: LedgerHandle,

    /// Direct storage access (for reads)
    store: Arc<dyn LedgerStore>,

    /// Payout rules shared with the actor
    engine: Arc<MonetizationEngine>,

    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Open ledger with the backend named in `config.storage`
    ///
    /// Must be called inside a Tokio runtime.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let store: Arc<dyn LedgerStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            #[cfg(feature = "persistent")]
            StorageBackend::Rocksdb => Arc::new(crate::storage::RocksStore::open(&config)?),
            #[cfg(not(feature = "persistent"))]
            StorageBackend::Rocksdb => {
                return Err(Error::Config(
                    "rocksdb backend requires the `persistent` feature".to_string(),
                ))
            }
        };

        Self::with_store(config, store)
    }

    /// Open ledger over an existing store
    pub fn with_store(config: Config, store: Arc<dyn LedgerStore>) -> Result<Self> {
        let engine = Arc::new(MonetizationEngine::new(config.monetization.clone()));
        let metrics = Metrics::new().map_err(|e| Error::Config(e.to_string()))?;

        let handle = spawn_ledger_actor(
            store.clone(),
            engine.clone(),
            metrics.clone(),
            config.actor.mailbox_capacity,
        );

        tracing::info!(
            service = %config.service_name,
            backend = ?config.storage.backend,
            "Ledger opened"
        );

        Ok(Self {
            handle,
            store,
            engine,
            metrics,
            config,
        })
    }

    /// Open a wallet
    pub async fn register_user(&self, user: NewUser) -> Result<Wallet> {
        self.handle.register_user(user).await
    }

    /// Publish video metadata and return the stored video
    pub async fn publish_video(&self, video: NewVideo) -> Result<Video> {
        self.handle.publish_video(video).await
    }

    /// Toggle `user_id`'s like on a video
    pub async fn toggle_like(&self, video_id: VideoId, user_id: UserId) -> Result<LikeOutcome> {
        self.handle.toggle_like(video_id, user_id).await
    }

    /// Count a share
    pub async fn share(&self, video_id: VideoId) -> Result<ShareOutcome> {
        self.handle.share(video_id).await
    }

    /// Count a view
    pub async fn record_view(&self, video_id: VideoId) -> Result<Video> {
        self.handle.view(video_id).await
    }

    /// Count a comment
    pub async fn record_comment(&self, video_id: VideoId) -> Result<Video> {
        self.handle.comment(video_id).await
    }

    /// Gift `coins` from `sender_id` to the video's owner
    pub async fn send_coins(
        &self,
        video_id: VideoId,
        sender_id: UserId,
        coins: u64,
    ) -> Result<CoinGiftOutcome> {
        self.handle.send_coins(video_id, sender_id, coins).await
    }

    /// Wallet by user ID
    pub fn wallet(&self, user_id: &UserId) -> Result<Wallet> {
        self.store.get_wallet(user_id)
    }

    /// Video by ID
    pub fn video(&self, video_id: VideoId) -> Result<Video> {
        self.store.get_video(video_id)
    }

    /// Page through public videos, newest first
    ///
    /// `page` is 1-based; page 0 is read as page 1.
    pub fn feed(&self, page: usize, limit: usize) -> Result<FeedPage> {
        let page = page.max(1);
        let videos = self.store.public_videos()?;
        let total = videos.len();

        let videos = videos
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        Ok(FeedPage {
            videos,
            page,
            total,
        })
    }

    /// A user's transaction log, oldest first
    pub fn transactions_for(&self, user_id: &UserId) -> Result<Vec<Transaction>> {
        self.store.get_wallet(user_id)?;
        self.store.transactions_for_user(user_id)
    }

    /// Earnings summary with "today" starting at local midnight
    pub fn earnings_summary(&self, user_id: &UserId) -> Result<EarningsSummary> {
        self.earnings_summary_at(user_id, Utc::now())
    }

    /// Earnings summary as seen at `now`
    pub fn earnings_summary_at(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<EarningsSummary> {
        self.store.get_wallet(user_id)?;

        let videos = self.store.videos_by_owner(user_id)?;
        let transactions = self.store.transactions_for_user(user_id)?;

        Ok(reporting::summarize(
            &videos,
            &transactions,
            reporting::local_midnight(now),
            &self.engine,
        ))
    }

    /// Whether a video's earnings equal the revenue logged against it
    pub fn check_earnings_conservation(&self, video_id: VideoId) -> Result<bool> {
        let video = self.store.get_video(video_id)?;
        let logged = reporting::video_revenue(&self.store.transactions_for_video(video_id)?);

        if logged != video.earnings {
            tracing::error!(
                video_id = %video_id,
                earnings = %video.earnings,
                logged = %logged,
                "Video earnings diverge from transaction log"
            );
            return Ok(false);
        }

        Ok(true)
    }

    /// Rate card shown when a video is published
    pub fn estimate_earnings(&self) -> EarningsEstimate {
        self.engine.estimate_earnings()
    }

    /// Payout rules
    pub fn engine(&self) -> &MonetizationEngine {
        &self.engine
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown ledger gracefully
    pub async fn shutdown(&self) -> Result<()> {
        self.handle.shutdown().await
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("service_name", &self.config.service_name)
            .field("backend", &self.config.storage.backend)
            .finish_non_exhaustive()
    }
}
