//! Elosya Ledger
//!
//! Turns engagement on short videos into creator earnings and keeps the
//! wallet ledger and transaction log that record them.
//!
//! # Architecture
//!
//! - **Pure engine**: [`MonetizationEngine`] decides outcomes from a snapshot
//! - **Single writer**: one actor applies load, decide and commit per command
//! - **Atomic commit**: every outcome lands as one [`storage::ChangeSet`]
//! - **Reporting**: read-only earnings summaries and eligibility
//!
//! # Invariants
//!
//! - A wallet only changes together with the transaction explaining it
//! - A video's earnings equal the revenue transactions referencing it
//! - A user's like is counted at most once per video
//! - Coin gifts are all-or-nothing; balances never go negative

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod actor;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod reporting;
pub mod storage;
pub mod types;

// Re-exports
pub use config::{Config, MonetizationConfig};
pub use engine::{
    CoinGiftOutcome, CreatorStats, EarningsEstimate, Eligibility, LikeOutcome,
    MonetizationEngine, Payout, ShareOutcome,
};
pub use error::{Error, Result};
pub use ledger::{FeedPage, Ledger};
pub use reporting::{EarningsSummary, SourceBreakdown};
pub use types::{
    EngagementStats, NewUser, NewVideo, Transaction, TransactionKind, UserId, Video, VideoId,
    Visibility, Wallet,
};
