//! Storage layer
//!
//! The ledger reads snapshots through [`LedgerStore`] and writes only by
//! committing a [`ChangeSet`]: the updated videos, updated wallets and the
//! transactions produced by one engine decision. A commit is all-or-nothing,
//! so a debit is never visible without its credit, and a counter update is
//! never visible without its transaction log entries.
//!
//! # Backends
//!
//! - [`MemoryStore`] - hash maps behind one lock (default)
//! - `RocksStore` - RocksDB column families, one `WriteBatch` per commit
//!   (feature `persistent`)

mod memory;
#[cfg(feature = "persistent")]
mod rocks;

pub use memory::MemoryStore;
#[cfg(feature = "persistent")]
pub use rocks::RocksStore;

use crate::{
    types::{Transaction, UserId, Video, VideoId, Wallet},
    Result,
};

/// Atomic unit of ledger mutation
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Videos to upsert
    pub videos: Vec<Video>,
    /// Wallets to upsert
    pub wallets: Vec<Wallet>,
    /// Transactions to append
    pub transactions: Vec<Transaction>,
}

impl ChangeSet {
    /// Nothing to write
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty() && self.wallets.is_empty() && self.transactions.is_empty()
    }

    /// Add a video upsert
    pub fn video(mut self, video: Video) -> Self {
        self.videos.push(video);
        self
    }

    /// Add a wallet upsert
    pub fn wallet(mut self, wallet: Wallet) -> Self {
        self.wallets.push(wallet);
        self
    }

    /// Add a transaction append
    pub fn transaction(mut self, transaction: Transaction) -> Self {
        self.transactions.push(transaction);
        self
    }
}

/// Durable record of videos, wallets and the transaction log
pub trait LedgerStore: Send + Sync {
    /// Video by ID
    fn get_video(&self, video_id: VideoId) -> Result<Video>;

    /// Wallet by user ID
    fn get_wallet(&self, user_id: &UserId) -> Result<Wallet>;

    /// Whether a wallet exists
    fn wallet_exists(&self, user_id: &UserId) -> Result<bool> {
        match self.get_wallet(user_id) {
            Ok(_) => Ok(true),
            Err(crate::Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// All videos owned by a creator
    fn videos_by_owner(&self, owner: &UserId) -> Result<Vec<Video>>;

    /// Public videos, newest first
    fn public_videos(&self) -> Result<Vec<Video>>;

    /// Transactions owned by a user, oldest first
    fn transactions_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>>;

    /// Transactions referencing a video, oldest first
    fn transactions_for_video(&self, video_id: VideoId) -> Result<Vec<Transaction>>;

    /// Apply a change set atomically
    fn commit(&self, changes: &ChangeSet) -> Result<()>;
}
