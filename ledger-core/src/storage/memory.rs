//! In-memory store

use super::{ChangeSet, LedgerStore};
use crate::{
    types::{Transaction, UserId, Video, VideoId, Visibility, Wallet},
    Error, Result,
};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct Tables {
    videos: HashMap<VideoId, Video>,
    wallets: HashMap<UserId, Wallet>,
    transactions: Vec<Transaction>,
}

/// Store keeping everything in process memory
///
/// A commit runs under a single write lock, so readers observe either none
/// or all of a change set.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transactions in the log
    pub fn transaction_count(&self) -> usize {
        self.tables.read().transactions.len()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("MemoryStore")
            .field("videos", &tables.videos.len())
            .field("wallets", &tables.wallets.len())
            .field("transactions", &tables.transactions.len())
            .finish()
    }
}

impl LedgerStore for MemoryStore {
    fn get_video(&self, video_id: VideoId) -> Result<Video> {
        self.tables
            .read()
            .videos
            .get(&video_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("video {}", video_id)))
    }

    fn get_wallet(&self, user_id: &UserId) -> Result<Wallet> {
        self.tables
            .read()
            .wallets
            .get(user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))
    }

    fn videos_by_owner(&self, owner: &UserId) -> Result<Vec<Video>> {
        let mut videos: Vec<Video> = self
            .tables
            .read()
            .videos
            .values()
            .filter(|v| &v.owner == owner)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(videos)
    }

    fn public_videos(&self) -> Result<Vec<Video>> {
        let mut videos: Vec<Video> = self
            .tables
            .read()
            .videos
            .values()
            .filter(|v| v.visibility == Visibility::Public)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(videos)
    }

    fn transactions_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>> {
        Ok(self
            .tables
            .read()
            .transactions
            .iter()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect())
    }

    fn transactions_for_video(&self, video_id: VideoId) -> Result<Vec<Transaction>> {
        Ok(self
            .tables
            .read()
            .transactions
            .iter()
            .filter(|t| t.video_id == Some(video_id))
            .cloned()
            .collect())
    }

    fn commit(&self, changes: &ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut tables = self.tables.write();

        for video in &changes.videos {
            tables.videos.insert(video.id, video.clone());
        }

        for wallet in &changes.wallets {
            tables.wallets.insert(wallet.user_id.clone(), wallet.clone());
        }

        tables
            .transactions
            .extend(changes.transactions.iter().cloned());

        tracing::debug!(
            videos = changes.videos.len(),
            wallets = changes.wallets.len(),
            transactions = changes.transactions.len(),
            "Change set committed"
        );

        Ok(())
    }
}
