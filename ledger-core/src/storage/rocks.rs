//! RocksDB-backed store
//!
//! # Column Families
//!
//! - `videos` - Video snapshots (key: video_id)
//! - `wallets` - Wallets (key: user_id)
//! - `transactions` - Append-only transaction log (key: transaction id, UUIDv7)
//! - `indices` - Secondary indices for owner, user and video lookups

use super::{ChangeSet, LedgerStore};
use crate::{
    config::Config,
    error::{Error, Result},
    types::{Transaction, UserId, Video, VideoId, Visibility, Wallet},
};
use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, DB};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_VIDEOS: &str = "videos";
const CF_WALLETS: &str = "wallets";
const CF_TRANSACTIONS: &str = "transactions";
const CF_INDICES: &str = "indices";

/// Index tags
const IDX_OWNER_VIDEO: u8 = b'o';
const IDX_USER_TX: u8 = b'u';
const IDX_VIDEO_TX: u8 = b'v';
const IDX_PUBLIC_VIDEO: u8 = b'p';

/// Storage wrapper for RocksDB
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_VIDEOS, Self::cf_options_lz4()),
            ColumnFamilyDescriptor::new(CF_WALLETS, Self::cf_options_lz4()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_zstd()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_lz4()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_lz4() -> Options {
        let mut opts = Options::default();
        // Snapshots and indices are read on every request
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_zstd() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    fn get_value<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(&cf, key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Keys in `indices` starting with `prefix`, suffix only
    fn scan_index(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf(CF_INDICES)?;
        let mut suffixes = Vec::new();

        for item in self.db.prefix_iterator_cf(&cf, prefix) {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            suffixes.push(key[prefix.len()..].to_vec());
        }

        Ok(suffixes)
    }

    fn load_videos(&self, prefix: &[u8]) -> Result<Vec<Video>> {
        let mut videos = Vec::new();
        for suffix in self.scan_index(prefix)? {
            if let Some(video) = self.get_value::<Video>(CF_VIDEOS, &suffix)? {
                videos.push(video);
            }
        }
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(videos)
    }

    fn load_transactions(&self, prefix: &[u8]) -> Result<Vec<Transaction>> {
        // Suffixes are UUIDv7 bytes, so index order is append order
        let mut transactions = Vec::new();
        for suffix in self.scan_index(prefix)? {
            if let Some(tx) = self.get_value::<Transaction>(CF_TRANSACTIONS, &suffix)? {
                transactions.push(tx);
            }
        }
        Ok(transactions)
    }

    // Index key helpers

    fn user_prefix(tag: u8, user_id: &UserId) -> Vec<u8> {
        let bytes = user_id.as_str().as_bytes();
        let mut key = Vec::with_capacity(5 + bytes.len());
        key.push(tag);
        key.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        key.extend_from_slice(bytes);
        key
    }

    fn video_prefix(tag: u8, video_id: VideoId) -> Vec<u8> {
        let mut key = vec![tag];
        key.extend_from_slice(video_id.as_uuid().as_bytes());
        key
    }

    fn with_suffix(mut prefix: Vec<u8>, id: &Uuid) -> Vec<u8> {
        prefix.extend_from_slice(id.as_bytes());
        prefix
    }
}

impl LedgerStore for RocksStore {
    fn get_video(&self, video_id: VideoId) -> Result<Video> {
        self.get_value(CF_VIDEOS, video_id.as_uuid().as_bytes())?
            .ok_or_else(|| Error::NotFound(format!("video {}", video_id)))
    }

    fn get_wallet(&self, user_id: &UserId) -> Result<Wallet> {
        self.get_value(CF_WALLETS, user_id.as_str().as_bytes())?
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))
    }

    fn videos_by_owner(&self, owner: &UserId) -> Result<Vec<Video>> {
        self.load_videos(&Self::user_prefix(IDX_OWNER_VIDEO, owner))
    }

    fn public_videos(&self) -> Result<Vec<Video>> {
        self.load_videos(&[IDX_PUBLIC_VIDEO])
    }

    fn transactions_for_user(&self, user_id: &UserId) -> Result<Vec<Transaction>> {
        self.load_transactions(&Self::user_prefix(IDX_USER_TX, user_id))
    }

    fn transactions_for_video(&self, video_id: VideoId) -> Result<Vec<Transaction>> {
        self.load_transactions(&Self::video_prefix(IDX_VIDEO_TX, video_id))
    }

    fn commit(&self, changes: &ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let cf_videos = self.cf(CF_VIDEOS)?;
        let cf_wallets = self.cf(CF_WALLETS)?;
        let cf_transactions = self.cf(CF_TRANSACTIONS)?;
        let cf_indices = self.cf(CF_INDICES)?;

        let mut batch = WriteBatch::default();

        // 1. Videos (+ owner and feed indices)
        for video in &changes.videos {
            let id = video.id.as_uuid();
            batch.put_cf(&cf_videos, id.as_bytes(), bincode::serialize(video)?);

            let owner_key =
                Self::with_suffix(Self::user_prefix(IDX_OWNER_VIDEO, &video.owner), id);
            batch.put_cf(&cf_indices, owner_key, b"");

            if video.visibility == Visibility::Public {
                batch.put_cf(&cf_indices, Self::with_suffix(vec![IDX_PUBLIC_VIDEO], id), b"");
            }
        }

        // 2. Wallets
        for wallet in &changes.wallets {
            batch.put_cf(
                &cf_wallets,
                wallet.user_id.as_str().as_bytes(),
                bincode::serialize(wallet)?,
            );
        }

        // 3. Transactions (+ user and video indices)
        for tx in &changes.transactions {
            batch.put_cf(&cf_transactions, tx.id.as_bytes(), bincode::serialize(tx)?);

            let user_key = Self::with_suffix(Self::user_prefix(IDX_USER_TX, &tx.user_id), &tx.id);
            batch.put_cf(&cf_indices, user_key, b"");

            if let Some(video_id) = tx.video_id {
                let video_key =
                    Self::with_suffix(Self::video_prefix(IDX_VIDEO_TX, video_id), &tx.id);
                batch.put_cf(&cf_indices, video_key, b"");
            }
        }

        // Atomic commit
        self.db.write(batch)?;

        tracing::debug!(
            videos = changes.videos.len(),
            wallets = changes.wallets.len(),
            transactions = changes.transactions.len(),
            "Change set committed"
        );

        Ok(())
    }
}
