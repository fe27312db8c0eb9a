//! Core types for the monetization ledger
//!
//! All types are designed for:
//! - Fixed shapes (no schema-less documents)
//! - Exact arithmetic (Decimal for money)
//! - Deterministic serialization (serde, bincode in the persistent store)

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Largest balance a wallet may be opened with
pub const MAX_OPENING_BALANCE: Decimal = dec!(1_000_000);

/// Add two money amounts, failing instead of overflowing
pub fn add_money(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_add(rhs)
        .ok_or_else(|| Error::InvalidInput(format!("Amount overflow: {} + {}", lhs, rhs)))
}

/// User identifier, as presented by the caller
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank identities are rejected by the engine
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Video identifier (UUIDv7 for time-ordering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VideoId(Uuid);

impl VideoId {
    /// Fresh time-ordered ID
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who can see a video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Listed in the public feed
    #[default]
    Public,
    /// Paywalled
    Premium,
    /// Owner only
    Private,
}

/// Engagement counters of a video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStats {
    /// Views
    pub views: u64,
    /// Likes (equals the like-set cardinality)
    pub likes: u64,
    /// Comments
    pub comments: u64,
    /// Shares (monotonic)
    pub shares: u64,
    /// Coins received
    pub coins: u64,
}

/// A published video and its engagement state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Video ID
    pub id: VideoId,

    /// Creator
    pub owner: UserId,

    /// Title
    pub title: String,

    /// Description
    pub description: String,

    /// Lowercased hashtags
    pub hashtags: Vec<String>,

    /// Where the uploaded asset lives (storage is external)
    pub media_url: String,

    /// Optional location label
    pub location: Option<String>,

    /// Visibility
    pub visibility: Visibility,

    /// Monetization enabled
    pub monetize: bool,

    /// Engagement counters
    pub stats: EngagementStats,

    /// Accumulated earnings attributed to this video
    pub earnings: Decimal,

    /// Users currently liking this video
    pub liked_by: BTreeSet<UserId>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last accepted transition
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Build a freshly published video with zeroed counters
    pub fn publish(new: NewVideo, now: DateTime<Utc>) -> Self {
        Self {
            id: VideoId::generate(),
            owner: new.owner,
            title: new.title.trim().to_string(),
            description: new.description,
            hashtags: new
                .hashtags
                .into_iter()
                .map(|tag| tag.trim_start_matches('#').to_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect(),
            media_url: new.media_url,
            location: new.location,
            visibility: new.visibility,
            monetize: new.monetize,
            stats: EngagementStats::default(),
            earnings: Decimal::ZERO,
            liked_by: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` currently likes this video
    pub fn is_liked_by(&self, user_id: &UserId) -> bool {
        self.liked_by.contains(user_id)
    }
}

/// Input for publishing a video
#[derive(Debug, Clone)]
pub struct NewVideo {
    /// Creator (must be a registered user)
    pub owner: UserId,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Hashtags, with or without the leading `#`
    pub hashtags: Vec<String>,
    /// Asset location
    pub media_url: String,
    /// Location label
    pub location: Option<String>,
    /// Visibility
    pub visibility: Visibility,
    /// Monetization enabled
    pub monetize: bool,
}

/// A user's internal wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Owner
    pub user_id: UserId,

    /// Display handle
    pub username: String,

    /// Spendable balance
    pub balance: Decimal,

    /// Lifetime earnings (never decreases)
    pub total_earnings: Decimal,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Open a wallet with an opening balance
    pub fn open(new: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            user_id: new.user_id,
            username: new.username,
            balance: new.opening_balance,
            total_earnings: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an earnings credit computed by the engine
    ///
    /// Leaves the wallet untouched if either total would overflow.
    pub fn apply_delta(&mut self, delta: &WalletDelta, now: DateTime<Utc>) -> Result<()> {
        debug_assert_eq!(self.user_id, delta.user_id);
        let balance = add_money(self.balance, delta.amount)?;
        let total_earnings = add_money(self.total_earnings, delta.amount)?;

        self.balance = balance;
        self.total_earnings = total_earnings;
        self.updated_at = now;
        Ok(())
    }
}

/// Input for registering a user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Identity presented by the caller
    pub user_id: UserId,
    /// Display handle
    pub username: String,
    /// Seed balance
    pub opening_balance: Decimal,
}

/// Earnings credit for one wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletDelta {
    /// Credited user
    pub user_id: UserId,
    /// Credited amount (positive)
    pub amount: Decimal,
}

/// Kind of a balance-affecting event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TransactionKind {
    /// Like threshold payout
    LikeRevenue = 1,
    /// Share threshold payout
    ShareRevenue = 2,
    /// Coins sent (negative amount)
    CoinSent = 3,
    /// Coins received (positive amount)
    CoinReceived = 4,
}

impl TransactionKind {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::LikeRevenue => "like_revenue",
            TransactionKind::ShareRevenue => "share_revenue",
            TransactionKind::CoinSent => "coin_sent",
            TransactionKind::CoinReceived => "coin_received",
        }
    }

    /// Counts towards the earnings of the referenced video
    pub fn is_video_revenue(&self) -> bool {
        !matches!(self, TransactionKind::CoinSent)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit-log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Owning user
    pub user_id: UserId,

    /// Related video, if any
    pub video_id: Option<VideoId>,

    /// Kind
    pub kind: TransactionKind,

    /// Signed amount
    pub amount: Decimal,

    /// Human-readable description
    pub description: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// New log entry stamped with a fresh ID
    pub fn new(
        user_id: UserId,
        video_id: Option<VideoId>,
        kind: TransactionKind,
        amount: Decimal,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            video_id,
            kind,
            amount,
            description: description.into(),
            created_at,
        }
    }
}
