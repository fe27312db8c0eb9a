//! Monetization engine
//!
//! Pure decision logic turning one engagement action into ledger mutations.
//! Every operation takes a snapshot and returns the new state plus the
//! transactions to append; nothing here performs I/O. Callers must apply an
//! outcome as one atomic unit and must serialize the read-modify-write cycle
//! per entity (see [`crate::actor`]).
//!
//! # Payout rules
//!
//! - Likes toggle. On the increment path only, reaching a positive multiple
//!   of `like_threshold` pays `like_payout` to the owner. Unliking never
//!   claws back.
//! - Shares only grow. Reaching a positive multiple of `share_threshold`
//!   pays `share_payout`.
//! - A coin gift of `n` coins costs `n * coin_unit_price`; the owner gets
//!   `cost * creator_share`. The remainder is the platform fee and is not
//!   credited to any account.

use crate::{
    config::{EligibilityRequirements, MonetizationConfig},
    types::{add_money, Transaction, TransactionKind, UserId, Video, Wallet, WalletDelta},
    Error, Result,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Threshold payout credited to a video owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    /// Revenue entry for the audit log
    pub transaction: Transaction,
    /// Credit to apply to the owner's wallet
    pub wallet_delta: WalletDelta,
}

/// Result of a like toggle
#[derive(Debug, Clone, PartialEq)]
pub struct LikeOutcome {
    /// Updated video
    pub video: Video,
    /// Like-set membership changed (always true for well-formed input)
    pub toggled: bool,
    /// Membership of the caller after the toggle
    pub liked: bool,
    /// Threshold payout, if this like crossed one
    pub payout: Option<Payout>,
}

/// Result of a share
#[derive(Debug, Clone, PartialEq)]
pub struct ShareOutcome {
    /// Updated video
    pub video: Video,
    /// Threshold payout, if this share crossed one
    pub payout: Option<Payout>,
}

/// Result of an accepted coin gift
#[derive(Debug, Clone, PartialEq)]
pub struct CoinGiftOutcome {
    /// Sender wallet after the debit
    pub sender: Wallet,
    /// Owner wallet after the credit
    pub receiver: Wallet,
    /// Updated video
    pub video: Video,
    /// Coins gifted
    pub coins: u64,
    /// Gross cost debited from the sender
    pub cost: Decimal,
    /// Amount credited to the owner
    pub credit: Decimal,
    /// Negative `coin_sent` entry for the sender
    pub sent: Transaction,
    /// Positive `coin_received` entry for the owner
    pub received: Transaction,
}

impl CoinGiftOutcome {
    /// Gross cost not credited to anyone
    pub fn platform_fee(&self) -> Decimal {
        self.cost - self.credit
    }
}

/// Aggregate creator stats used by the eligibility check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorStats {
    /// Published videos
    pub videos_count: u64,
}

/// Eligibility verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    /// Creator may monetize
    pub eligible: bool,
    /// Human-readable unmet requirements
    pub missing_requirements: Vec<String>,
}

/// Published rate card shown to creators on upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsEstimate {
    /// Per 1000 views (estimate only)
    pub per_1000_views: Decimal,
    /// Per `like_threshold` likes
    pub per_like_threshold: Decimal,
    /// Per `share_threshold` shares
    pub per_share_threshold: Decimal,
    /// Per 50 comments (estimate only)
    pub per_50_comments: Decimal,
    /// Potential earnings for 10K views
    pub potential_per_10k_views: Decimal,
}

/// Monetization engine
#[derive(Debug, Clone)]
pub struct MonetizationEngine {
    config: MonetizationConfig,
}

impl MonetizationEngine {
    /// Create engine from payout rules
    pub fn new(config: MonetizationConfig) -> Self {
        Self { config }
    }

    /// Active payout rules
    pub fn config(&self) -> &MonetizationConfig {
        &self.config
    }

    /// Toggle `user_id`'s like on `video`
    pub fn apply_like(
        &self,
        video: &Video,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<LikeOutcome> {
        if user_id.is_empty() {
            return Err(Error::InvalidInput("User ID must not be empty".to_string()));
        }

        let mut video = video.clone();
        video.updated_at = now;

        if video.liked_by.remove(user_id) {
            video.stats.likes = video.stats.likes.saturating_sub(1);
            return Ok(LikeOutcome {
                video,
                toggled: true,
                liked: false,
                payout: None,
            });
        }

        video.liked_by.insert(user_id.clone());
        video.stats.likes += 1;

        let payout = if crosses_threshold(video.monetize, video.stats.likes, self.config.like_threshold)
        {
            let description = format!("Like revenue ({} likes)", video.stats.likes);
            Some(self.credit_owner(
                &mut video,
                TransactionKind::LikeRevenue,
                self.config.like_payout,
                description,
                now,
            )?)
        } else {
            None
        };

        Ok(LikeOutcome {
            video,
            toggled: true,
            liked: true,
            payout,
        })
    }

    /// Count one share of `video`
    pub fn apply_share(&self, video: &Video, now: DateTime<Utc>) -> Result<ShareOutcome> {
        let mut video = video.clone();
        video.updated_at = now;
        video.stats.shares += 1;

        let payout =
            if crosses_threshold(video.monetize, video.stats.shares, self.config.share_threshold) {
                let description = format!("Share revenue ({} shares)", video.stats.shares);
                Some(self.credit_owner(
                    &mut video,
                    TransactionKind::ShareRevenue,
                    self.config.share_payout,
                    description,
                    now,
                )?)
            } else {
                None
            };

        Ok(ShareOutcome { video, payout })
    }

    /// Count one view (no payout)
    pub fn apply_view(&self, video: &Video, now: DateTime<Utc>) -> Video {
        let mut video = video.clone();
        video.stats.views += 1;
        video.updated_at = now;
        video
    }

    /// Count one comment (no payout)
    pub fn apply_comment(&self, video: &Video, now: DateTime<Utc>) -> Video {
        let mut video = video.clone();
        video.stats.comments += 1;
        video.updated_at = now;
        video
    }

    /// Transfer `coins` from `sender` to the owner of `video`
    ///
    /// Fails with [`Error::InsufficientBalance`] when the sender cannot
    /// cover the gross cost; nothing is returned to apply in that case.
    pub fn apply_coin_gift(
        &self,
        sender: &Wallet,
        receiver: &Wallet,
        video: &Video,
        coins: u64,
        now: DateTime<Utc>,
    ) -> Result<CoinGiftOutcome> {
        if coins == 0 {
            return Err(Error::InvalidInput(
                "Coin amount must be positive".to_string(),
            ));
        }

        if receiver.user_id != video.owner {
            return Err(Error::InvalidInput(format!(
                "Receiver {} does not own video {}",
                receiver.user_id, video.id
            )));
        }

        if sender.user_id == receiver.user_id {
            return Err(Error::InvalidInput(
                "Cannot send coins to your own video".to_string(),
            ));
        }

        let cost = Decimal::from(coins)
            .checked_mul(self.config.coin_unit_price)
            .ok_or_else(|| Error::InvalidInput("Coin amount too large".to_string()))?;

        if sender.balance < cost {
            return Err(Error::InsufficientBalance {
                required: cost,
                available: sender.balance,
            });
        }

        let credit = cost
            .checked_mul(self.config.creator_share)
            .ok_or_else(|| Error::InvalidInput("Coin amount too large".to_string()))?;

        // Every sum is computed before any snapshot changes
        let receiver_balance = add_money(receiver.balance, credit)?;
        let receiver_earnings = add_money(receiver.total_earnings, credit)?;
        let video_earnings = add_money(video.earnings, credit)?;
        let video_coins = video
            .stats
            .coins
            .checked_add(coins)
            .ok_or_else(|| Error::InvalidInput("Coin counter overflow".to_string()))?;

        let mut sender = sender.clone();
        sender.balance -= cost;
        sender.updated_at = now;

        let mut receiver = receiver.clone();
        receiver.balance = receiver_balance;
        receiver.total_earnings = receiver_earnings;
        receiver.updated_at = now;

        let mut video = video.clone();
        video.stats.coins = video_coins;
        video.earnings = video_earnings;
        video.updated_at = now;

        let sent = Transaction::new(
            sender.user_id.clone(),
            Some(video.id),
            TransactionKind::CoinSent,
            -cost,
            format!("Sent {} coins to @{}", coins, receiver.username),
            now,
        );
        let received = Transaction::new(
            receiver.user_id.clone(),
            Some(video.id),
            TransactionKind::CoinReceived,
            credit,
            format!("Received {} coins from @{}", coins, sender.username),
            now,
        );

        Ok(CoinGiftOutcome {
            sender,
            receiver,
            video,
            coins,
            cost,
            credit,
            sent,
            received,
        })
    }

    /// Decide whether a creator may monetize
    pub fn check_eligibility(&self, stats: &CreatorStats) -> Eligibility {
        check_eligibility(&self.config.eligibility, stats)
    }

    /// Rate card for a newly published video
    pub fn estimate_earnings(&self) -> EarningsEstimate {
        EarningsEstimate {
            per_1000_views: self.config.estimated_per_1000_views,
            per_like_threshold: self.config.like_payout,
            per_share_threshold: self.config.share_payout,
            per_50_comments: self.config.estimated_per_50_comments,
            potential_per_10k_views: self.config.estimated_per_1000_views * Decimal::TEN,
        }
    }

    fn credit_owner(
        &self,
        video: &mut Video,
        kind: TransactionKind,
        amount: Decimal,
        description: String,
        now: DateTime<Utc>,
    ) -> Result<Payout> {
        video.earnings = add_money(video.earnings, amount)?;

        Ok(Payout {
            transaction: Transaction::new(
                video.owner.clone(),
                Some(video.id),
                kind,
                amount,
                description,
                now,
            ),
            wallet_delta: WalletDelta {
                user_id: video.owner.clone(),
                amount,
            },
        })
    }
}

fn crosses_threshold(monetize: bool, count: u64, threshold: u64) -> bool {
    monetize && threshold > 0 && count > 0 && count % threshold == 0
}

/// Eligibility rule: enough published videos
///
/// `min_followers` and `min_engagement_rate` are not consulted.
pub fn check_eligibility(
    requirements: &EligibilityRequirements,
    stats: &CreatorStats,
) -> Eligibility {
    let mut missing_requirements = Vec::new();

    if stats.videos_count < requirements.min_videos {
        let remaining = requirements.min_videos - stats.videos_count;
        let noun = if remaining == 1 { "video" } else { "videos" };
        missing_requirements.push(format!("{} more {} required", remaining, noun));
    }

    Eligibility {
        eligible: missing_requirements.is_empty(),
        missing_requirements,
    }
}
