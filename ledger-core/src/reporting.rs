//! Earnings reporting
//!
//! Read-only aggregation over a creator's videos and transaction log.

use crate::{
    engine::{CreatorStats, Eligibility, MonetizationEngine},
    types::{Transaction, TransactionKind, Video},
};
use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Earnings grouped by the engagement source that produced them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    /// View revenue
    pub views: Decimal,
    /// Like threshold payouts
    pub likes: Decimal,
    /// Share threshold payouts
    pub shares: Decimal,
    /// Comment revenue
    pub comments: Decimal,
    /// Net coin flow (received minus sent)
    pub coins: Decimal,
}

impl SourceBreakdown {
    fn record(&mut self, transaction: &Transaction) {
        let bucket = match transaction.kind {
            TransactionKind::LikeRevenue => &mut self.likes,
            TransactionKind::ShareRevenue => &mut self.shares,
            TransactionKind::CoinSent | TransactionKind::CoinReceived => &mut self.coins,
        };
        *bucket += transaction.amount;
    }
}

/// Per-creator earnings summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsSummary {
    /// Sum of earnings across the creator's videos
    pub total_earnings: Decimal,
    /// Earnings of videos updated since `since`
    pub today_earnings: Decimal,
    /// Published videos
    pub videos_count: u64,
    /// Transaction amounts by source
    pub by_source: SourceBreakdown,
    /// Monetization eligibility
    pub eligibility: Eligibility,
}

/// Aggregate a creator's videos and transactions
pub fn summarize(
    videos: &[Video],
    transactions: &[Transaction],
    since: DateTime<Utc>,
    engine: &MonetizationEngine,
) -> EarningsSummary {
    let total_earnings = videos.iter().map(|v| v.earnings).sum();

    let today_earnings = videos
        .iter()
        .filter(|v| v.updated_at >= since)
        .map(|v| v.earnings)
        .sum();

    let mut by_source = SourceBreakdown::default();
    for transaction in transactions {
        by_source.record(transaction);
    }

    let videos_count = videos.len() as u64;
    let eligibility = engine.check_eligibility(&CreatorStats { videos_count });

    EarningsSummary {
        total_earnings,
        today_earnings,
        videos_count,
        by_source,
        eligibility,
    }
}

/// Start of the local calendar day containing `now`
pub fn local_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.with_timezone(&Local)
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or(now)
}

/// Sum of revenue transactions referencing a video
pub fn video_revenue<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Decimal {
    transactions
        .into_iter()
        .filter(|t| t.kind.is_video_revenue())
        .map(|t| t.amount)
        .sum()
}
