use chrono::{DateTime, Utc};
use elosya_ledger::{
    types::MAX_OPENING_BALANCE, EarningsEstimate, EarningsSummary, Eligibility, SourceBreakdown, Transaction, Video,
    Visibility,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// User registration request
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[serde(default)]
    #[validate(custom = "validate_opening_balance")]
    pub opening_balance: Decimal,
}

fn validate_opening_balance(balance: &Decimal) -> Result<(), ValidationError> {
    if balance.is_sign_negative() || *balance > MAX_OPENING_BALANCE {
        return Err(ValidationError::new("opening_balance_range"));
    }
    Ok(())
}

/// Video publication request (caller is the owner)
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct PublishVideoRequest {
    #[validate(length(min = 1, max = 150))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 2200))]
    pub description: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[validate(length(min = 1, max = 512))]
    pub media_url: String,
    pub location: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default = "default_monetize")]
    pub monetize: bool,
}

fn default_monetize() -> bool {
    true
}

/// Rate card returned on publication
#[derive(Debug, Serialize, Deserialize)]
pub struct EstimatedEarnings {
    pub potential: String,
    pub breakdown: EarningsEstimate,
}

impl From<EarningsEstimate> for EstimatedEarnings {
    fn from(breakdown: EarningsEstimate) -> Self {
        Self {
            potential: format!(
                "Up to {} for 10K views",
                breakdown.potential_per_10k_views.round_dp(2)
            ),
            breakdown,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishVideoResponse {
    pub success: bool,
    pub video_id: Uuid,
    pub message: String,
    pub estimated_earnings: EstimatedEarnings,
}

/// Feed paging parameters
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedUser {
    pub user_id: String,
    pub username: String,
}

/// Video as rendered in the feed
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: Uuid,
    pub url: String,
    pub user: FeedUser,
    pub title: String,
    pub description: String,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub coins: u64,
    pub location: String,
    pub hashtags: Vec<String>,
    pub timestamp: String,
    pub earnings: Decimal,
}

impl FeedItem {
    pub fn new(video: Video, username: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: *video.id.as_uuid(),
            url: video.media_url,
            user: FeedUser {
                username: username.unwrap_or_else(|| format!("@{}", video.owner)),
                user_id: video.owner.to_string(),
            },
            title: video.title,
            description: video.description,
            likes: video.stats.likes,
            comments: video.stats.comments,
            shares: video.stats.shares,
            coins: video.stats.coins,
            location: video.location.unwrap_or_else(|| "Not specified".to_string()),
            hashtags: video.hashtags,
            timestamp: time_ago(video.created_at, now),
            earnings: video.earnings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    pub success: bool,
    pub videos: Vec<FeedItem>,
    pub page: usize,
    pub total: usize,
}

/// Coarse age label: "just now", "5min", "3h", "2d", "4w"
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds().max(0);

    match seconds {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}min", s / 60),
        s if s < 86_400 => format!("{}h", s / 3_600),
        s if s < 604_800 => format!("{}d", s / 86_400),
        s => format!("{}w", s / 604_800),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub success: bool,
    pub liked: bool,
    pub likes: u64,
    pub earnings: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub success: bool,
    pub shares: u64,
    pub earnings: Decimal,
}

/// Coin gift request (caller is the sender)
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SendCoinsRequest {
    pub video_id: Uuid,
    #[validate(range(min = 1, max = 1_000_000))]
    pub amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendCoinsResponse {
    pub success: bool,
    pub coins_sent: u64,
    pub cost: Decimal,
    pub receiver_earnings: Decimal,
    pub new_balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EarningsStats {
    pub total_earnings: Decimal,
    pub today_earnings: Decimal,
    pub videos_count: u64,
    pub by_source: SourceBreakdown,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EarningsResponse {
    pub success: bool,
    pub stats: EarningsStats,
    pub eligibility: Eligibility,
}

impl From<EarningsSummary> for EarningsResponse {
    fn from(summary: EarningsSummary) -> Self {
        Self {
            success: true,
            stats: EarningsStats {
                total_earnings: summary.total_earnings,
                today_earnings: summary.today_earnings,
                videos_count: summary.videos_count,
                by_source: summary.by_source,
            },
            eligibility: summary.eligibility,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub success: bool,
    pub user_id: String,
    pub transactions: Vec<Transaction>,
}
