use crate::auth::Caller;
use crate::errors::{ApiError, Result};
use crate::models::{
    EarningsResponse, FeedItem, FeedQuery, FeedResponse, LikeResponse, PublishVideoRequest,
    PublishVideoResponse, RegisterUserRequest, SendCoinsRequest, SendCoinsResponse,
    ShareResponse, TransactionsResponse,
};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use elosya_ledger::{Error as LedgerError, Ledger, NewUser, NewVideo, UserId, VideoId};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Default feed page size
const DEFAULT_FEED_LIMIT: usize = 10;

/// Feed page size cap, registered as app data
#[derive(Debug, Clone, Copy)]
pub struct FeedLimit(pub usize);

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "engagement-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus metrics endpoint
pub async fn metrics_endpoint(ledger: web::Data<Arc<Ledger>>) -> Result<HttpResponse> {
    let encoder = TextEncoder::new();
    let metric_families = ledger.metrics().registry().gather();

    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer))
}

/// Register user endpoint
pub async fn register_user(
    ledger: web::Data<Arc<Ledger>>,
    request: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    request.validate()?;

    let wallet = ledger
        .register_user(NewUser {
            user_id: UserId::new(request.user_id.trim()),
            username: request.username,
            opening_balance: request.opening_balance,
        })
        .await?;

    Ok(HttpResponse::Created().json(wallet))
}

/// Wallet endpoint
pub async fn get_wallet(
    ledger: web::Data<Arc<Ledger>>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    let wallet = ledger.wallet(&UserId::new(user_id.into_inner()))?;
    Ok(HttpResponse::Ok().json(wallet))
}

/// Publish video endpoint
pub async fn publish_video(
    ledger: web::Data<Arc<Ledger>>,
    caller: Caller,
    request: web::Json<PublishVideoRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    request.validate()?;

    let video = ledger
        .publish_video(NewVideo {
            owner: caller.into_inner(),
            title: request.title,
            description: request.description,
            hashtags: request.hashtags,
            media_url: request.media_url,
            location: request.location,
            visibility: request.visibility,
            monetize: request.monetize,
        })
        .await?;

    Ok(HttpResponse::Created().json(PublishVideoResponse {
        success: true,
        video_id: *video.id.as_uuid(),
        message: "Video published".to_string(),
        estimated_earnings: ledger.estimate_earnings().into(),
    }))
}

/// Public feed endpoint
pub async fn get_feed(
    ledger: web::Data<Arc<Ledger>>,
    feed_limit: web::Data<FeedLimit>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let page = query.page.unwrap_or(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .clamp(1, feed_limit.0);

    let feed = ledger.feed(page, limit)?;
    let now = Utc::now();

    let mut videos = Vec::with_capacity(feed.videos.len());
    for video in feed.videos {
        // A missing owner renders as unknown; any other failure is a server error
        let username = match ledger.wallet(&video.owner) {
            Ok(wallet) => Some(wallet.username),
            Err(LedgerError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        videos.push(FeedItem::new(video, username, now));
    }

    Ok(HttpResponse::Ok().json(FeedResponse {
        success: true,
        videos,
        page: feed.page,
        total: feed.total,
    }))
}

/// Toggle like endpoint
pub async fn toggle_like(
    ledger: web::Data<Arc<Ledger>>,
    caller: Caller,
    video_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = ledger
        .toggle_like(VideoId::from_uuid(*video_id), caller.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(LikeResponse {
        success: true,
        liked: outcome.liked,
        likes: outcome.video.stats.likes,
        earnings: outcome.video.earnings,
    }))
}

/// Share endpoint
pub async fn share(
    ledger: web::Data<Arc<Ledger>>,
    video_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = ledger.share(VideoId::from_uuid(*video_id)).await?;

    Ok(HttpResponse::Ok().json(ShareResponse {
        success: true,
        shares: outcome.video.stats.shares,
        earnings: outcome.video.earnings,
    }))
}

/// View counter endpoint
pub async fn record_view(
    ledger: web::Data<Arc<Ledger>>,
    video_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let video = ledger.record_view(VideoId::from_uuid(*video_id)).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "views": video.stats.views
    })))
}

/// Comment counter endpoint
pub async fn record_comment(
    ledger: web::Data<Arc<Ledger>>,
    video_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let video = ledger.record_comment(VideoId::from_uuid(*video_id)).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "comments": video.stats.comments
    })))
}

/// Send coins endpoint
pub async fn send_coins(
    ledger: web::Data<Arc<Ledger>>,
    caller: Caller,
    request: web::Json<SendCoinsRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();
    request.validate()?;

    let outcome = ledger
        .send_coins(
            VideoId::from_uuid(request.video_id),
            caller.into_inner(),
            request.amount,
        )
        .await?;

    Ok(HttpResponse::Ok().json(SendCoinsResponse {
        success: true,
        coins_sent: outcome.coins,
        cost: outcome.cost,
        receiver_earnings: outcome.credit,
        new_balance: outcome.sender.balance,
    }))
}

/// Earnings summary endpoint
pub async fn get_earnings(
    ledger: web::Data<Arc<Ledger>>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    let summary = ledger.earnings_summary(&UserId::new(user_id.into_inner()))?;
    Ok(HttpResponse::Ok().json(EarningsResponse::from(summary)))
}

/// Transaction log endpoint
pub async fn get_transactions(
    ledger: web::Data<Arc<Ledger>>,
    user_id: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = UserId::new(user_id.into_inner());
    let transactions = ledger.transactions_for(&user_id)?;

    Ok(HttpResponse::Ok().json(TransactionsResponse {
        success: true,
        user_id: user_id.to_string(),
        transactions,
    }))
}

/// Rejects JSON bodies that fail to parse with the API error shape
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::Validation(err.to_string()).into())
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/users", web::post().to(register_user))
            .route("/users/{user_id}/wallet", web::get().to(get_wallet))
            .route("/videos", web::post().to(publish_video))
            .route("/feed", web::get().to(get_feed))
            .route("/like/{video_id}", web::post().to(toggle_like))
            .route("/share/{video_id}", web::post().to(share))
            .route("/view/{video_id}", web::post().to(record_view))
            .route("/comment/{video_id}", web::post().to(record_comment))
            .route("/send-coins", web::post().to(send_coins))
            .route("/earnings/{user_id}", web::get().to(get_earnings))
            .route("/transactions/{user_id}", web::get().to(get_transactions)),
    )
    .route("/metrics", web::get().to(metrics_endpoint))
    .route("/health", web::get().to(health_check));
}
