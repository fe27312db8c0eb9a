use actix_web::{http::StatusCode, test, web, App};
use elosya_ledger::{
    storage::{ChangeSet, LedgerStore, MemoryStore},
    Config, Error, Ledger, Transaction, UserId, Video, VideoId, Wallet,
};
use engagement_api::handlers::{self, FeedLimit};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

macro_rules! app {
    ($ledger:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($ledger.clone()))
                .app_data(web::Data::new(FeedLimit(50)))
                .app_data(handlers::json_config())
                .configure(handlers::configure_routes),
        )
        .await
    };
}

fn ledger() -> Arc<Ledger> {
    Arc::new(Ledger::open(Config::default()).unwrap())
}

/// Memory store whose wallet reads can be switched to fail
#[derive(Default)]
struct FlakyWallets {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl LedgerStore for FlakyWallets {
    fn get_video(&self, video_id: VideoId) -> elosya_ledger::Result<Video> {
        self.inner.get_video(video_id)
    }

    fn get_wallet(&self, user_id: &UserId) -> elosya_ledger::Result<Wallet> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Storage("wallet table unavailable".to_string()));
        }
        self.inner.get_wallet(user_id)
    }

    fn videos_by_owner(&self, owner: &UserId) -> elosya_ledger::Result<Vec<Video>> {
        self.inner.videos_by_owner(owner)
    }

    fn public_videos(&self) -> elosya_ledger::Result<Vec<Video>> {
        self.inner.public_videos()
    }

    fn transactions_for_user(&self, user_id: &UserId) -> elosya_ledger::Result<Vec<Transaction>> {
        self.inner.transactions_for_user(user_id)
    }

    fn transactions_for_video(
        &self,
        video_id: VideoId,
    ) -> elosya_ledger::Result<Vec<Transaction>> {
        self.inner.transactions_for_video(video_id)
    }

    fn commit(&self, changes: &ChangeSet) -> elosya_ledger::Result<()> {
        self.inner.commit(changes)
    }
}

fn register(user_id: &str, balance: &str) -> test::TestRequest {
    test::TestRequest::post().uri("/api/users").set_json(json!({
        "user_id": user_id,
        "username": user_id,
        "opening_balance": balance
    }))
}

fn publish(owner: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/videos")
        .insert_header(("x-user-id", owner))
        .set_json(json!({
            "title": "Morning run",
            "description": "5k by the river",
            "hashtags": ["#Run", "fitness"],
            "media_url": "/uploads/videos/run.mp4"
        }))
}

#[actix_web::test]
async fn test_health() {
    let ledger = ledger();
    let app = app!(ledger);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_register_and_conflict() {
    let ledger = ledger();
    let app = app!(ledger);

    let resp = test::call_service(&app, register("alice", "2.50").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["balance"], "2.50");

    let resp = test::call_service(&app, register("alice", "0").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "duplicate_error");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/users/alice/wallet")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_register_rejects_oversized_opening_balance() {
    let ledger = ledger();
    let app = app!(ledger);

    let resp = test::call_service(
        &app,
        register("whale", "79228162514264337593543950335").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "validation_error");

    let resp = test::call_service(&app, register("whale", "-1").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Nothing was opened, so a sane request still succeeds
    let resp = test::call_service(&app, register("whale", "1000000").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn test_publish_requires_caller() {
    let ledger = ledger();
    let app = app!(ledger);

    let req = test::TestRequest::post()
        .uri("/api/videos")
        .set_json(json!({ "title": "t", "media_url": "/v.mp4" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Unknown owner
    let resp = test::call_service(&app, publish("ghost").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_publish_returns_estimate_and_appears_in_feed() {
    let ledger = ledger();
    let app = app!(ledger);

    test::call_service(&app, register("creator", "0").to_request()).await;
    let resp = test::call_service(&app, publish("creator").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["estimated_earnings"]["breakdown"]["per_like_threshold"], "0.05");
    assert_eq!(body["estimated_earnings"]["potential"], "Up to 0.10 for 10K views");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/feed?page=1&limit=5").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["videos"][0]["timestamp"], "just now");
    assert_eq!(body["videos"][0]["user"]["username"], "creator");
    assert_eq!(body["videos"][0]["location"], "Not specified");
    assert_eq!(body["videos"][0]["hashtags"], json!(["run", "fitness"]));
}

#[actix_web::test]
async fn test_like_toggle_and_payout() {
    let ledger = ledger();
    let app = app!(ledger);

    test::call_service(&app, register("creator", "0").to_request()).await;
    let resp = test::call_service(&app, publish("creator").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let video_id = body["video_id"].as_str().unwrap().to_string();

    for i in 0..20 {
        let fan = format!("fan{}", i);
        test::call_service(&app, register(&fan, "0").to_request()).await;
        let req = test::TestRequest::post()
            .uri(&format!("/api/like/{}", video_id))
            .insert_header(("x-user-id", fan.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/like/{}", video_id))
        .insert_header(("x-user-id", "fan0"))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["liked"], false);
    assert_eq!(body["likes"], 19);
    assert_eq!(body["earnings"], "0.05");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/transactions/creator")
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
    assert_eq!(body["transactions"][0]["kind"], "like_revenue");
}

#[actix_web::test]
async fn test_send_coins() {
    let ledger = ledger();
    let app = app!(ledger);

    test::call_service(&app, register("creator", "0").to_request()).await;
    test::call_service(&app, register("fan", "1.50").to_request()).await;
    let resp = test::call_service(&app, publish("creator").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let video_id = body["video_id"].clone();

    let req = test::TestRequest::post()
        .uri("/api/send-coins")
        .insert_header(("x-user-id", "fan"))
        .set_json(json!({ "video_id": video_id, "amount": 10 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["cost"], "1.00");
    assert_eq!(body["receiver_earnings"], "0.8500");
    assert_eq!(body["new_balance"], "0.50");

    // Second gift exceeds the remaining balance
    let req = test::TestRequest::post()
        .uri("/api/send-coins")
        .insert_header(("x-user-id", "fan"))
        .set_json(json!({ "video_id": video_id, "amount": 10 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "insufficient_balance");

    // Zero coins fail validation
    let req = test::TestRequest::post()
        .uri("/api/send-coins")
        .insert_header(("x-user-id", "fan"))
        .set_json(json!({ "video_id": video_id, "amount": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/earnings/creator").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["stats"]["videos_count"], 1);
    assert_eq!(body["eligibility"]["eligible"], false);
    assert_eq!(
        body["eligibility"]["missing_requirements"][0],
        "9 more videos required"
    );
}

#[actix_web::test]
async fn test_unknown_video_is_not_found() {
    let ledger = ledger();
    let app = app!(ledger);

    let uri = format!("/api/share/{}", uuid::Uuid::new_v4());
    let resp = test::call_service(&app, test::TestRequest::post().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/earnings/ghost").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_view_and_comment_counters() {
    let ledger = ledger();
    let app = app!(ledger);

    test::call_service(&app, register("creator", "0").to_request()).await;
    let resp = test::call_service(&app, publish("creator").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    let video_id = body["video_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/view/{}", video_id))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["views"], 1);

    let req = test::TestRequest::post()
        .uri(&format!("/api/comment/{}", video_id))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["comments"], 1);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("elosya_engagement_events_total"));
}

#[actix_web::test]
async fn test_feed_surfaces_wallet_storage_errors() {
    let store = Arc::new(FlakyWallets::default());
    let ledger = Arc::new(Ledger::with_store(Config::default(), store.clone()).unwrap());
    let app = app!(ledger);

    test::call_service(&app, register("creator", "0").to_request()).await;
    let resp = test::call_service(&app, publish("creator").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    store.failing.store(true, Ordering::SeqCst);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/feed").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "storage_error");
}
