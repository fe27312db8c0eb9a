//! Actor-based concurrency for the ledger
//!
//! Every mutation goes through one writer task:
//! - The snapshot a decision is computed from is never stale, so two likes
//!   cannot both see 19 and both skip the 20th-like payout, and two coin
//!   sends cannot both pass the balance check against the same balance
//! - Each command is load -> decide -> commit before the next one starts
//! - Async message passing with backpressure (bounded mailbox)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            Engagement API (actix workers)             │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │   load snapshot -> MonetizationEngine -> ChangeSet    │
//! │                       │                               │
//! │                       ▼                               │
//! │        LedgerStore::commit (all-or-nothing)           │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::{
    engine::{CoinGiftOutcome, LikeOutcome, MonetizationEngine, ShareOutcome},
    metrics::Metrics,
    storage::{ChangeSet, LedgerStore},
    types::{NewUser, NewVideo, UserId, Video, VideoId, Wallet, MAX_OPENING_BALANCE},
    Error, Result,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Open a wallet
    RegisterUser {
        user: NewUser,
        response: oneshot::Sender<Result<Wallet>>,
    },

    /// Publish video metadata
    PublishVideo {
        video: NewVideo,
        response: oneshot::Sender<Result<Video>>,
    },

    /// Toggle a like
    ToggleLike {
        video_id: VideoId,
        user_id: UserId,
        response: oneshot::Sender<Result<LikeOutcome>>,
    },

    /// Count a share
    Share {
        video_id: VideoId,
        response: oneshot::Sender<Result<ShareOutcome>>,
    },

    /// Count a view
    View {
        video_id: VideoId,
        response: oneshot::Sender<Result<Video>>,
    },

    /// Count a comment
    Comment {
        video_id: VideoId,
        response: oneshot::Sender<Result<Video>>,
    },

    /// Gift coins to a video's owner
    SendCoins {
        video_id: VideoId,
        sender_id: UserId,
        coins: u64,
        response: oneshot::Sender<Result<CoinGiftOutcome>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes ledger messages
pub struct LedgerActor {
    /// Storage backend
    store: Arc<dyn LedgerStore>,

    /// Payout rules
    engine: Arc<MonetizationEngine>,

    /// Metrics
    metrics: Metrics,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(
        store: Arc<dyn LedgerStore>,
        engine: Arc<MonetizationEngine>,
        metrics: Metrics,
        mailbox: mpsc::Receiver<LedgerMessage>,
    ) -> Self {
        Self {
            store,
            engine,
            metrics,
            mailbox,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let LedgerMessage::Shutdown = msg {
                break;
            }

            let started = Instant::now();
            self.handle_message(msg);
            self.metrics
                .record_apply_duration(started.elapsed().as_secs_f64());
        }

        tracing::info!("Ledger actor stopped");
    }

    /// Handle a single message
    fn handle_message(&self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::RegisterUser { user, response } => {
                let _ = response.send(self.register_user(user));
            }

            LedgerMessage::PublishVideo { video, response } => {
                let _ = response.send(self.publish_video(video));
            }

            LedgerMessage::ToggleLike {
                video_id,
                user_id,
                response,
            } => {
                let _ = response.send(self.toggle_like(video_id, &user_id));
            }

            LedgerMessage::Share { video_id, response } => {
                let _ = response.send(self.share(video_id));
            }

            LedgerMessage::View { video_id, response } => {
                let result = self.count(video_id, "view", |engine, video, now| {
                    engine.apply_view(video, now)
                });
                let _ = response.send(result);
            }

            LedgerMessage::Comment { video_id, response } => {
                let result = self.count(video_id, "comment", |engine, video, now| {
                    engine.apply_comment(video, now)
                });
                let _ = response.send(result);
            }

            LedgerMessage::SendCoins {
                video_id,
                sender_id,
                coins,
                response,
            } => {
                let _ = response.send(self.send_coins(video_id, &sender_id, coins));
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn register_user(&self, user: NewUser) -> Result<Wallet> {
        if user.user_id.is_empty() {
            return Err(Error::InvalidInput("User ID must not be empty".to_string()));
        }

        if user.opening_balance.is_sign_negative() {
            return Err(Error::InvalidInput(
                "Opening balance cannot be negative".to_string(),
            ));
        }

        if user.opening_balance > MAX_OPENING_BALANCE {
            return Err(Error::InvalidInput(format!(
                "Opening balance cannot exceed {}",
                MAX_OPENING_BALANCE
            )));
        }

        if self.store.wallet_exists(&user.user_id)? {
            return Err(Error::Conflict(format!("user {} already exists", user.user_id)));
        }

        let wallet = Wallet::open(user, Utc::now());
        self.store
            .commit(&ChangeSet::default().wallet(wallet.clone()))?;

        tracing::info!(user_id = %wallet.user_id, "Wallet opened");
        Ok(wallet)
    }

    fn publish_video(&self, video: NewVideo) -> Result<Video> {
        // Owner must exist before anything can be credited to them
        self.store.get_wallet(&video.owner)?;

        let video = Video::publish(video, Utc::now());
        self.store.commit(&ChangeSet::default().video(video.clone()))?;

        tracing::info!(video_id = %video.id, owner = %video.owner, "Video published");
        Ok(video)
    }

    fn toggle_like(&self, video_id: VideoId, user_id: &UserId) -> Result<LikeOutcome> {
        let video = self.store.get_video(video_id)?;
        self.store.get_wallet(user_id)?;

        let now = Utc::now();
        let outcome = self.engine.apply_like(&video, user_id, now)?;

        let mut changes = ChangeSet::default().video(outcome.video.clone());
        if let Some(payout) = &outcome.payout {
            let mut owner = self.store.get_wallet(&payout.wallet_delta.user_id)?;
            owner.apply_delta(&payout.wallet_delta, now)?;
            changes = changes
                .wallet(owner)
                .transaction(payout.transaction.clone());
        }

        self.store.commit(&changes)?;

        self.metrics
            .record_engagement(if outcome.liked { "like" } else { "unlike" });
        if let Some(payout) = &outcome.payout {
            self.metrics.record_payout(payout.transaction.kind.as_str());
            tracing::info!(
                video_id = %video_id,
                owner = %payout.wallet_delta.user_id,
                likes = outcome.video.stats.likes,
                amount = %payout.wallet_delta.amount,
                "Like threshold payout"
            );
        }

        Ok(outcome)
    }

    fn share(&self, video_id: VideoId) -> Result<ShareOutcome> {
        let video = self.store.get_video(video_id)?;

        let now = Utc::now();
        let outcome = self.engine.apply_share(&video, now)?;

        let mut changes = ChangeSet::default().video(outcome.video.clone());
        if let Some(payout) = &outcome.payout {
            let mut owner = self.store.get_wallet(&payout.wallet_delta.user_id)?;
            owner.apply_delta(&payout.wallet_delta, now)?;
            changes = changes
                .wallet(owner)
                .transaction(payout.transaction.clone());
        }

        self.store.commit(&changes)?;

        self.metrics.record_engagement("share");
        if let Some(payout) = &outcome.payout {
            self.metrics.record_payout(payout.transaction.kind.as_str());
            tracing::info!(
                video_id = %video_id,
                owner = %payout.wallet_delta.user_id,
                shares = outcome.video.stats.shares,
                amount = %payout.wallet_delta.amount,
                "Share threshold payout"
            );
        }

        Ok(outcome)
    }

    fn count(
        &self,
        video_id: VideoId,
        kind: &str,
        apply: impl FnOnce(&MonetizationEngine, &Video, chrono::DateTime<Utc>) -> Video,
    ) -> Result<Video> {
        let video = self.store.get_video(video_id)?;
        let video = apply(&self.engine, &video, Utc::now());

        self.store.commit(&ChangeSet::default().video(video.clone()))?;
        self.metrics.record_engagement(kind);

        Ok(video)
    }

    fn send_coins(
        &self,
        video_id: VideoId,
        sender_id: &UserId,
        coins: u64,
    ) -> Result<CoinGiftOutcome> {
        let video = self.store.get_video(video_id)?;
        let sender = self.store.get_wallet(sender_id)?;
        let receiver = self.store.get_wallet(&video.owner)?;

        let outcome = match self
            .engine
            .apply_coin_gift(&sender, &receiver, &video, coins, Utc::now())
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.metrics.record_coin_gift_rejected();
                tracing::warn!(
                    video_id = %video_id,
                    sender = %sender_id,
                    coins,
                    error = %e,
                    "Coin gift rejected"
                );
                return Err(e);
            }
        };

        self.store.commit(
            &ChangeSet::default()
                .video(outcome.video.clone())
                .wallet(outcome.sender.clone())
                .wallet(outcome.receiver.clone())
                .transaction(outcome.sent.clone())
                .transaction(outcome.received.clone()),
        )?;

        self.metrics.record_engagement("coin");
        self.metrics.record_payout(outcome.received.kind.as_str());
        tracing::info!(
            video_id = %video_id,
            sender = %sender_id,
            receiver = %outcome.receiver.user_id,
            coins,
            cost = %outcome.cost,
            credit = %outcome.credit,
            "Coin gift applied"
        );

        Ok(outcome)
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Open a wallet
    pub async fn register_user(&self, user: NewUser) -> Result<Wallet> {
        self.request(|response| LedgerMessage::RegisterUser { user, response })
            .await
    }

    /// Publish video metadata
    pub async fn publish_video(&self, video: NewVideo) -> Result<Video> {
        self.request(|response| LedgerMessage::PublishVideo { video, response })
            .await
    }

    /// Toggle a like
    pub async fn toggle_like(&self, video_id: VideoId, user_id: UserId) -> Result<LikeOutcome> {
        self.request(|response| LedgerMessage::ToggleLike {
            video_id,
            user_id,
            response,
        })
        .await
    }

    /// Count a share
    pub async fn share(&self, video_id: VideoId) -> Result<ShareOutcome> {
        self.request(|response| LedgerMessage::Share { video_id, response })
            .await
    }

    /// Count a view
    pub async fn view(&self, video_id: VideoId) -> Result<Video> {
        self.request(|response| LedgerMessage::View { video_id, response })
            .await
    }

    /// Count a comment
    pub async fn comment(&self, video_id: VideoId) -> Result<Video> {
        self.request(|response| LedgerMessage::Comment { video_id, response })
            .await
    }

    /// Gift coins
    pub async fn send_coins(
        &self,
        video_id: VideoId,
        sender_id: UserId,
        coins: u64,
    ) -> Result<CoinGiftOutcome> {
        self.request(|response| LedgerMessage::SendCoins {
            video_id,
            sender_id,
            coins,
            response,
        })
        .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(
    store: Arc<dyn LedgerStore>,
    engine: Arc<MonetizationEngine>,
    metrics: Metrics,
    mailbox_capacity: usize,
) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = LedgerActor::new(store, engine, metrics, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
