//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify:
//! - Like parity: a user's like is counted at most once
//! - Threshold payouts: every 20th like and every 10th share pays once
//! - Coin gifts are all-or-nothing
//! - Conservation: video earnings equal their logged revenue

use chrono::Utc;
use elosya_ledger::{
    reporting, Config, Error, Ledger, MonetizationConfig, MonetizationEngine, NewUser, NewVideo,
    UserId, Video, Visibility, Wallet,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;

fn engine() -> MonetizationEngine {
    MonetizationEngine::new(MonetizationConfig::default())
}

fn test_video(monetize: bool) -> Video {
    Video::publish(
        NewVideo {
            owner: UserId::new("creator"),
            title: "clip".to_string(),
            description: String::new(),
            hashtags: vec![],
            media_url: "/uploads/videos/clip.mp4".to_string(),
            location: None,
            visibility: Visibility::Public,
            monetize,
        },
        Utc::now(),
    )
}

fn test_wallet(id: &str, balance: Decimal) -> Wallet {
    Wallet::open(
        NewUser {
            user_id: UserId::new(id),
            username: id.to_string(),
            opening_balance: balance,
        },
        Utc::now(),
    )
}

/// Strategy for generating like toggles from a small pool of users
fn toggle_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..8, 0..200)
}

proptest! {
    /// Property: the like counter equals the set of users currently liking
    #[test]
    fn prop_like_parity(toggles in toggle_strategy()) {
        let engine = engine();
        let mut video = test_video(true);
        let mut expected = BTreeSet::new();
        let mut paid = Decimal::ZERO;

        for user in toggles {
            let user_id = UserId::new(format!("fan{}", user));
            if !expected.insert(user_id.clone()) {
                expected.remove(&user_id);
            }

            let outcome = engine.apply_like(&video, &user_id, Utc::now()).unwrap();
            prop_assert_eq!(outcome.liked, expected.contains(&user_id));
            if let Some(payout) = &outcome.payout {
                paid += payout.wallet_delta.amount;
            }
            video = outcome.video;
        }

        prop_assert_eq!(video.stats.likes, expected.len() as u64);
        prop_assert_eq!(&video.liked_by, &expected);
        prop_assert_eq!(video.earnings, paid);
    }

    /// Property: k distinct likes pay floor(k / 20) times
    #[test]
    fn prop_like_threshold_payouts(likes in 0u64..130) {
        let engine = engine();
        let mut video = test_video(true);
        let mut payouts = 0u64;

        for i in 0..likes {
            let outcome = engine
                .apply_like(&video, &UserId::new(format!("fan{}", i)), Utc::now())
                .unwrap();
            if outcome.payout.is_some() {
                payouts += 1;
            }
            video = outcome.video;
        }

        prop_assert_eq!(payouts, likes / 20);
        prop_assert_eq!(video.earnings, Decimal::from(likes / 20) * dec!(0.05));
    }

    /// Property: n shares pay floor(n / 10) times, only when monetized
    #[test]
    fn prop_share_threshold_payouts(shares in 0u64..75, monetize in any::<bool>()) {
        let engine = engine();
        let mut video = test_video(monetize);

        for _ in 0..shares {
            video = engine.apply_share(&video, Utc::now()).unwrap().video;
        }

        let expected = if monetize {
            Decimal::from(shares / 10) * dec!(0.10)
        } else {
            Decimal::ZERO
        };
        prop_assert_eq!(video.stats.shares, shares);
        prop_assert_eq!(video.earnings, expected);
    }

    /// Property: a coin gift applies exact deltas or is refused outright
    #[test]
    fn prop_coin_gift_all_or_nothing(balance_cents in 0i64..5_000, coins in 1u64..500) {
        let engine = engine();
        let video = test_video(true);
        let sender = test_wallet("fan", Decimal::new(balance_cents, 2));
        let receiver = test_wallet("creator", Decimal::ZERO);
        let cost = Decimal::from(coins) * dec!(0.10);

        match engine.apply_coin_gift(&sender, &receiver, &video, coins, Utc::now()) {
            Ok(outcome) => {
                prop_assert!(sender.balance >= cost);
                prop_assert_eq!(outcome.sender.balance, sender.balance - cost);
                prop_assert_eq!(outcome.receiver.balance, cost * dec!(0.85));
                prop_assert_eq!(outcome.video.stats.coins, coins);
                prop_assert_eq!(outcome.cost - outcome.credit, outcome.platform_fee());
                prop_assert!(outcome.sender.balance >= Decimal::ZERO);
            }
            Err(Error::InsufficientBalance { required, available }) => {
                prop_assert!(sender.balance < cost);
                prop_assert_eq!(required, cost);
                prop_assert_eq!(available, sender.balance);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Property: after any engagement mix, earnings match the log
    #[test]
    fn prop_earnings_conservation(toggles in toggle_strategy(), shares in 0u32..25, coins in 0u64..30) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ledger = Ledger::open(Config::default()).unwrap();

            for id in ["creator", "patron"] {
                ledger
                    .register_user(NewUser {
                        user_id: UserId::new(id),
                        username: id.to_string(),
                        opening_balance: dec!(10),
                    })
                    .await
                    .unwrap();
            }
            for i in 0..8 {
                ledger
                    .register_user(NewUser {
                        user_id: UserId::new(format!("fan{}", i)),
                        username: format!("fan{}", i),
                        opening_balance: Decimal::ZERO,
                    })
                    .await
                    .unwrap();
            }

            let video = ledger.publish_video(NewVideo {
                owner: UserId::new("creator"),
                title: "clip".to_string(),
                description: String::new(),
                hashtags: vec![],
                media_url: "/uploads/videos/clip.mp4".to_string(),
                location: None,
                visibility: Visibility::Public,
                monetize: true,
            }).await.unwrap();

            for user in toggles {
                ledger
                    .toggle_like(video.id, UserId::new(format!("fan{}", user)))
                    .await
                    .unwrap();
            }
            for _ in 0..shares {
                ledger.share(video.id).await.unwrap();
            }
            if coins > 0 {
                ledger
                    .send_coins(video.id, UserId::new("patron"), coins)
                    .await
                    .unwrap();
            }

            prop_assert!(ledger.check_earnings_conservation(video.id).unwrap());

            let stored = ledger.video(video.id).unwrap();
            let creator = ledger.wallet(&UserId::new("creator")).unwrap();
            prop_assert_eq!(creator.balance, dec!(10) + stored.earnings);
            prop_assert_eq!(
                reporting::video_revenue(&ledger.transactions_for(&UserId::new("creator")).unwrap()),
                stored.earnings
            );

            ledger.shutdown().await.unwrap();
            Ok(())
        })?;
    }
}
