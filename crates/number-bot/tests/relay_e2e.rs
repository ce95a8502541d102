mod common;

use common::*;
use number_bot::router::Route;
use number_bot::transport::ChatMessage;

async fn reply(h: &Harness, sender: &str, text: &str) -> String {
    match h.router.route(&ChatMessage::direct(sender, text)).await.unwrap() {
        Route::Reply(text) => text,
        other => panic!("expected a reply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_code_reaches_the_holder() {
    let h = harness().await;
    h.stock("WhatsApp", "Bangladesh", &["8801712345678"]).await;

    reply(&h, "+15551110000", "!start").await;
    let issued = reply(&h, "+15551110000", "!number whatsapp bangladesh").await;
    assert!(issued.contains("+8801712345678"));

    let route = h
        .router
        .route(&ChatMessage::in_group(
            "+15559990000",
            GROUP,
            "#WhatsApp 88017ⒶⒷⒸⒹ5678 Your code: 481516",
        ))
        .await
        .unwrap();
    let Route::Inbound(report) = route else {
        panic!("expected inbound route");
    };
    assert_eq!(report.delivered(), 1);

    let bodies = sent_bodies(&h.server).await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["number"], ACCOUNT);
    assert_eq!(bodies[0]["recipients"][0], "+15551110000");
    let message = bodies[0]["message"].as_str().unwrap();
    assert!(message.contains("+8801712345678"));
    assert!(message.contains("481516"));
}

#[tokio::test]
async fn test_previous_batch_stops_receiving_codes() {
    let h = harness().await;
    h.stock("Telegram", "India", &["919800000001"]).await;
    h.stock("Telegram", "Nepal", &["977980000001"]).await;

    reply(&h, "+15551110000", "!number Telegram India").await;
    reply(&h, "+15551110000", "!number Telegram Nepal").await;

    let report = match h
        .router
        .route(&ChatMessage::in_group(
            "+15559990000",
            GROUP,
            "91980ⒶⒷⒸⒹ0001 Telegram code 55555",
        ))
        .await
        .unwrap()
    {
        Route::Inbound(report) => report,
        other => panic!("unexpected {other:?}"),
    };

    assert!(report.deliveries.is_empty());
    assert!(sent_bodies(&h.server).await.is_empty());
}

#[tokio::test]
async fn test_numbers_are_never_issued_twice() {
    let h = harness().await;
    h.stock("Facebook", "Egypt", &["201000000001", "201000000002"]).await;
    tokio_test::assert_ok!(h.engine.set_limit(ADMIN, 1).await);

    let first = reply(&h, "+15551110000", "!number Facebook Egypt").await;
    let second = reply(&h, "+15552220000", "!number Facebook Egypt").await;
    let third = reply(&h, "+15553330000", "!number Facebook Egypt").await;

    let issued_first = first.contains("+201000000001");
    assert_ne!(issued_first, second.contains("+201000000001"));
    assert!(third.starts_with("❌ Out of stock"));
}

#[tokio::test]
async fn test_admin_ban_flow_and_persistence() {
    let h = harness().await;
    reply(&h, "+15551110000", "!start").await;

    assert_eq!(
        reply(&h, ADMIN, "!admin ban").await,
        "🚫 Send the id of the user to ban:"
    );
    assert_eq!(reply(&h, ADMIN, "+15551110000").await, "🚫 Banned: +15551110000");
    assert_eq!(
        reply(&h, "+15551110000", "!services").await,
        "🚫 You are banned."
    );

    let snapshot: serde_json::Value =
        serde_json::from_slice(&std::fs::read(h.snapshot_path()).unwrap()).unwrap();
    assert_eq!(snapshot["banned"][0], "+15551110000");
}

#[tokio::test]
async fn test_admin_upload_then_stock() {
    let h = harness().await;

    let uploaded = reply(
        &h,
        ADMIN,
        "!admin upload Telegram Saudi Arabia\n966500000001\n966500000002",
    )
    .await;
    assert!(uploaded.contains("📲 Numbers: 2"));

    let stock = reply(&h, "+15551110000", "!stock").await;
    assert!(stock.contains("Telegram › Saudi Arabia"));
    assert!(stock.contains("left: 2  |  total: 2  |  used: 0"));
}

#[tokio::test]
async fn test_non_admin_cannot_use_admin_commands() {
    let h = harness().await;

    assert_eq!(
        reply(&h, "+15551110000", "!admin limit 9").await,
        "❌ You are not an admin."
    );
    assert_eq!(h.engine.number_limit().await, 4);
}
