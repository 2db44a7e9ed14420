mod common;

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;

use common::{default_stack, sol_usdc_request, wait_for_status};
use swap_server::domains::swap::models::OrderStatus;
use swap_server::domains::ws::{BroadcastHub, HubConfig, HubHandle, OrderUpdate, Topic};

// =====================================================
// 브로드캐스트 허브 테스트
// =====================================================

fn test_hub() -> HubHandle {
    BroadcastHub::spawn(HubConfig {
        sweep_interval: Duration::from_secs(30),
        connection_timeout: Duration::from_secs(120),
    })
}

fn update(order_id: u64, status: OrderStatus) -> OrderUpdate {
    OrderUpdate {
        order_id,
        status,
        message: None,
        metadata: None,
        timestamp: Utc::now(),
    }
}

async fn recv_json(rx: &mut mpsc::UnboundedReceiver<String>) -> Value {
    let text = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("channel closed");
    serde_json::from_str(&text).expect("invalid json on the wire")
}

#[tokio::test]
async fn test_publish_reaches_order_and_wildcard_subscribers() {
    let hub = test_hub();

    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let conn_a = hub.register(tx_a).await.unwrap();
    hub.subscribe(conn_a, Topic::Order(1));
    assert_eq!(recv_json(&mut rx_a).await["type"], "subscribed");

    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    let conn_b = hub.register(tx_b).await.unwrap();
    hub.subscribe(conn_b, Topic::All);
    assert_eq!(recv_json(&mut rx_b).await["type"], "subscribed");

    hub.publish(update(1, OrderStatus::Routing));

    let msg_a = recv_json(&mut rx_a).await;
    assert_eq!(msg_a["type"], "order-update");
    assert_eq!(msg_a["payload"]["orderId"], "1");
    assert_eq!(msg_a["payload"]["status"], "ROUTING");

    let msg_b = recv_json(&mut rx_b).await;
    assert_eq!(msg_b["payload"]["orderId"], "1");

    // 다른 주문은 와일드카드 구독자에게만 전달
    hub.publish(update(2, OrderStatus::Confirmed));
    let msg_b = recv_json(&mut rx_b).await;
    assert_eq!(msg_b["payload"]["orderId"], "2");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx_a.try_recv().is_err(), "order-topic subscriber leaked update");
}

#[tokio::test]
async fn test_subscriber_receives_update_only_once() {
    let hub = test_hub();

    // 주문 토픽과 와일드카드를 동시에 구독해도 중복 수신 없음
    let (tx, mut rx) = mpsc::unbounded_channel();
    let conn = hub.register(tx).await.unwrap();
    hub.subscribe(conn, Topic::Order(5));
    hub.subscribe(conn, Topic::All);
    assert_eq!(recv_json(&mut rx).await["type"], "subscribed");
    assert_eq!(recv_json(&mut rx).await["type"], "subscribed");

    hub.publish(update(5, OrderStatus::Building));

    assert_eq!(recv_json(&mut rx).await["type"], "order-update");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err(), "duplicate fan-out to one connection");
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let hub = test_hub();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let conn = hub.register(tx).await.unwrap();
    hub.subscribe(conn, Topic::Order(3));
    assert_eq!(recv_json(&mut rx).await["type"], "subscribed");

    // 같은 핸들의 커맨드는 순서대로 처리되므로 publish보다 먼저 반영됨
    hub.unsubscribe(conn, Topic::Order(3));
    hub.publish(update(3, OrderStatus::Routing));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err(), "update delivered after unsubscribe");
}

#[tokio::test]
async fn test_stale_connections_are_swept() {
    let hub = BroadcastHub::spawn(HubConfig {
        sweep_interval: Duration::from_millis(50),
        connection_timeout: Duration::from_millis(100),
    });

    let (tx, _rx) = mpsc::unbounded_channel();
    hub.register(tx).await.unwrap();
    assert_eq!(hub.connection_count().await.unwrap(), 1);

    // 활동 없이 방치하면 정리됨
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(hub.connection_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_activity_keeps_connection_alive() {
    let hub = BroadcastHub::spawn(HubConfig {
        sweep_interval: Duration::from_millis(50),
        connection_timeout: Duration::from_millis(150),
    });

    let (tx, _rx) = mpsc::unbounded_channel();
    let conn = hub.register(tx).await.unwrap();

    for _ in 0..6 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        hub.activity(conn);
    }
    assert_eq!(hub.connection_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_hub_pings_connections_on_sweep_tick() {
    let hub = BroadcastHub::spawn(HubConfig {
        sweep_interval: Duration::from_millis(50),
        connection_timeout: Duration::from_secs(120),
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    hub.register(tx).await.unwrap();

    // 정리 주기마다 서버가 먼저 ping을 보냄
    let msg = recv_json(&mut rx).await;
    assert_eq!(msg["type"], "ping");
    assert!(msg["timestamp"].is_i64());

    let msg = recv_json(&mut rx).await;
    assert_eq!(msg["type"], "ping");
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let hub = test_hub();
    hub.shutdown();
    hub.shutdown();

    tokio::time::sleep(Duration::from_millis(50)).await;

    // 종료 후 등록은 실패해야 함
    let (tx, _rx) = mpsc::unbounded_channel();
    assert!(hub.register(tx).await.is_err());
}

#[tokio::test]
async fn test_pipeline_broadcasts_status_sequence() {
    let stack = default_stack().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let conn = stack.hub.register(tx).await.unwrap();
    stack.hub.subscribe(conn, Topic::All);
    assert_eq!(recv_json(&mut rx).await["type"], "subscribed");

    let order = stack.service.create_order(sol_usdc_request()).await.unwrap();
    wait_for_status(
        &stack.store,
        order.id,
        OrderStatus::Confirmed,
        Duration::from_secs(5),
    )
    .await;

    // 워커가 밟는 전이가 순서대로 방송되어야 함
    let mut statuses = Vec::new();
    while statuses.len() < 4 {
        let msg = recv_json(&mut rx).await;
        assert_eq!(msg["type"], "order-update");
        assert_eq!(msg["payload"]["orderId"], order.id.to_string());
        statuses.push(msg["payload"]["status"].as_str().unwrap().to_string());
    }
    assert_eq!(statuses, vec!["ROUTING", "BUILDING", "SUBMITTED", "CONFIRMED"]);
}
