#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use swap_server::domains::queue::{ExecutionWorker, JobQueue, QueueConfig, RetryPolicy};
use swap_server::domains::routing::{
    MeteoraAdapter, RaydiumAdapter, RoutingEngine, VenueAdapter, VenueConfig,
};
use swap_server::domains::swap::models::{CreateSwapOrderRequest, Order, OrderStatus};
use swap_server::domains::swap::services::OrderService;
use swap_server::domains::ws::{BroadcastHub, HubConfig, HubHandle};
use swap_server::shared::store::{MemoryStore, OrderStore};

// =====================================================
// 통합 테스트 공용 하네스
// =====================================================
// 인메모리 스토어 + 결정적 베뉴 설정으로 전체 스택을 조립합니다.
// =====================================================

pub struct TestStack {
    pub store: Arc<MemoryStore>,
    pub queue: Arc<JobQueue>,
    pub service: OrderService,
    pub hub: HubHandle,
}

/// 결정적 베뉴 설정 (변동/실패/슬리피지 0)
pub fn venue_config(fee_bps: i64) -> VenueConfig {
    VenueConfig {
        fee_rate: Decimal::new(fee_bps, 4),
        latency_ms: (0, 1),
        price_variance: 0.0,
        execution_slippage: 0.0,
        quote_failure_rate: 0.0,
        execution_failure_rate: 0.0,
    }
}

/// 항상 견적에 실패하는 베뉴 설정
pub fn failing_venue_config() -> VenueConfig {
    VenueConfig {
        quote_failure_rate: 1.0,
        ..venue_config(25)
    }
}

/// 견적은 성공하지만 체결은 항상 실패하는 베뉴 설정
pub fn execution_failing_venue_config() -> VenueConfig {
    VenueConfig {
        execution_failure_rate: 1.0,
        ..venue_config(25)
    }
}

/// 테스트용 큐 설정: 짧은 백오프, 느슨한 레이트 리밋
pub fn fast_queue_config() -> QueueConfig {
    QueueConfig {
        concurrency: 10,
        rate_limit_max: 1_000,
        rate_limit_window: Duration::from_secs(1),
        retry_policy: RetryPolicy {
            base_delay: Duration::from_millis(10),
            multiplier: 2.0,
            max_attempts: 3,
            max_delay: Duration::from_millis(100),
        },
        history_limit: 100,
        history_max_age: Duration::from_secs(60),
    }
}

pub async fn build_stack(
    raydium: VenueConfig,
    meteora: VenueConfig,
    queue_config: QueueConfig,
) -> TestStack {
    let store = Arc::new(MemoryStore::new());
    let hub = BroadcastHub::spawn(HubConfig {
        sweep_interval: Duration::from_secs(30),
        connection_timeout: Duration::from_secs(120),
    });

    let adapters: Vec<Arc<dyn VenueAdapter>> = vec![
        Arc::new(RaydiumAdapter::with_config(raydium)),
        Arc::new(MeteoraAdapter::with_config(meteora)),
    ];
    let router = RoutingEngine::new(adapters)
        .with_store(Arc::clone(&store) as Arc<dyn OrderStore>);

    let worker = Arc::new(ExecutionWorker::new(
        Arc::clone(&store) as Arc<dyn OrderStore>,
        router,
        hub.clone(),
        Duration::from_secs(5),
    ));

    let queue = JobQueue::new(queue_config, worker);
    queue.start();

    let service = OrderService::new(
        Arc::clone(&store) as Arc<dyn OrderStore>,
        Arc::clone(&queue),
    );

    TestStack {
        store,
        queue,
        service,
        hub,
    }
}

/// 기본 스택: 정상 동작하는 두 베뉴 (Raydium이 수수료 우위)
pub async fn default_stack() -> TestStack {
    build_stack(venue_config(25), venue_config(30), fast_queue_config()).await
}

/// 기본 주문 요청: 2 SOL → USDC
pub fn sol_usdc_request() -> CreateSwapOrderRequest {
    CreateSwapOrderRequest {
        order_type: None,
        token_in: "SOL".to_string(),
        token_out: "USDC".to_string(),
        amount_in: Decimal::new(2, 0),
        slippage: Some(Decimal::new(5, 3)),
        user_id: Some(7),
    }
}

/// 주문이 기대 상태에 도달할 때까지 폴링
pub async fn wait_for_status(
    store: &Arc<MemoryStore>,
    order_id: u64,
    status: OrderStatus,
    timeout: Duration,
) -> Order {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let order = store
            .get_order(order_id)
            .await
            .expect("store read failed")
            .expect("order missing");
        if order.status == status {
            return order;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!(
                "order {} never reached {} (stuck at {})",
                order_id, status, order.status
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
