use std::sync::Arc;

use anyhow::{Context, Result};

use swap_server::domains::queue::{
    ExecutionWorker, JobPayload, JobQueue, QueueConfig, RetryPolicy,
};
use swap_server::domains::routing::{MeteoraAdapter, RaydiumAdapter, RoutingEngine, VenueAdapter};
use swap_server::domains::swap::models::OrderStatus;
use swap_server::domains::ws::{BroadcastHub, HubConfig, WebSocketServer};
use swap_server::shared::config::AppConfig;
use swap_server::shared::database::Database;
use swap_server::shared::store::{MemoryStore, OrderStore, PostgresStore};
use swap_server::shared::utils::id_generator::OrderIdGenerator;

// =====================================================
// Swap Server 엔트리포인트
// =====================================================
// 부트스트랩 순서:
// 1. 설정 로드 → 스토어 선택 (DATABASE_URL 유무)
// 2. 주문 ID 제너레이터 시드
// 3. 브로드캐스트 허브 → 라우팅 엔진 → 워커 → 큐
// 4. 미완료 주문 복구 (재입큐)
// 5. WebSocket 서버 기동
// 6. Ctrl+C 시 큐 → 허브 순으로 종료
// =====================================================

#[tokio::main]
async fn main() -> Result<()> {
    println!("[Swap Server] Starting...");

    let config = AppConfig::from_env();

    // 1. 스토어 선택: DATABASE_URL 있으면 PostgreSQL, 없으면 인메모리
    let store: Arc<dyn OrderStore> = match &config.database_url {
        Some(url) => {
            let db = Database::new(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.initialize()
                .await
                .context("Failed to run database migrations")?;
            println!("[Swap Server] Using PostgreSQL store");
            Arc::new(PostgresStore::new(db))
        }
        None => {
            println!("[Swap Server] DATABASE_URL not set, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // 2. 주문 ID 제너레이터를 마지막 영속 ID 이후로 시드
    let last_id = store
        .max_order_id()
        .await
        .context("Failed to read last order id")?;
    OrderIdGenerator::initialize(last_id);

    // 3. 허브 → 라우팅 엔진 → 워커 → 큐
    let hub = BroadcastHub::spawn(HubConfig {
        sweep_interval: config.ws_sweep_interval,
        connection_timeout: config.ws_connection_timeout,
    });

    let adapters: Vec<Arc<dyn VenueAdapter>> = vec![
        Arc::new(RaydiumAdapter::new()),
        Arc::new(MeteoraAdapter::new()),
    ];
    let router = RoutingEngine::new(adapters).with_store(Arc::clone(&store));
    println!("[Swap Server] Routing venues: {}", router.venues().join(", "));

    let worker = Arc::new(ExecutionWorker::new(
        Arc::clone(&store),
        router,
        hub.clone(),
        config.execution_timeout,
    ));

    let queue = JobQueue::new(
        QueueConfig {
            concurrency: config.queue_concurrency,
            rate_limit_max: config.rate_limit_max as usize,
            rate_limit_window: config.rate_limit_window,
            retry_policy: RetryPolicy {
                base_delay: config.backoff_base,
                max_attempts: config.max_attempts,
                ..RetryPolicy::default()
            },
            ..QueueConfig::default()
        },
        worker,
    );
    queue.start();

    // 4. 미완료 주문 복구: 영속된 비종결 주문을 다시 입큐
    let mut resumed = 0usize;
    for status in [
        OrderStatus::Pending,
        OrderStatus::Routing,
        OrderStatus::Building,
        OrderStatus::Submitted,
    ] {
        let orders = store
            .get_orders_by_status(status, 1_000)
            .await
            .context("Failed to load unfinished orders")?;
        for order in orders {
            queue.enqueue(JobPayload::for_order(&order));
            resumed += 1;
        }
    }
    if resumed > 0 {
        println!("[Swap Server] Resumed {} unfinished orders", resumed);
    }

    // 5. WebSocket 서버 기동
    let ws_server = WebSocketServer::new(hub.clone());
    let bind_addr = config.ws_bind_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = ws_server.run(&bind_addr).await {
            eprintln!("[Swap Server] WebSocket server exited: {:#}", e);
        }
    });

    println!("[Swap Server] Ready");

    // 6. 종료 처리: 큐 디스패치 중단 → 허브 종료
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    println!("[Swap Server] Shutting down...");
    queue.shutdown();
    hub.shutdown();
    println!("[Swap Server] Bye");

    Ok(())
}
