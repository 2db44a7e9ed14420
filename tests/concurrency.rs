mod common;

use std::time::Duration;

use common::{build_stack, fast_queue_config, sol_usdc_request, venue_config};
use swap_server::domains::queue::JobPayload;

// =====================================================
// 큐 동시성/레이트 리밋 테스트
// =====================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_active_jobs_never_exceed_concurrency_cap() {
    let mut config = fast_queue_config();
    config.concurrency = 10;
    // 작업이 한동안 활성 상태로 머물도록 지연을 준다
    let slow = {
        let mut v = venue_config(25);
        v.latency_ms = (30, 40);
        v
    };
    let stack = build_stack(slow.clone(), slow, config).await;

    for _ in 0..15 {
        stack.service.create_order(sol_usdc_request()).await.unwrap();
    }

    // 전부 끝날 때까지 활성 작업 수를 샘플링
    let mut max_active = 0;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let stats = stack.queue.stats();
        max_active = max_active.max(stats.active);
        if stats.completed == 15 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "queue never drained: {:?}",
            stats
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(max_active <= 10, "active peaked at {}", max_active);
    // 작업 수가 상한을 넘으므로 동시 실행이 실제로 일어났어야 함
    assert!(max_active >= 2, "active never ramped up ({})", max_active);

    let stats = stack.queue.stats();
    assert_eq!(stats.completed, 15);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.waiting, 0);
    assert_eq!(stats.active, 0);
}

#[tokio::test]
async fn test_enqueue_is_idempotent_per_order() {
    // 디스패치를 막아 두 호출 사이에 작업이 끝나지 않게 한다
    let mut config = fast_queue_config();
    config.rate_limit_max = 0;
    let stack = build_stack(venue_config(25), venue_config(30), config).await;

    let order = stack.service.create_order(sol_usdc_request()).await.unwrap();

    // 서비스가 이미 입큐했으므로 직접 입큐는 기존 작업 ID를 돌려준다
    let payload = JobPayload::for_order(&order);
    let first = stack.queue.enqueue(payload.clone());
    let second = stack.queue.enqueue(payload);
    assert_eq!(first, second);
    assert_eq!(stack.queue.stats().waiting, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rate_limit_spreads_job_starts() {
    // 윈도우당 2개 시작, 6개 작업 → 최소 두 번의 추가 윈도우 필요
    let mut config = fast_queue_config();
    config.rate_limit_max = 2;
    config.rate_limit_window = Duration::from_millis(200);
    let stack = build_stack(venue_config(25), venue_config(30), config).await;

    let started = tokio::time::Instant::now();
    for _ in 0..6 {
        stack.service.create_order(sol_usdc_request()).await.unwrap();
    }

    let deadline = started + Duration::from_secs(10);
    loop {
        if stack.queue.stats().completed == 6 {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "queue never drained");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // 3번째/5번째 작업은 이전 윈도우가 만료된 뒤에야 시작 가능
    assert!(
        started.elapsed() >= Duration::from_millis(300),
        "drained too fast: {:?}",
        started.elapsed()
    );
}
