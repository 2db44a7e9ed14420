mod common;

use std::time::Duration;

use rust_decimal::Decimal;

use common::{
    build_stack, default_stack, execution_failing_venue_config, failing_venue_config,
    fast_queue_config, sol_usdc_request, venue_config, wait_for_status,
};
use swap_server::domains::swap::models::{OrderCreate, OrderStatus, OrderType};
use swap_server::shared::errors::SwapError;
use swap_server::shared::store::OrderStore;

// =====================================================
// 주문 실행 파이프라인 통합 테스트
// =====================================================

#[tokio::test]
async fn test_order_flows_from_pending_to_confirmed() {
    let stack = default_stack().await;

    let order = stack.service.create_order(sol_usdc_request()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    let confirmed = wait_for_status(
        &stack.store,
        order.id,
        OrderStatus::Confirmed,
        Duration::from_secs(5),
    )
    .await;
    assert_eq!(confirmed.retry_count, 0);
    assert!(confirmed.failure_reason.is_none());

    let detail = stack.service.get_order_detail(order.id).await.unwrap();

    // 이력: PENDING → ROUTING → BUILDING → SUBMITTED → CONFIRMED,
    // 모든 인접 전이가 유효해야 함
    let statuses: Vec<OrderStatus> = detail.history.iter().map(|h| h.status).collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::Pending,
            OrderStatus::Routing,
            OrderStatus::Building,
            OrderStatus::Submitted,
            OrderStatus::Confirmed,
        ]
    );
    for pair in statuses.windows(2) {
        assert!(pair[0].can_transition(pair[1]), "{} -> {}", pair[0], pair[1]);
    }

    // 체결: 변동 0이므로 출력 = 2 * 150 * (1 - 0.0025) = 299.25
    let execution = detail.execution.expect("execution missing");
    assert_eq!(execution.venue, "Raydium");
    assert_eq!(execution.output_amount, Decimal::new(29925, 2));
    assert_eq!(execution.realized_slippage, Decimal::ZERO);
    assert!(!execution.tx_hash.is_empty());

    // 견적 로그: 베뉴 2곳, 선택 1곳
    assert_eq!(detail.quote_logs.len(), 2);
    let selected: Vec<_> = detail
        .quote_logs
        .iter()
        .filter(|q| q.selected_for_execution)
        .collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].venue, "Raydium");
}

#[tokio::test]
async fn test_order_fails_after_exhausting_retries() {
    let stack = build_stack(
        failing_venue_config(),
        failing_venue_config(),
        fast_queue_config(),
    )
    .await;

    let order = stack.service.create_order(sol_usdc_request()).await.unwrap();

    let failed = wait_for_status(
        &stack.store,
        order.id,
        OrderStatus::Failed,
        Duration::from_secs(5),
    )
    .await;

    // 시도 횟수만큼 재시도 카운트가 올라가야 함
    assert_eq!(failed.retry_count, 3);
    let reason = failed.failure_reason.expect("failure reason missing");
    assert!(
        reason.to_lowercase().contains("no valid quotes"),
        "unexpected reason: {}",
        reason
    );

    // 전 베뉴 실패였으므로 견적 로그 없음
    let detail = stack.service.get_order_detail(order.id).await.unwrap();
    assert!(detail.quote_logs.is_empty());
    assert!(detail.execution.is_none());

    // 큐 집계에도 실패로 반영 (FAILED 전이 직후 집계가 따라붙음)
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(stack.queue.stats().failed, 1);
}

#[tokio::test]
async fn test_execution_failure_retries_reenter_routing() {
    // 견적은 성공하지만 체결이 항상 실패하는 베뉴:
    // 매 시도마다 SUBMITTED까지 도달한 뒤 ROUTING으로 재진입해야 함
    let stack = build_stack(
        execution_failing_venue_config(),
        execution_failing_venue_config(),
        fast_queue_config(),
    )
    .await;

    let order = stack.service.create_order(sol_usdc_request()).await.unwrap();

    let failed = wait_for_status(
        &stack.store,
        order.id,
        OrderStatus::Failed,
        Duration::from_secs(5),
    )
    .await;

    assert_eq!(failed.retry_count, 3);
    let reason = failed.failure_reason.expect("failure reason missing");
    assert!(
        reason.to_lowercase().contains("execution failed"),
        "unexpected reason: {}",
        reason
    );

    let detail = stack.service.get_order_detail(order.id).await.unwrap();
    let statuses: Vec<OrderStatus> = detail.history.iter().map(|h| h.status).collect();

    // PENDING, (ROUTING → BUILDING → SUBMITTED) × 3, FAILED
    assert_eq!(statuses.first(), Some(&OrderStatus::Pending));
    assert_eq!(statuses.last(), Some(&OrderStatus::Failed));
    assert_eq!(
        statuses.iter().filter(|s| **s == OrderStatus::Routing).count(),
        3
    );
    for pair in statuses.windows(2) {
        assert!(pair[0].can_transition(pair[1]), "{} -> {}", pair[0], pair[1]);
    }
    assert!(
        statuses
            .windows(2)
            .any(|pair| pair[0] == OrderStatus::Submitted && pair[1] == OrderStatus::Routing),
        "expected a SUBMITTED -> ROUTING re-entry in {:?}",
        statuses
    );

    // 체결 기록은 없고, 견적 로그는 시도마다 남음
    assert!(detail.execution.is_none());
    assert_eq!(detail.quote_logs.len(), 6);
}

#[tokio::test]
async fn test_manual_retry_of_failed_order_succeeds() {
    let stack = default_stack().await;

    // 큐를 거치지 않고 실패 상태의 주문을 만들어 둔다
    let order = stack
        .store
        .create_order(OrderCreate {
            user_id: None,
            order_type: OrderType::Market,
            token_in: "SOL".to_string(),
            token_out: "USDC".to_string(),
            amount_in: Decimal::ONE,
            slippage: Decimal::new(1, 2),
        })
        .await
        .unwrap();
    stack
        .store
        .record_transition(
            order.id,
            OrderStatus::Failed,
            Some("venue outage".to_string()),
            None,
        )
        .await
        .unwrap();

    let retried = stack.service.retry_order(order.id).await.unwrap();
    assert_eq!(retried.status, OrderStatus::Pending);
    assert!(retried.failure_reason.is_none());

    let confirmed = wait_for_status(
        &stack.store,
        order.id,
        OrderStatus::Confirmed,
        Duration::from_secs(5),
    )
    .await;
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    // 이력에 수동 재시도 전이가 남아야 함
    let detail = stack.service.get_order_detail(order.id).await.unwrap();
    assert!(detail
        .history
        .iter()
        .any(|h| h.status == OrderStatus::Pending
            && h.message.as_deref() == Some("Manual retry requested")));
}

#[tokio::test]
async fn test_retry_is_rejected_for_non_failed_order() {
    let stack = default_stack().await;

    let order = stack.service.create_order(sol_usdc_request()).await.unwrap();
    wait_for_status(
        &stack.store,
        order.id,
        OrderStatus::Confirmed,
        Duration::from_secs(5),
    )
    .await;

    let err = stack.service.retry_order(order.id).await.unwrap_err();
    assert!(matches!(err, SwapError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_create_order_validation() {
    let stack = default_stack().await;

    // 수량 0
    let mut request = sol_usdc_request();
    request.amount_in = Decimal::ZERO;
    assert!(matches!(
        stack.service.create_order(request).await.unwrap_err(),
        SwapError::Validation(_)
    ));

    // 동일 토큰
    let mut request = sol_usdc_request();
    request.token_out = "sol".to_string();
    assert!(matches!(
        stack.service.create_order(request).await.unwrap_err(),
        SwapError::Validation(_)
    ));

    // 슬리피지 범위 밖
    let mut request = sol_usdc_request();
    request.slippage = Some(Decimal::ONE);
    assert!(matches!(
        stack.service.create_order(request).await.unwrap_err(),
        SwapError::Validation(_)
    ));

    // MARKET 외 주문 타입
    let mut request = sol_usdc_request();
    request.order_type = Some(OrderType::Limit);
    assert!(matches!(
        stack.service.create_order(request).await.unwrap_err(),
        SwapError::Validation(_)
    ));
}

#[tokio::test]
async fn test_get_order_not_found() {
    let stack = default_stack().await;
    let err = stack.service.get_order(999_999).await.unwrap_err();
    assert!(matches!(err, SwapError::OrderNotFound { id: 999_999 }));
}

#[tokio::test]
async fn test_cancel_removes_waiting_job_only() {
    // 동시성 0짜리 큐는 만들 수 없으므로, 시작 전 상태를 만들기 위해
    // 레이트 리밋을 0으로 묶는다
    let mut config = fast_queue_config();
    config.rate_limit_max = 0;
    let stack = build_stack(venue_config(25), venue_config(30), config).await;

    let order = stack.service.create_order(sol_usdc_request()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // 디스패치가 막혀 있으므로 대기열에서 제거 가능
    assert!(stack.service.cancel_pending_job(order.id).await.unwrap());
    assert!(!stack.service.cancel_pending_job(order.id).await.unwrap());
    assert_eq!(stack.queue.stats().waiting, 0);
}
