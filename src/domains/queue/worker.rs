use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde_json::json;

use super::job::{JobPayload, JobResult};
use crate::domains::routing::{RoutingEngine, SwapParams};
use crate::domains::swap::models::{ExecutionCreate, OrderStatus};
use crate::domains::ws::hub::{HubHandle, OrderUpdate};
use crate::shared::store::OrderStore;

// =====================================================
// 실행 워커 (Execution Worker)
// =====================================================
// 역할: 단일 작업의 전체 파이프라인 실행
//   ROUTING → BUILDING → SUBMITTED → CONFIRMED
//
// 각 상태 전이는 저장소에 기록되고 구독자에게 브로드캐스트됩니다.
// 파이프라인 전체에 실행 타임아웃이 걸려 있어, 어느 단계든
// 멈추면 실패로 전환됩니다.
// =====================================================

pub struct ExecutionWorker {
    store: Arc<dyn OrderStore>,
    router: RoutingEngine,
    hub: HubHandle,
    execution_timeout: Duration,
}

impl ExecutionWorker {
    pub fn new(
        store: Arc<dyn OrderStore>,
        router: RoutingEngine,
        hub: HubHandle,
        execution_timeout: Duration,
    ) -> Self {
        Self {
            store,
            router,
            hub,
            execution_timeout,
        }
    }

    /// 작업 1건 처리. 실패 시 재시도 카운트 증가 및
    /// (마지막 시도였다면) FAILED 전환까지 수행한 뒤 에러 반환
    pub async fn process(
        &self,
        payload: &JobPayload,
        attempt: u32,
        max_attempts: u32,
    ) -> Result<JobResult> {
        println!(
            "[Execution Worker] Processing order {} (attempt {}/{})",
            payload.order_id, attempt, max_attempts
        );

        let outcome =
            tokio::time::timeout(self.execution_timeout, self.run_pipeline(payload)).await;

        let result = match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(anyhow!(
                "Execution timed out after {}ms",
                self.execution_timeout.as_millis()
            )),
        };

        match result {
            Ok(result) => Ok(result),
            Err(e) => {
                self.handle_failure(payload, attempt, max_attempts, &e).await;
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, payload: &JobPayload) -> Result<JobResult> {
        let order_id = payload.order_id;

        // 1. ROUTING: 베뉴 견적 수집 시작
        self.transition(order_id, OrderStatus::Routing, "Collecting venue quotes", None)
            .await?;

        let params = SwapParams {
            token_in: payload.token_in.clone(),
            token_out: payload.token_out.clone(),
            amount_in: payload.amount_in,
            slippage: payload.slippage,
        };

        let decision = self
            .router
            .find_best_route(&params, Some(order_id))
            .await
            .context("Failed to find a route")?;

        // 2. BUILDING: 선정 베뉴로 트랜잭션 구성
        self.transition(
            order_id,
            OrderStatus::Building,
            "Building swap transaction",
            Some(json!({
                "venue": decision.selected.venue,
                "estimatedOut": decision.selected.estimated_out,
                "rationale": decision.rationale,
            })),
        )
        .await?;

        // 3. SUBMITTED: 체인 제출
        self.transition(
            order_id,
            OrderStatus::Submitted,
            "Transaction submitted",
            Some(json!({ "venue": decision.selected.venue })),
        )
        .await?;

        let executed = self
            .router
            .execute_swap(&params, &decision.selected)
            .await
            .context("Failed to execute swap")?;

        // 4. CONFIRMED: 체결 사실 기록 (전이 + 실행 내역 원자적 저장)
        let metadata = json!({
            "venue": executed.venue,
            "txHash": executed.tx_hash,
            "outputAmount": executed.output_amount,
        });
        let execution = ExecutionCreate {
            venue: executed.venue.clone(),
            tx_hash: executed.tx_hash.clone(),
            executed_price: executed.executed_price,
            amount_in: payload.amount_in,
            output_amount: executed.output_amount,
            fee_amount: executed.fee_amount,
            realized_slippage: executed.realized_slippage,
            duration_ms: executed.duration_ms,
        };

        self.store
            .record_confirmation(
                order_id,
                execution,
                Some("Swap confirmed".to_string()),
                Some(metadata.clone()),
            )
            .await
            .context("Failed to record confirmation")?;

        self.hub.publish(OrderUpdate {
            order_id,
            status: OrderStatus::Confirmed,
            message: Some("Swap confirmed".to_string()),
            metadata: Some(metadata),
            timestamp: Utc::now(),
        });

        println!(
            "[Execution Worker] Order {} confirmed on {} (tx: {})",
            order_id, executed.venue, executed.tx_hash
        );

        Ok(JobResult {
            order_id,
            success: true,
            tx_hash: Some(executed.tx_hash),
            executed_price: Some(executed.executed_price),
            output_amount: Some(executed.output_amount),
            error: None,
        })
    }

    /// 상태 전이 후 구독자 브로드캐스트
    async fn transition(
        &self,
        order_id: u64,
        to: OrderStatus,
        message: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<()> {
        self.store
            .record_transition(order_id, to, Some(message.to_string()), metadata.clone())
            .await
            .with_context(|| format!("Failed to transition order {} to {}", order_id, to))?;

        self.hub.publish(OrderUpdate {
            order_id,
            status: to,
            message: Some(message.to_string()),
            metadata,
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// 실패 처리: 재시도 카운트 증가, 마지막 시도면 FAILED 확정
    async fn handle_failure(
        &self,
        payload: &JobPayload,
        attempt: u32,
        max_attempts: u32,
        error: &anyhow::Error,
    ) {
        let order_id = payload.order_id;
        eprintln!(
            "[Execution Worker] Order {} attempt {}/{} failed: {:#}",
            order_id, attempt, max_attempts, error
        );

        if let Err(e) = self.store.increment_retry_count(order_id).await {
            eprintln!(
                "[Execution Worker] Failed to bump retry count for order {}: {}",
                order_id, e
            );
        }

        if attempt >= max_attempts {
            let reason = format!("{:#}", error);
            match self
                .store
                .record_transition(order_id, OrderStatus::Failed, Some(reason.clone()), None)
                .await
            {
                Ok(_) => {
                    self.hub.publish(OrderUpdate {
                        order_id,
                        status: OrderStatus::Failed,
                        message: Some(reason),
                        metadata: None,
                        timestamp: Utc::now(),
                    });
                }
                Err(e) => eprintln!(
                    "[Execution Worker] Failed to mark order {} as failed: {}",
                    order_id, e
                ),
            }
        }
    }
}
