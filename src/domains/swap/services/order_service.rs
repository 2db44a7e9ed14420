use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domains::queue::{JobPayload, JobQueue};
use crate::domains::swap::models::{
    CreateSwapOrderRequest, Order, OrderCreate, OrderDetail, OrderStatus, OrderType,
};
use crate::shared::errors::SwapError;
use crate::shared::store::OrderStore;

// =====================================================
// 주문 서비스 (Order Service)
// =====================================================
// 역할: 주문 접수 검증 → 영속화 → 실행 큐 입큐
//
// NestJS의 OrderService와 같은 위치. 상태 전이 규칙 자체는
// 스토어가 강제하고, 여기서는 접수 시점 검증과 큐 연동만
// 담당합니다.
// =====================================================

/// 생략 시 기본 슬리피지 허용치 (1%)
const DEFAULT_SLIPPAGE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    queue: Arc<JobQueue>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, queue: Arc<JobQueue>) -> Self {
        Self { store, queue }
    }

    /// 주문 생성: 검증 → 저장 (PENDING + 초기 이력) → 입큐
    pub async fn create_order(
        &self,
        request: CreateSwapOrderRequest,
    ) -> Result<Order, SwapError> {
        let order_type = request.order_type.unwrap_or(OrderType::Market);
        let slippage = request.slippage.unwrap_or(DEFAULT_SLIPPAGE);

        Self::validate(&request, order_type, slippage)?;

        let order = self
            .store
            .create_order(OrderCreate {
                user_id: request.user_id,
                order_type,
                token_in: request.token_in.trim().to_uppercase(),
                token_out: request.token_out.trim().to_uppercase(),
                amount_in: request.amount_in,
                slippage,
            })
            .await
            .map_err(Self::store_error)?;

        let job_id = self.queue.enqueue(JobPayload::for_order(&order));
        println!(
            "[Order Service] Order {} created and enqueued (job {})",
            order.id, job_id
        );

        Ok(order)
    }

    /// 주문 조회
    pub async fn get_order(&self, order_id: u64) -> Result<Order, SwapError> {
        self.store
            .get_order(order_id)
            .await
            .map_err(Self::store_error)?
            .ok_or(SwapError::OrderNotFound { id: order_id })
    }

    /// 주문 상세 조회 (이력 + 체결 + 견적 로그)
    pub async fn get_order_detail(&self, order_id: u64) -> Result<OrderDetail, SwapError> {
        let order = self.get_order(order_id).await?;
        let history = self
            .store
            .get_history(order_id)
            .await
            .map_err(Self::store_error)?;
        let execution = self
            .store
            .get_execution(order_id)
            .await
            .map_err(Self::store_error)?;
        let quote_logs = self
            .store
            .get_quote_logs(order_id)
            .await
            .map_err(Self::store_error)?;

        Ok(OrderDetail {
            order,
            history,
            execution,
            quote_logs,
        })
    }

    /// 실패 주문 수동 재시도: FAILED → PENDING 전이 후 재입큐
    pub async fn retry_order(&self, order_id: u64) -> Result<Order, SwapError> {
        let order = self.get_order(order_id).await?;

        if order.status != OrderStatus::Failed {
            return Err(SwapError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Pending,
            });
        }

        let order = self
            .store
            .record_transition(
                order_id,
                OrderStatus::Pending,
                Some("Manual retry requested".to_string()),
                None,
            )
            .await
            .map_err(Self::store_error)?;

        let job_id = self.queue.enqueue(JobPayload::for_order(&order));
        println!(
            "[Order Service] Order {} re-enqueued for retry (job {})",
            order.id, job_id
        );

        Ok(order)
    }

    /// 아직 실행되지 않은 주문의 작업 취소 (대기/백오프 중일 때만)
    pub async fn cancel_pending_job(&self, order_id: u64) -> Result<bool, SwapError> {
        // 존재 확인 후 큐에서만 제거. 실행 중 작업은 건드리지 않음
        self.get_order(order_id).await?;
        Ok(self.queue.remove_job(order_id))
    }

    fn validate(
        request: &CreateSwapOrderRequest,
        order_type: OrderType,
        slippage: Decimal,
    ) -> Result<(), SwapError> {
        if order_type != OrderType::Market {
            return Err(SwapError::Validation(format!(
                "Unsupported order type: {} (only MARKET is supported)",
                order_type
            )));
        }

        let token_in = request.token_in.trim();
        let token_out = request.token_out.trim();
        if token_in.is_empty() || token_out.is_empty() {
            return Err(SwapError::Validation(
                "Both tokenIn and tokenOut are required".to_string(),
            ));
        }
        if token_in.eq_ignore_ascii_case(token_out) {
            return Err(SwapError::Validation(
                "tokenIn and tokenOut must be different".to_string(),
            ));
        }

        if request.amount_in <= Decimal::ZERO {
            return Err(SwapError::Validation(
                "amountIn must be greater than zero".to_string(),
            ));
        }

        if slippage <= Decimal::ZERO || slippage >= Decimal::ONE {
            return Err(SwapError::Validation(
                "slippage must be between 0 and 1 (exclusive)".to_string(),
            ));
        }

        Ok(())
    }

    /// 스토어 에러 매핑: 도메인 에러는 그대로, 나머지는 Database
    fn store_error(error: anyhow::Error) -> SwapError {
        match error.downcast::<SwapError>() {
            Ok(domain) => domain,
            Err(other) => SwapError::Database(format!("{:#}", other)),
        }
    }
}
