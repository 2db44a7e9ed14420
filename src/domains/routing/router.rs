use std::sync::Arc;

use futures_util::future::join_all;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::adapters::VenueAdapter;
use super::types::{ExecutedSwap, RouteDecision, SwapParams, VenueQuote};
use crate::domains::swap::models::QuoteLogCreate;
use crate::shared::errors::RoutingError;
use crate::shared::store::OrderStore;

// =====================================================
// 라우팅 엔진 (Routing Engine)
// =====================================================
// 역할:
// 1. 등록된 모든 베뉴에 병렬 견적 요청
// 2. 예상 출력 기준 최적 베뉴 선정 (+근거 기록)
// 3. 선정 베뉴로 스왑 실행, 실현 슬리피지 계산
//
// 베뉴 하나가 죽어도 라우팅은 계속됩니다. 전 베뉴 실패 시에만
// NoQuotesAvailable을 반환합니다.
// =====================================================

#[derive(Clone)]
pub struct RoutingEngine {
    adapters: Vec<Arc<dyn VenueAdapter>>,

    /// 견적 감사 로그 저장소 (없으면 로그 생략)
    store: Option<Arc<dyn OrderStore>>,
}

impl RoutingEngine {
    pub fn new(adapters: Vec<Arc<dyn VenueAdapter>>) -> Self {
        Self {
            adapters,
            store: None,
        }
    }

    /// 견적 감사 로그를 남길 저장소 연결
    pub fn with_store(mut self, store: Arc<dyn OrderStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 등록된 베뉴 이름 목록
    pub fn venues(&self) -> Vec<String> {
        self.adapters
            .iter()
            .map(|a| a.venue().to_string())
            .collect()
    }

    /// 전 베뉴 병렬 견적 조회
    ///
    /// 개별 베뉴 실패는 격리합니다 (로그만 남기고 제외).
    /// 모든 베뉴가 실패하면 NoQuotesAvailable.
    pub async fn get_all_quotes(
        &self,
        params: &SwapParams,
    ) -> Result<Vec<VenueQuote>, RoutingError> {
        let futures = self
            .adapters
            .iter()
            .map(|adapter| adapter.quote(params));

        let mut quotes = Vec::new();
        for (adapter, result) in self.adapters.iter().zip(join_all(futures).await) {
            match result {
                Ok(quote) => quotes.push(quote),
                Err(e) => {
                    eprintln!(
                        "[Routing Engine] Quote from {} failed: {}",
                        adapter.venue(),
                        e
                    );
                }
            }
        }

        if quotes.is_empty() {
            return Err(RoutingError::NoQuotesAvailable);
        }

        Ok(quotes)
    }

    /// 최적 경로 선정
    ///
    /// 예상 출력 내림차순 정렬, 동률이면 어댑터 등록 순서 유지
    /// (stable sort). order_id가 주어지면 전체 견적을 감사용으로
    /// 기록합니다 (best-effort, 실패해도 라우팅은 계속).
    pub async fn find_best_route(
        &self,
        params: &SwapParams,
        order_id: Option<u64>,
    ) -> Result<RouteDecision, RoutingError> {
        let mut quotes = self.get_all_quotes(params).await?;
        quotes.sort_by(|a, b| b.estimated_out.cmp(&a.estimated_out));

        let selected = quotes[0].clone();
        let rationale = match quotes.get(1) {
            Some(runner_up) if !runner_up.estimated_out.is_zero() => {
                let improvement = ((selected.estimated_out - runner_up.estimated_out)
                    / runner_up.estimated_out
                    * Decimal::new(100, 0))
                .to_f64()
                .unwrap_or(0.0);
                format!(
                    "Selected {}: estimated output {} {} (+{:.2}% vs {})",
                    selected.venue,
                    selected.estimated_out.round_dp(6),
                    params.token_out,
                    improvement,
                    runner_up.venue
                )
            }
            _ => format!(
                "Selected {}: estimated output {} {} (only venue quoting)",
                selected.venue,
                selected.estimated_out.round_dp(6),
                params.token_out
            ),
        };

        println!("[Routing Engine] {}", rationale);

        if let (Some(store), Some(order_id)) = (&self.store, order_id) {
            let logs: Vec<QuoteLogCreate> = quotes
                .iter()
                .map(|q| QuoteLogCreate {
                    venue: q.venue.clone(),
                    price: q.price,
                    fee_rate: q.fee_rate,
                    estimated_out: q.estimated_out,
                    latency_ms: q.latency_ms,
                    selected_for_execution: q.venue == selected.venue,
                })
                .collect();
            if let Err(e) = store.log_quotes(order_id, logs).await {
                eprintln!(
                    "[Routing Engine] Failed to persist quote logs for order {}: {}",
                    order_id, e
                );
            }
        }

        Ok(RouteDecision {
            selected,
            rationale,
            all_quotes: quotes,
        })
    }

    /// 선정된 견적으로 스왑 실행
    ///
    /// 실현 슬리피지 = (예상 출력 - 실현 출력) / 예상 출력
    pub async fn execute_swap(
        &self,
        params: &SwapParams,
        quote: &VenueQuote,
    ) -> Result<ExecutedSwap, RoutingError> {
        let adapter = self
            .adapters
            .iter()
            .find(|a| a.venue() == quote.venue)
            .ok_or_else(|| RoutingError::UnknownVenue {
                venue: quote.venue.clone(),
            })?;

        let execution = adapter.execute(params, quote).await?;

        let realized_slippage = if quote.estimated_out.is_zero() {
            Decimal::ZERO
        } else {
            (quote.estimated_out - execution.output_amount) / quote.estimated_out
        };

        println!(
            "[Routing Engine] Executed on {}: {} {} out (tx: {}, {}ms)",
            execution.venue,
            execution.output_amount.round_dp(6),
            params.token_out,
            execution.tx_hash,
            execution.duration_ms
        );

        Ok(ExecutedSwap {
            venue: execution.venue,
            tx_hash: execution.tx_hash,
            executed_price: execution.executed_price,
            output_amount: execution.output_amount,
            fee_amount: execution.fee_amount,
            realized_slippage,
            duration_ms: execution.duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::routing::adapters::{
        MeteoraAdapter, RaydiumAdapter, VenueConfig,
    };

    fn deterministic_config(fee_bps: i64) -> VenueConfig {
        VenueConfig {
            fee_rate: Decimal::new(fee_bps, 4),
            latency_ms: (0, 1),
            price_variance: 0.0,
            execution_slippage: 0.0,
            quote_failure_rate: 0.0,
            execution_failure_rate: 0.0,
        }
    }

    fn failing_config() -> VenueConfig {
        VenueConfig {
            quote_failure_rate: 1.0,
            ..deterministic_config(25)
        }
    }

    fn test_params() -> SwapParams {
        SwapParams {
            token_in: "SOL".to_string(),
            token_out: "USDC".to_string(),
            amount_in: Decimal::new(2, 0),
            slippage: Decimal::new(5, 3),
        }
    }

    #[tokio::test]
    async fn test_best_route_prefers_higher_output() {
        // 수수료 차이만 있으므로 수수료가 낮은 Raydium이 이겨야 함
        let engine = RoutingEngine::new(vec![
            Arc::new(MeteoraAdapter::with_config(deterministic_config(30))),
            Arc::new(RaydiumAdapter::with_config(deterministic_config(25))),
        ]);

        let decision = engine.find_best_route(&test_params(), None).await.unwrap();
        assert_eq!(decision.selected.venue, "Raydium");
        assert_eq!(decision.all_quotes.len(), 2);
        assert!(decision.rationale.contains("Raydium"));
    }

    #[tokio::test]
    async fn test_single_venue_failure_is_isolated() {
        let engine = RoutingEngine::new(vec![
            Arc::new(RaydiumAdapter::with_config(failing_config())),
            Arc::new(MeteoraAdapter::with_config(deterministic_config(30))),
        ]);

        let decision = engine.find_best_route(&test_params(), None).await.unwrap();
        assert_eq!(decision.selected.venue, "Meteora");
        assert_eq!(decision.all_quotes.len(), 1);
    }

    #[tokio::test]
    async fn test_all_venues_failing_returns_no_quotes() {
        let engine = RoutingEngine::new(vec![
            Arc::new(RaydiumAdapter::with_config(failing_config())),
            Arc::new(MeteoraAdapter::with_config(failing_config())),
        ]);

        let err = engine
            .find_best_route(&test_params(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::NoQuotesAvailable));
    }

    #[tokio::test]
    async fn test_execute_unknown_venue_rejected() {
        let engine = RoutingEngine::new(vec![Arc::new(RaydiumAdapter::with_config(
            deterministic_config(25),
        ))]);

        let decision = engine.find_best_route(&test_params(), None).await.unwrap();
        let mut quote = decision.selected.clone();
        quote.venue = "Orca".to_string();

        let err = engine.execute_swap(&test_params(), &quote).await.unwrap_err();
        assert!(matches!(err, RoutingError::UnknownVenue { .. }));
    }

    #[tokio::test]
    async fn test_execute_computes_realized_slippage() {
        let engine = RoutingEngine::new(vec![Arc::new(RaydiumAdapter::with_config(
            deterministic_config(25),
        ))]);

        let params = test_params();
        let decision = engine.find_best_route(&params, None).await.unwrap();
        let executed = engine
            .execute_swap(&params, &decision.selected)
            .await
            .unwrap();

        // 변동/슬리피지 0이므로 실현 출력 == 예상 출력
        assert_eq!(executed.output_amount, decision.selected.estimated_out);
        assert_eq!(executed.realized_slippage, Decimal::ZERO);
        assert!(!executed.tx_hash.is_empty());
    }
}
