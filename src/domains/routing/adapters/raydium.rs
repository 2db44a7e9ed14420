use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{simulate_execution, simulate_quote, VenueAdapter, VenueConfig};
use crate::domains::routing::types::{SwapParams, VenueExecution, VenueQuote};
use crate::shared::errors::RoutingError;

// =====================================================
// Raydium 어댑터
// =====================================================
// 낮은 수수료(0.25%), 빠른 응답, 약간 높은 실행 슬리피지
// =====================================================

pub struct RaydiumAdapter {
    config: VenueConfig,
}

impl RaydiumAdapter {
    pub fn new() -> Self {
        Self {
            config: VenueConfig {
                fee_rate: Decimal::new(25, 4), // 0.0025
                latency_ms: (20, 80),
                price_variance: 0.003,
                execution_slippage: 0.004,
                quote_failure_rate: 0.05,
                execution_failure_rate: 0.05,
            },
        }
    }

    /// 테스트/운영 튜닝용 커스텀 설정 생성자
    pub fn with_config(config: VenueConfig) -> Self {
        Self { config }
    }
}

impl Default for RaydiumAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueAdapter for RaydiumAdapter {
    fn venue(&self) -> &str {
        "Raydium"
    }

    async fn quote(&self, params: &SwapParams) -> Result<VenueQuote, RoutingError> {
        simulate_quote(self.venue(), &self.config, params).await
    }

    async fn execute(
        &self,
        params: &SwapParams,
        quote: &VenueQuote,
    ) -> Result<VenueExecution, RoutingError> {
        simulate_execution(self.venue(), &self.config, params, quote).await
    }
}
