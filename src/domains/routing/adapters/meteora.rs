use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{simulate_execution, simulate_quote, VenueAdapter, VenueConfig};
use crate::domains::routing::types::{SwapParams, VenueExecution, VenueQuote};
use crate::shared::errors::RoutingError;

// =====================================================
// Meteora 어댑터
// =====================================================
// 높은 수수료(0.30%), 느린 응답, 낮은 실행 슬리피지
// =====================================================

pub struct MeteoraAdapter {
    config: VenueConfig,
}

impl MeteoraAdapter {
    pub fn new() -> Self {
        Self {
            config: VenueConfig {
                fee_rate: Decimal::new(30, 4), // 0.0030
                latency_ms: (40, 120),
                price_variance: 0.004,
                execution_slippage: 0.002,
                quote_failure_rate: 0.08,
                execution_failure_rate: 0.04,
            },
        }
    }

    /// 테스트/운영 튜닝용 커스텀 설정 생성자
    pub fn with_config(config: VenueConfig) -> Self {
        Self { config }
    }
}

impl Default for MeteoraAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueAdapter for MeteoraAdapter {
    fn venue(&self) -> &str {
        "Meteora"
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
