use std::time::Duration;

// =====================================================
// 재시도 정책 (Retry Policy)
// =====================================================
// 지수 백오프: delay = base * multiplier^(attempt - 1), 상한 max_delay
// =====================================================

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 첫 재시도 지연
    pub base_delay: Duration,

    /// 지수 배율
    pub multiplier: f64,

    /// 총 시도 횟수 상한 (첫 실행 포함)
    pub max_attempts: u32,

    /// 지연 상한
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            multiplier: 2.0,
            max_attempts,
            max_delay: Duration::from_secs(60),
        }
    }

    /// 실패한 시도 번호(1부터)에 대한 재시도 지연 계산
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.powi(exponent as i32);
        let millis = self.base_delay.as_millis() as f64 * factor;
        let delay = Duration::from_millis(millis as u64);
        delay.min(self.max_delay)
    }

    /// 해당 시도 실패 후 재시도 여부
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), 3)
    }
}
