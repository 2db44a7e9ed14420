use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

// =====================================================
// 롤링 윈도우 레이트 리미터 (Rolling Window Rate Limiter)
// =====================================================
// 최근 window 내 시작 수가 max 미만일 때만 작업 시작 허용.
// 고정 버킷이 아니라 슬라이딩 윈도우라 경계 버스트가 없습니다.
// =====================================================

pub struct RateLimiter {
    max: usize,
    window: Duration,
    starts: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            starts: Mutex::new(VecDeque::new()),
        }
    }

    /// 슬롯 획득 시도. 허용되면 시작 시각을 기록하고 true
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut starts = self.starts.lock();

        while let Some(front) = starts.front() {
            if now.duration_since(*front) >= self.window {
                starts.pop_front();
            } else {
                break;
            }
        }

        if starts.len() < self.max {
            starts.push_back(now);
            true
        } else {
            false
        }
    }

    /// 현재 윈도우 내 시작 수 (모니터링용)
    pub fn current_count(&self) -> usize {
        let now = Instant::now();
        let mut starts = self.starts.lock();
        while let Some(front) = starts.front() {
            if now.duration_since(*front) >= self.window {
                starts.pop_front();
            } else {
                break;
            }
        }
        starts.len()
    }
}
