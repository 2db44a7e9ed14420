/// ID 생성기
/// ID Generator
///
/// 역할:
/// - 주문 ID 생성 (Order ID)
/// - 잡 ID 생성 (Job ID)
/// - WebSocket 연결 ID 생성 (Connection ID)
/// - Atomic counter를 사용하여 스레드 안전하게 ID 생성
///
/// 초기화:
/// 서버 시작 시 스토어에서 마지막 주문 ID를 읽어와서 초기화
/// (서버 재시작 시에도 ID가 중복되지 않도록)

use std::sync::atomic::{AtomicU64, Ordering};

/// 주문 ID 카운터 (서버 시작 시 초기화)
static ORDER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// 잡 ID 카운터
static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// 연결 ID 카운터
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// 주문 ID 생성기
/// Order ID Generator
///
/// AtomicU64를 사용하여 스레드 안전하게 ID 생성
/// 서버 시작 시 스토어에서 마지막 주문 ID를 읽어와서 초기화
pub struct OrderIdGenerator;

impl OrderIdGenerator {
    /// 다음 주문 ID 생성
    /// Generate next order ID
    pub fn next() -> u64 {
        ORDER_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
    }

    /// ID 생성기 초기화
    /// Initialize ID generator
    ///
    /// # Arguments
    /// * `last_id` - 스토어에서 읽은 마지막 주문 ID (없으면 0)
    ///
    /// # Example
    /// ```ignore
    /// let last_order_id = store.max_order_id().await?;
    /// OrderIdGenerator::initialize(last_order_id);
    /// ```
    pub fn initialize(last_id: u64) {
        // 마지막 ID 다음부터 시작
        ORDER_ID_COUNTER.store(last_id + 1, Ordering::SeqCst);
    }

    /// 현재 ID 값 조회 (디버깅용)
    /// Get current ID value (for debugging)
    pub fn current() -> u64 {
        ORDER_ID_COUNTER.load(Ordering::SeqCst)
    }
}

/// 잡 ID 생성기
/// Job ID Generator
///
/// 잡 ID는 프로세스 로컬이므로 재시작 시 초기화가 필요 없음
pub struct JobIdGenerator;

impl JobIdGenerator {
    /// 다음 잡 ID 생성
    /// Generate next job ID
    pub fn next() -> u64 {
        JOB_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
    }
}

/// WebSocket 연결 ID 생성기
/// Connection ID Generator
pub struct ConnectionIdGenerator;

impl ConnectionIdGenerator {
    /// 다음 연결 ID 생성
    /// Generate next connection ID
    pub fn next() -> u64 {
        CONNECTION_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
    }
}
