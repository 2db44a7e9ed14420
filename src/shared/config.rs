use std::time::Duration;

// =====================================================
// AppConfig - 환경 변수 기반 설정
// =====================================================
// 역할: 프로세스 부트스트랩 설정
// 설명: 모든 값은 환경 변수에서 읽고, 없으면 기본값 사용
// =====================================================

/// 애플리케이션 설정
/// Application configuration (env-driven, with defaults)
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL 연결 문자열 (없으면 인메모리 스토어 사용)
    /// PostgreSQL URL (in-memory store when unset)
    pub database_url: Option<String>,

    /// WebSocket 서버 바인드 주소
    pub ws_bind_addr: String,

    /// 동시 실행 잡 최대 개수
    pub queue_concurrency: usize,

    /// 롤링 윈도우당 잡 시작 최대 횟수
    pub rate_limit_max: u32,

    /// 레이트 리밋 윈도우
    pub rate_limit_window: Duration,

    /// 잡 최대 시도 횟수
    pub max_attempts: u32,

    /// 재시도 백오프 기본 지연
    pub backoff_base: Duration,

    /// 라우팅 + 실행 전체에 적용되는 데드라인
    pub execution_timeout: Duration,

    /// 연결 생존 확인 주기
    pub ws_sweep_interval: Duration,

    /// 연결 타임아웃 (마지막 활동 기준)
    pub ws_connection_timeout: Duration,
}

/// 환경 변수 파싱 헬퍼 (실패 시 기본값)
/// Parse env var, falling back to a default
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// 환경 변수에서 설정 로드
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            ws_bind_addr: std::env::var("WS_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:3010".to_string()),
            queue_concurrency: env_parse("QUEUE_CONCURRENCY", 10),
            rate_limit_max: env_parse("QUEUE_RATE_LIMIT_MAX", 100),
            rate_limit_window: Duration::from_millis(env_parse("QUEUE_RATE_LIMIT_WINDOW_MS", 1_000)),
            max_attempts: env_parse("QUEUE_MAX_ATTEMPTS", 3),
            backoff_base: Duration::from_millis(env_parse("QUEUE_BACKOFF_BASE_MS", 1_000)),
            execution_timeout: Duration::from_millis(env_parse("EXECUTION_TIMEOUT_MS", 30_000)),
            ws_sweep_interval: Duration::from_millis(env_parse("WS_SWEEP_INTERVAL_MS", 30_000)),
            ws_connection_timeout: Duration::from_millis(env_parse("WS_CONNECTION_TIMEOUT_MS", 120_000)),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
