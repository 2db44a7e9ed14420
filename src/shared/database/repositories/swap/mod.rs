// Swap domain repositories
// 스왑 도메인 리포지토리
pub mod execution_repository;
pub mod history_repository;
pub mod order_repository;
pub mod quote_log_repository;

pub use execution_repository::ExecutionRepository;
pub use history_repository::HistoryRepository;
pub use order_repository::OrderRepository;
pub use quote_log_repository::QuoteLogRepository;
