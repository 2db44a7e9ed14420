// Database module
// 데이터베이스 모듈
pub mod connection;
pub mod repositories;

pub use connection::Database;
pub use repositories::swap::{
    ExecutionRepository, HistoryRepository, OrderRepository, QuoteLogRepository,
};
