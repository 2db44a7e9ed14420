// Swap domain models
// 스왑 도메인 모델
pub mod execution;
pub mod history;
pub mod order;
pub mod quote_log;

pub use execution::{ExecutionCreate, OrderExecution};
pub use history::OrderStatusHistory;
pub use order::{
    serialize_u64_as_string, CreateSwapOrderRequest, Order, OrderCreate, OrderDetail, OrderStatus,
    OrderType,
};
pub use quote_log::{DexQuoteLog, QuoteLogCreate};
