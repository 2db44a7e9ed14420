pub mod queue;
pub mod routing;
pub mod swap;
pub mod ws;
