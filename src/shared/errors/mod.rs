// Shared errors
pub mod routing_error;
pub mod swap_error;

pub use routing_error::*;
pub use swap_error::*;
