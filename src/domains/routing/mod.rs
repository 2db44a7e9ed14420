pub mod adapters;
pub mod router;
pub mod types;

pub use adapters::{MeteoraAdapter, RaydiumAdapter, VenueAdapter, VenueConfig};
pub use router::RoutingEngine;
pub use types::{ExecutedSwap, RouteDecision, SwapParams, VenueQuote};
