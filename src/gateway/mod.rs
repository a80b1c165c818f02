mod auth;
mod completions;
mod dispatch;
mod error;
mod router;

pub use error::GatewayError;
pub use router::create_gateway_router;
