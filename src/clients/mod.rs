//! Adapters for the two external dependencies: the user directory and the payment gateway.

pub mod payment_gateway;
pub mod user_client;

pub use payment_gateway::*;
pub use user_client::*;
