//! System orchestration, configuration, startup, and shutdown logic.

pub mod config;
pub mod checkout_system;
pub mod telemetry;

pub use config::*;
pub use checkout_system::*;
pub use telemetry::*;
