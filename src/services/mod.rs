//! The two cross-service workflows.
//!
//! - [`OrderService`] validates the owner against the user directory before pricing
//!   and persisting an order, and enriches reads with live user data.
//! - [`PaymentService`] runs the persist, charge, reconcile saga against the
//!   payment gateway.

pub mod order_service;
pub mod payment_service;

pub use order_service::*;
pub use payment_service::*;
