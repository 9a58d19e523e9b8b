//! # Order and payment workflows
//!
//! Two cooperating services sharing one saga shape: persist intent, call an
//! external dependency, reconcile.
//!
//! - **Orders** - the owner is validated against the user directory before the
//!   order is priced and persisted; reads enrich each order with live user data
//!   on a best-effort basis → [`services::OrderService`]
//! - **Payments** - a pending row is persisted, the gateway is charged once, and
//!   the outcome is written back and re-read → [`services::PaymentService`]
//!
//! Rows live in store actors ([`actor_framework::ResourceActor`]) reached through
//! the [`store`] traits. External dependencies sit behind the [`clients`] traits.
//! [`app_system::CheckoutSystem`] wires everything from an [`app_system::Config`].

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod clock;
pub mod domain;
pub mod error;
pub mod services;
pub mod store;

#[cfg(test)]
mod mock_framework;

pub use error::{status_for, ServiceError};
