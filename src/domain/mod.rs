//! Business entities shared by the order and payment workflows.

pub mod user;
pub mod order;
pub mod payment;

pub use user::*;
pub use order::*;
pub use payment::*;
