//! Session flow for Kuraz: the welcome → search → results state machine and
//! the controller that owns it.

pub mod controller;
pub mod error;
pub mod error_mapping;
pub mod setup;
pub mod state;

pub use controller::SessionController;
pub use error::SessionError;
pub use setup::{build_controller, retry_policy};
pub use state::{SessionState, View};
