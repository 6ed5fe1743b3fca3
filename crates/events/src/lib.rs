//! Notification (toast) engine of the polyadmin console.
//!
//! - [`Toast`]: one user-facing message with severity, optional generated
//!   query and optional server exception.
//! - [`ToastService`]: the session-owned store of live toasts, keyed by a
//!   derived identity, with timed expiry and a change stream backed by
//!   `tokio::sync::broadcast`.

pub mod service;
pub mod toast;

pub use service::{ToastEvent, ToastService};
pub use toast::{Severity, Toast, ToastDuration, ToastKey};
