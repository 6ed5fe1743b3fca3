//! Adapter-deployment workflow engines of the polyadmin console.
//!
//! Everything here talks to the backend through
//! [`Gateway`](polyadmin_gateway::Gateway) and reports outcomes to the
//! operator through a [`ToastService`](polyadmin_events::ToastService).

pub mod directory;
pub mod handshake;
pub mod outcome;
pub mod poller;
pub mod scope;
pub mod tables;

pub use directory::{AdapterDirectory, Listings, RemoveOutcome};
pub use handshake::{DeployError, DeployOutcome, DeployState, DeploymentSession};
pub use outcome::CommandOutcome;
pub use poller::{CachePoller, CacheProgress, PollEnd, PollerConfig};
pub use scope::ViewScope;
pub use tables::{TableEditor, TableError};
