//! Deployment submission with the optional path-access handshake.
//!
//! A [`DeploymentSession`] walks one staged deployment through
//! `Idle -> [AwaitingAccess ->] Deploying -> Done`. Deployments whose
//! `method` is `link` reference a directory on the backend host and must
//! first obtain path access; every other deployment is submitted directly.
//! The current state is published on a `watch` channel so the presentation
//! can show its `deploying` / `handshaking` indicators while calls are in
//! flight.

use std::sync::Arc;

use polyadmin_core::adapter::PathAccessRequest;
use polyadmin_core::deploy::StagedDeploy;
use polyadmin_core::error::CoreError;
use polyadmin_core::validation::NameError;
use polyadmin_events::{Toast, ToastService};
use polyadmin_gateway::Gateway;
use tokio::sync::watch;

use crate::outcome::{settle, CommandOutcome, Notices};

const DEPLOY_FAILED: &str = "Could not deploy adapter";

/// Where a deployment currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployState {
    /// Nothing submitted yet, or the last attempt failed.
    Idle,
    /// Waiting for the operator to confirm path access.
    AwaitingAccess,
    /// The deployment request is in flight.
    Deploying,
    /// The adapter was deployed.
    Done,
}

/// Result of driving a deployment one step.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployOutcome {
    /// The adapter is deployed; the presentation leaves the deploy view.
    Deployed {
        unique_name: String,
        generated_query: Option<String>,
    },
    /// Path access must be granted first: the operator places `access_id`
    /// and then calls [`DeploymentSession::continue_deploy`].
    AwaitingAccess { access_id: String },
    /// The attempt failed and was announced; the session is `Idle` again
    /// and the deploy form stays open for a retry.
    Failed,
}

/// Why a deployment could not be started or continued.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// The proposed unique name is missing, malformed or taken.
    #[error(transparent)]
    Name(#[from] NameError),

    /// Required settings are empty.
    #[error("missing required settings: {}", .0.join(", "))]
    InvalidSettings(Vec<String>),

    /// The payload could not be assembled.
    #[error(transparent)]
    Assembly(#[from] CoreError),

    /// The session is not in a state that accepts this step.
    #[error("cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: DeployState,
    },
}

/// One deployment attempt of the deploy view.
pub struct DeploymentSession {
    gateway: Arc<dyn Gateway>,
    toasts: ToastService,
    state: watch::Sender<DeployState>,
    pending: Option<StagedDeploy>,
    access_id: Option<String>,
}

impl DeploymentSession {
    /// An idle session reporting to `toasts`.
    pub fn new(gateway: Arc<dyn Gateway>, toasts: ToastService) -> Self {
        let (state, _) = watch::channel(DeployState::Idle);
        Self {
            gateway,
            toasts,
            state,
            pending: None,
            access_id: None,
        }
    }

    /// Current step of the session.
    pub fn state(&self) -> DeployState {
        *self.state.borrow()
    }

    /// Observe state changes.
    pub fn watch(&self) -> watch::Receiver<DeployState> {
        self.state.subscribe()
    }

    /// `true` while the deploy request is in flight.
    pub fn is_deploying(&self) -> bool {
        self.state() == DeployState::Deploying
    }

    pub fn is_handshaking(&self) -> bool {
        self.state() == DeployState::AwaitingAccess
    }

    /// Token the operator must place while the session awaits access.
    pub fn access_id(&self) -> Option<&str> {
        self.access_id.as_deref()
    }

    /// Submit `staged`, running the path-access handshake first when its
    /// method is `link`.
    pub async fn submit(&mut self, mut staged: StagedDeploy) -> Result<DeployOutcome, DeployError> {
        self.expect_state(DeployState::Idle, "submit")?;

        if !staged.request.requires_path_access() {
            return Ok(self.deploy(staged).await);
        }

        let request = PathAccessRequest {
            name: staged.unique_name().to_string(),
            directory_name: staged.directory_name().to_string(),
        };
        self.set_state(DeployState::AwaitingAccess);
        tracing::info!(
            unique_name = %request.name,
            directory = %request.directory_name,
            "Requesting path access",
        );

        let token = match self.gateway.path_access(&request).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(unique_name = %request.name, error = %e, "Path access request failed");
                self.toasts.error(DEPLOY_FAILED).await;
                self.set_state(DeployState::Idle);
                return Ok(DeployOutcome::Failed);
            }
        };

        staged.set_access(&token);
        if token.trim().is_empty() {
            // access already granted
            return Ok(self.deploy(staged).await);
        }

        self.access_id = Some(token.clone());
        self.pending = Some(staged);
        Ok(DeployOutcome::AwaitingAccess { access_id: token })
    }

    /// Submit the deployment held back by the handshake once the operator
    /// has placed the access token.
    pub async fn continue_deploy(&mut self) -> Result<DeployOutcome, DeployError> {
        self.expect_state(DeployState::AwaitingAccess, "continue")?;
        let staged = self.pending.take().ok_or(DeployError::InvalidState {
            action: "continue",
            state: DeployState::AwaitingAccess,
        })?;
        Ok(self.deploy(staged).await)
    }

    /// Abandon a pending handshake, e.g. when the deploy form is closed.
    pub fn cancel(&mut self) {
        if self.state() == DeployState::AwaitingAccess {
            tracing::info!("Deployment handshake abandoned");
            self.pending = None;
            self.access_id = None;
            self.set_state(DeployState::Idle);
        }
    }

    async fn deploy(&mut self, staged: StagedDeploy) -> DeployOutcome {
        self.set_state(DeployState::Deploying);
        self.access_id = None;

        let unique_name = staged.unique_name().to_string();
        let response = self.gateway.add_adapter(&staged).await;
        let outcome = settle(
            &self.toasts,
            "deploy_adapter",
            response,
            Notices {
                success: format!("Deployed \"{unique_name}\""),
                rejected: Some(DEPLOY_FAILED.to_string()),
                unreachable: Toast::error(DEPLOY_FAILED),
            },
        )
        .await;

        match outcome {
            CommandOutcome::Applied(result) => {
                self.set_state(DeployState::Done);
                DeployOutcome::Deployed {
                    unique_name,
                    generated_query: result.generated_query,
                }
            }
            CommandOutcome::Rejected(_) | CommandOutcome::Unreachable => {
                self.set_state(DeployState::Idle);
                DeployOutcome::Failed
            }
        }
    }

    fn expect_state(&self, expected: DeployState, action: &'static str) -> Result<(), DeployError> {
        let state = self.state();
        if state == expected {
            Ok(())
        } else {
            Err(DeployError::InvalidState { action, state })
        }
    }

    fn set_state(&self, state: DeployState) {
        self.state.send_replace(state);
    }
}
