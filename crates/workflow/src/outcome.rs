//! Turning backend replies into operator notices.

use polyadmin_core::result_set::ResultSet;
use polyadmin_events::{Toast, ToastService};
use polyadmin_gateway::GatewayError;

/// How a mutating backend call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The backend applied the change.
    Applied(ResultSet),
    /// The backend answered with an application error.
    Rejected(ResultSet),
    /// The backend could not be reached or answered garbage.
    Unreachable,
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommandOutcome::Applied(_))
    }
}

/// Texts announcing the outcome of one call.
pub(crate) struct Notices {
    /// Success message; the generated query is attached.
    pub success: String,
    /// Prefix of the exception message on application errors.
    pub rejected: Option<String>,
    /// Shown instead of the transport error, which is only logged.
    pub unreachable: Toast,
}

/// Announce `response` and classify it.
pub(crate) async fn settle(
    toasts: &ToastService,
    operation: &'static str,
    response: Result<ResultSet, GatewayError>,
    notices: Notices,
) -> CommandOutcome {
    match response {
        Ok(result) if !result.is_error() => {
            tracing::info!(operation, "Backend applied change");
            toasts
                .success(&notices.success, result.generated_query.clone(), None, None)
                .await;
            CommandOutcome::Applied(result)
        }
        Ok(result) => {
            tracing::warn!(operation, error = result.error_text(), "Backend rejected change");
            toasts
                .exception(&result, notices.rejected.as_deref(), None, None)
                .await;
            CommandOutcome::Rejected(result)
        }
        Err(e) => {
            tracing::error!(operation, error = %e, "Backend call failed");
            toasts.publish(notices.unreachable).await;
            CommandOutcome::Unreachable
        }
    }
}
