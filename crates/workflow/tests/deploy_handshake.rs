//! Deployment submission with and without the path-access handshake.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::{csv_information, FakeGateway};
use polyadmin_core::deploy::StagedDeploy;
use polyadmin_core::result_set::ResultSet;
use polyadmin_core::settings::DeployForms;
use polyadmin_events::{Severity, ToastService};
use polyadmin_workflow::{DeployError, DeployOutcome, DeployState, DeploymentSession};

fn staged(method: &str) -> StagedDeploy {
    let mut forms = DeployForms::reconcile(&csv_information());
    let form = forms.active_form_mut().unwrap();
    form.set_text("method", method).unwrap();
    form.set_text("directoryName", "/srv/data").unwrap();
    StagedDeploy::assemble(&forms, "csv1").unwrap()
}

fn session(gateway: &Arc<FakeGateway>, toasts: &ToastService) -> DeploymentSession {
    DeploymentSession::new(gateway.clone(), toasts.clone())
}

// ---------------------------------------------------------------------------
// Direct deployment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_method_deploys_without_handshake() {
    let gateway = FakeGateway::new();
    let toasts = ToastService::default();
    gateway.push_result(Ok(ResultSet::success("ALTER ADAPTERS ADD csv1")));

    let mut session = session(&gateway, &toasts);
    let outcome = session.submit(staged("upload")).await.unwrap();

    assert_eq!(
        outcome,
        DeployOutcome::Deployed {
            unique_name: "csv1".into(),
            generated_query: Some("ALTER ADAPTERS ADD csv1".into()),
        }
    );
    assert_eq!(session.state(), DeployState::Done);
    assert_eq!(gateway.calls(), ["add_adapter"]);

    let shown = toasts.toasts().await;
    assert_eq!(shown[0].message, "Deployed \"csv1\"");
    assert_eq!(shown[0].generated_query.as_deref(), Some("ALTER ADAPTERS ADD csv1"));
}

#[tokio::test]
async fn rejected_deploy_returns_to_idle_with_exception_toast() {
    let gateway = FakeGateway::new();
    let toasts = ToastService::default();
    gateway.push_result(Ok(ResultSet::failure("port in use")));

    let mut session = session(&gateway, &toasts);
    let outcome = session.submit(staged("upload")).await.unwrap();

    assert_eq!(outcome, DeployOutcome::Failed);
    assert_eq!(session.state(), DeployState::Idle);
    let shown = toasts.toasts().await;
    assert_eq!(shown[0].severity, Severity::Warning);
    assert_eq!(shown[0].message, "Could not deploy adapter port in use");
}

#[tokio::test]
async fn transport_failure_shows_generic_error() {
    let gateway = FakeGateway::new();
    let toasts = ToastService::default();
    gateway.push_result(Err(()));

    let mut session = session(&gateway, &toasts);
    let outcome = session.submit(staged("upload")).await.unwrap();

    assert_eq!(outcome, DeployOutcome::Failed);
    assert_eq!(session.state(), DeployState::Idle);
    let shown = toasts.toasts().await;
    assert_eq!(shown[0].severity, Severity::Error);
    assert_eq!(shown[0].message, "Could not deploy adapter");

    // the form stays usable for a retry
    gateway.push_result(Ok(ResultSet::default()));
    assert_matches!(
        session.submit(staged("upload")).await,
        Ok(DeployOutcome::Deployed { .. })
    );
}

// ---------------------------------------------------------------------------
// Secure (link) deployment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blank_token_deploys_immediately() {
    let gateway = FakeGateway::new();
    let toasts = ToastService::default();
    gateway.push_token(Ok("  ".into()));

    let mut session = session(&gateway, &toasts);
    let outcome = session.submit(staged("link")).await.unwrap();

    assert_matches!(outcome, DeployOutcome::Deployed { .. });
    assert_eq!(gateway.calls(), ["path_access", "add_adapter"]);
}

#[tokio::test]
async fn token_waits_for_continuation() {
    let gateway = FakeGateway::new();
    let toasts = ToastService::default();
    gateway.push_token(Ok("b7c1-access".into()));

    let mut session = session(&gateway, &toasts);
    let mut states = session.watch();

    let outcome = session.submit(staged("link")).await.unwrap();
    assert_eq!(
        outcome,
        DeployOutcome::AwaitingAccess {
            access_id: "b7c1-access".into()
        }
    );
    assert!(session.is_handshaking());
    assert!(!session.is_deploying());
    assert_eq!(session.access_id(), Some("b7c1-access"));
    assert_eq!(gateway.calls(), ["path_access"]);
    assert!(states.has_changed().unwrap());
    assert_eq!(*states.borrow_and_update(), DeployState::AwaitingAccess);

    let outcome = session.continue_deploy().await.unwrap();
    assert_matches!(outcome, DeployOutcome::Deployed { .. });
    assert_eq!(gateway.calls(), ["path_access", "add_adapter"]);

    let sent = gateway.deployed.lock().unwrap()[0].clone();
    assert_eq!(sent.request.value("access"), Some("b7c1-access"));
    assert_eq!(sent.request.value("mode"), Some("embedded"));
}

#[tokio::test]
async fn failed_path_access_returns_to_idle() {
    let gateway = FakeGateway::new();
    let toasts = ToastService::default();
    gateway.push_token(Err(()));

    let mut session = session(&gateway, &toasts);
    let outcome = session.submit(staged("link")).await.unwrap();

    assert_eq!(outcome, DeployOutcome::Failed);
    assert_eq!(session.state(), DeployState::Idle);
    assert_eq!(gateway.count("add_adapter"), 0);
    assert_eq!(toasts.toasts().await[0].severity, Severity::Error);
}

#[tokio::test]
async fn steps_out_of_order_are_rejected() {
    let gateway = FakeGateway::new();
    let toasts = ToastService::default();
    let mut session = session(&gateway, &toasts);

    assert_matches!(
        session.continue_deploy().await,
        Err(DeployError::InvalidState {
            state: DeployState::Idle,
            ..
        })
    );

    gateway.push_token(Ok("token".into()));
    session.submit(staged("link")).await.unwrap();
    assert_matches!(
        session.submit(staged("link")).await,
        Err(DeployError::InvalidState {
            state: DeployState::AwaitingAccess,
            ..
        })
    );

    session.cancel();
    assert_eq!(session.state(), DeployState::Idle);
    assert_eq!(session.access_id(), None);
    assert_eq!(gateway.count("add_adapter"), 0);
}
