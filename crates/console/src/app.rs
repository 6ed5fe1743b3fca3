//! The running console.
//!
//! [`Console::start`] builds the HTTP gateway, the toast store and the
//! adapters view, fetches the initial listings and connects the live
//! channel. Everything it spawns runs under one [`ViewScope`] and stops on
//! [`Console::shutdown`].

use std::sync::Arc;

use polyadmin_core::error::CoreError;
use polyadmin_events::{Severity, ToastEvent, ToastService};
use polyadmin_gateway::api::HttpGateway;
use polyadmin_gateway::channel::{track_status, LiveChannel};
use polyadmin_gateway::client::LiveChannelClient;
use polyadmin_gateway::reconnect::BackoffConfig;
use polyadmin_gateway::Gateway;
use polyadmin_workflow::{AdapterDirectory, DeploymentSession, TableEditor, ViewScope};
use tokio::sync::{broadcast, watch};

use crate::config::ConsoleConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub struct Console {
    config: ConsoleConfig,
    gateway: Arc<dyn Gateway>,
    toasts: ToastService,
    directory: Arc<AdapterDirectory>,
    channel: LiveChannel,
    scope: ViewScope,
}

impl Console {
    /// Wire up the console and fetch the initial listings.
    pub async fn start(config: ConsoleConfig) -> Result<Self, ConsoleError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::with_client(client, &config.http_url));

        let scope = ViewScope::new();
        let toasts = ToastService::default();
        scope.spawn(log_toasts(toasts.subscribe()));

        let directory = Arc::new(AdapterDirectory::new(
            Arc::clone(&gateway),
            toasts.clone(),
            config.name_rules()?,
            config.poller_config(),
            scope.token(),
        ));
        directory.refresh().await;

        let channel = LiveChannel::start(
            LiveChannelClient::new(&config.ws_url),
            BackoffConfig::default(),
            &scope.token(),
        );
        directory.follow_channel(channel.subscribe());

        let listings = directory.listings().await;
        tracing::info!(
            http_url = %config.http_url,
            stores = listings.stores.len(),
            sources = listings.sources.len(),
            "Console started",
        );

        Ok(Self {
            config,
            gateway,
            toasts,
            directory,
            channel,
            scope,
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn toasts(&self) -> &ToastService {
        &self.toasts
    }

    pub fn directory(&self) -> &Arc<AdapterDirectory> {
        &self.directory
    }

    /// A fresh deployment attempt for the deploy view.
    pub fn deployment(&self) -> DeploymentSession {
        DeploymentSession::new(Arc::clone(&self.gateway), self.toasts.clone())
    }

    /// Table editing for `schema`, with its listings fetched and kept
    /// current across reconnects.
    pub async fn table_editor(&self, schema: &str) -> Result<Arc<TableEditor>, CoreError> {
        let editor = Arc::new(TableEditor::new(
            Arc::clone(&self.gateway),
            self.toasts.clone(),
            self.config.name_rules()?,
            schema,
            self.scope.token(),
        ));
        editor.refresh().await;
        editor.follow_channel(self.channel.subscribe());
        Ok(editor)
    }

    /// Progress the backend pushes for `context` (e.g. `tableExport`);
    /// `None` until the first status frame arrives.
    pub fn progress(&self, context: &str) -> watch::Receiver<Option<f64>> {
        let (tx, rx) = watch::channel(None);
        self.scope
            .spawn(track_status(self.channel.subscribe(), context.to_string(), tx));
        rx
    }

    /// Stop the live channel, pending toast timers and every background
    /// task.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down console");
        self.channel.shutdown().await;
        self.toasts.shutdown();
        self.scope.close();
    }
}

/// Mirror notifications into the log.
async fn log_toasts(mut events: broadcast::Receiver<ToastEvent>) {
    loop {
        match events.recv().await {
            Ok(ToastEvent::Added(toast)) => match toast.severity {
                Severity::Success => {
                    tracing::info!(title = %toast.title, message = %toast.message, "Notification")
                }
                Severity::Warning => {
                    tracing::warn!(title = %toast.title, message = %toast.message, "Notification")
                }
                Severity::Error => {
                    tracing::error!(title = %toast.title, message = %toast.message, "Notification")
                }
            },
            Ok(ToastEvent::Removed(key)) => tracing::debug!(key = %key, "Notification removed"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notification log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}
