//! The adapters view: deployed instances, deployable types and the
//! operations on them.
//!
//! [`AdapterDirectory`] keeps the last fetched listings, re-fetches them
//! whenever the live channel reconnects, validates and stages new
//! deployments, updates and removes instances, and starts the cache-status
//! poller once the caching source reports caching enabled.

use std::sync::Arc;

use indexmap::IndexMap;
use polyadmin_core::adapter::{Adapter, AdapterInformation, AdapterSettingsUpdate};
use polyadmin_core::cache_status::caching_enabled;
use polyadmin_core::deploy::StagedDeploy;
use polyadmin_core::error::CoreError;
use polyadmin_core::naming::default_unique_name;
use polyadmin_core::settings::DeployForms;
use polyadmin_core::validation::{NameError, NameRules};
use polyadmin_events::{Toast, ToastService};
use polyadmin_gateway::channel::ChannelEvent;
use polyadmin_gateway::Gateway;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::handshake::DeployError;
use crate::outcome::{settle, CommandOutcome, Notices};
use crate::poller::{CachePoller, CacheProgress, PollerConfig};

/// Listings as last fetched.
#[derive(Debug, Clone, Default)]
pub struct Listings {
    /// Deployed stores, sorted by unique name.
    pub stores: Vec<Adapter>,
    /// Deployed sources.
    pub sources: Vec<Adapter>,
    /// Deployable store types, sorted by name.
    pub available_stores: Vec<AdapterInformation>,
    /// Deployable source types, sorted by name.
    pub available_sources: Vec<AdapterInformation>,
}

impl Listings {
    /// Unique names of every deployed store and source.
    pub fn unique_names(&self) -> impl Iterator<Item = &str> {
        self.stores
            .iter()
            .chain(&self.sources)
            .map(|a| a.unique_name.as_str())
    }
}

/// Result of one removal request.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    /// First request for this adapter: removal is armed, nothing was sent.
    Armed,
    /// A removal of this adapter is already in flight; ignored.
    InProgress,
    /// The removal was sent.
    Finished(CommandOutcome),
}

#[derive(Debug, Default)]
struct Removal {
    armed: Option<String>,
    in_progress: Vec<String>,
}

pub struct AdapterDirectory {
    gateway: Arc<dyn Gateway>,
    toasts: ToastService,
    rules: NameRules,
    poller_config: PollerConfig,
    scope: CancellationToken,
    listings: RwLock<Listings>,
    removal: Mutex<Removal>,
    poller: Mutex<Option<CachePoller>>,
}

impl AdapterDirectory {
    /// Create the directory of a view. Pollers and listeners it starts stop
    /// when `scope` is cancelled.
    pub fn new(
        gateway: Arc<dyn Gateway>,
        toasts: ToastService,
        rules: NameRules,
        poller_config: PollerConfig,
        scope: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            toasts,
            rules,
            poller_config,
            scope,
            listings: RwLock::new(Listings::default()),
            removal: Mutex::new(Removal::default()),
            poller: Mutex::new(None),
        }
    }

    /// Notification store the directory reports to.
    pub fn toasts(&self) -> &ToastService {
        &self.toasts
    }

    /// Shared handle to the backend.
    pub fn gateway(&self) -> Arc<dyn Gateway> {
        Arc::clone(&self.gateway)
    }

    /// Snapshot of the listings as last fetched.
    pub async fn listings(&self) -> Listings {
        self.listings.read().await.clone()
    }

    // ---- fetching ----

    /// Re-fetch instances and deployable types.
    pub async fn refresh(&self) {
        tokio::join!(self.refresh_instances(), self.refresh_available());
    }

    /// Re-fetch deployed stores and sources. Failures are logged and leave
    /// the previous listing in place.
    pub async fn refresh_instances(&self) {
        let (stores, sources) = tokio::join!(self.gateway.get_stores(), self.gateway.get_sources());

        let mut listings = self.listings.write().await;
        match stores {
            Ok(mut stores) => {
                stores.sort_by(|a, b| a.unique_name.cmp(&b.unique_name));
                listings.stores = stores;
            }
            Err(e) => tracing::error!(error = %e, "Failed to fetch stores"),
        }
        let caching = match sources {
            Ok(sources) => {
                listings.sources = sources;
                listings.sources.iter().any(caching_enabled)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch sources");
                false
            }
        };
        drop(listings);

        if caching {
            self.ensure_cache_poller().await;
        }
    }

    /// Re-fetch the deployable store and source types.
    pub async fn refresh_available(&self) {
        let (stores, sources) = tokio::join!(
            self.gateway.get_available_stores(),
            self.gateway.get_available_sources()
        );

        let mut listings = self.listings.write().await;
        match stores {
            Ok(mut stores) => {
                stores.sort_by(|a, b| a.name.cmp(&b.name));
                listings.available_stores = stores;
            }
            Err(e) => tracing::error!(error = %e, "Failed to fetch available stores"),
        }
        match sources {
            Ok(mut sources) => {
                sources.sort_by(|a, b| a.name.cmp(&b.name));
                listings.available_sources = sources;
            }
            Err(e) => tracing::error!(error = %e, "Failed to fetch available sources"),
        }
    }

    /// Re-fetch everything on every live-channel reconnect until the scope
    /// closes or the channel goes away.
    pub fn follow_channel(self: &Arc<Self>, mut events: broadcast::Receiver<ChannelEvent>) {
        let directory = Arc::clone(self);
        let scope = self.scope.child_token();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = scope.cancelled() => return,
                    event = events.recv() => event,
                };
                match event {
                    Ok(ChannelEvent::Reconnected { .. }) => {
                        tracing::info!("Live channel reconnected, re-fetching adapters");
                        directory.refresh().await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Channel listener lagged, re-fetching adapters");
                        directory.refresh().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });
    }

    // ---- caching ----

    /// The deployed caching source, if caching is switched on.
    pub async fn caching_source(&self) -> Option<Adapter> {
        self.listings
            .read()
            .await
            .sources
            .iter()
            .find(|a| caching_enabled(a))
            .cloned()
    }

    /// Progress of the running or last cache poll, if one was started.
    pub async fn cache_progress(&self) -> Option<watch::Receiver<CacheProgress>> {
        self.poller.lock().await.as_ref().map(CachePoller::progress)
    }

    /// Start a cache poll unless one is still running. A finished poll,
    /// done or failed, is replaced by a fresh one.
    async fn ensure_cache_poller(&self) {
        let mut poller = self.poller.lock().await;
        if let Some(running) = poller.as_ref() {
            if !running.is_finished().await {
                return;
            }
        }
        tracing::info!("Caching enabled, starting cache status polling");
        *poller = Some(CachePoller::start(
            self.gateway(),
            self.poller_config.clone(),
            &self.scope,
        ));
    }

    // ---- deploying ----

    /// Suggested unique name for a new instance of `adapter`.
    pub async fn default_unique_name(&self, adapter: &AdapterInformation) -> String {
        let listings = self.listings.read().await;
        default_unique_name(&adapter.name, listings.unique_names())
    }

    /// Check a proposed unique name against the naming rules and the
    /// current listing.
    pub async fn validate_name(&self, candidate: &str) -> Result<(), NameError> {
        let listings = self.listings.read().await;
        self.rules
            .validate_unique_name(candidate, listings.unique_names())
    }

    /// Validate the name and the active form, then stage the deployment.
    /// Nothing is sent.
    pub async fn begin_deploy(
        &self,
        forms: &DeployForms,
        unique_name: &str,
    ) -> Result<StagedDeploy, DeployError> {
        self.validate_name(unique_name).await?;

        let form = forms.active_form().ok_or(CoreError::NoActiveMode)?;
        let invalid = form.invalid_fields();
        if !invalid.is_empty() {
            return Err(DeployError::InvalidSettings(
                invalid.into_iter().map(str::to_string).collect(),
            ));
        }

        Ok(StagedDeploy::assemble(forms, unique_name)?)
    }

    // ---- editing ----

    /// Send new values for the modifiable settings of `adapter`.
    ///
    /// Every modifiable, non-file setting is sent, taking its value from
    /// `edits` or else from the adapter's current settings. Other entries of
    /// `edits` are ignored.
    pub async fn update_settings(
        &self,
        adapter: &Adapter,
        edits: &IndexMap<String, String>,
    ) -> CommandOutcome {
        let settings = adapter
            .adapter_settings
            .iter()
            .filter(|s| s.modifiable && !s.is_file())
            .filter_map(|s| {
                edits
                    .get(&s.name)
                    .or_else(|| adapter.current_settings.get(&s.name))
                    .map(|v| (s.name.clone(), v.clone()))
            })
            .collect();

        let update = AdapterSettingsUpdate {
            unique_name: adapter.unique_name.clone(),
            adapter_name: adapter.adapter_name.clone(),
            settings,
        };
        let response = self.gateway.update_adapter_settings(&update).await;
        let reachable = response.is_ok();
        let outcome = settle(
            &self.toasts,
            "update_adapter_settings",
            response,
            Notices {
                success: "Updated adapter settings".to_string(),
                rejected: None,
                unreachable: Toast::error("Could not update adapter settings"),
            },
        )
        .await;

        if reachable {
            self.refresh_instances().await;
        }
        outcome
    }

    /// Two-step removal: the first call for an adapter arms it, a second
    /// call for the same adapter sends the removal.
    pub async fn remove_adapter(&self, unique_name: &str) -> RemoveOutcome {
        {
            let mut removal = self.removal.lock().await;
            if removal.armed.as_deref() != Some(unique_name) {
                removal.armed = Some(unique_name.to_string());
                return RemoveOutcome::Armed;
            }
            if removal.in_progress.iter().any(|n| n == unique_name) {
                return RemoveOutcome::InProgress;
            }
            removal.in_progress.push(unique_name.to_string());
        }

        let response = self.gateway.remove_adapter(unique_name).await;
        let outcome = settle(
            &self.toasts,
            "remove_adapter",
            response,
            Notices {
                success: format!("Dropped \"{unique_name}\""),
                rejected: None,
                unreachable: Toast::error("Could not remove adapter").with_title("server error"),
            },
        )
        .await;

        {
            let mut removal = self.removal.lock().await;
            removal.in_progress.retain(|n| n != unique_name);
            removal.armed = None;
        }

        if outcome.is_applied() {
            self.refresh_instances().await;
        }
        RemoveOutcome::Finished(outcome)
    }

    /// Adapter currently armed for removal.
    pub async fn armed_removal(&self) -> Option<String> {
        self.removal.lock().await.armed.clone()
    }

    /// Disarm a pending removal. Has no effect while one is in flight.
    pub async fn reset_removal(&self) {
        let mut removal = self.removal.lock().await;
        if removal.in_progress.is_empty() {
            removal.armed = None;
        }
    }
}
