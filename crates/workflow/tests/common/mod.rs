#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use polyadmin_core::adapter::{
    Adapter, AdapterInformation, AdapterKind, AdapterSetting, AdapterSettingsUpdate, ModeKey,
    PathAccessRequest, SettingGroup, SettingSchema,
};
use polyadmin_core::cache_status::CacheStatus;
use polyadmin_core::deploy::StagedDeploy;
use polyadmin_core::result_set::ResultSet;
use polyadmin_core::table::{
    CreateTableRequest, DropTruncateRequest, EditTableRequest, PolyType, RenameTableRequest,
    SchemaTypes, TableSummary,
};
use polyadmin_gateway::{Gateway, GatewayError};

/// A scripted reply: `Err(())` becomes a transport failure.
pub type Reply<T> = Result<T, ()>;

fn unavailable() -> GatewayError {
    GatewayError::Api {
        status: 503,
        body: "unavailable".into(),
    }
}

fn next<T: Default>(queue: &Mutex<VecDeque<Reply<T>>>) -> Result<T, GatewayError> {
    match queue.lock().unwrap().pop_front() {
        Some(Ok(value)) => Ok(value),
        Some(Err(())) => Err(unavailable()),
        None => Ok(T::default()),
    }
}

/// In-memory backend with scripted replies and a call log.
#[derive(Default)]
pub struct FakeGateway {
    pub stores: Mutex<Vec<Adapter>>,
    pub sources: Mutex<Vec<Adapter>>,
    pub available_stores: Mutex<Vec<AdapterInformation>>,
    pub available_sources: Mutex<Vec<AdapterInformation>>,
    pub tables: Mutex<Vec<TableSummary>>,
    pub schemas: Mutex<SchemaTypes>,
    pub types: Mutex<Vec<PolyType>>,
    pub fail_listings: Mutex<bool>,

    pub access_tokens: Mutex<VecDeque<Reply<String>>>,
    pub command_results: Mutex<VecDeque<Reply<ResultSet>>>,
    pub cache_statuses: Mutex<VecDeque<Reply<CacheStatus>>>,

    pub calls: Mutex<Vec<String>>,
    pub deployed: Mutex<Vec<StagedDeploy>>,
    pub updates: Mutex<Vec<AdapterSettingsUpdate>>,
    pub created: Mutex<Vec<CreateTableRequest>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == op).count()
    }

    pub fn push_result(&self, reply: Reply<ResultSet>) {
        self.command_results.lock().unwrap().push_back(reply);
    }

    pub fn push_token(&self, reply: Reply<String>) {
        self.access_tokens.lock().unwrap().push_back(reply);
    }

    pub fn push_status(&self, json: &str) {
        let status = serde_json::from_str(json).unwrap();
        self.cache_statuses.lock().unwrap().push_back(Ok(status));
    }

    pub fn push_status_failure(&self) {
        self.cache_statuses.lock().unwrap().push_back(Err(()));
    }

    fn record(&self, op: &str) {
        self.calls.lock().unwrap().push(op.to_string());
    }

    fn listing<T: Clone>(&self, op: &str, items: &Mutex<Vec<T>>) -> Result<Vec<T>, GatewayError> {
        self.record(op);
        if *self.fail_listings.lock().unwrap() {
            return Err(unavailable());
        }
        Ok(items.lock().unwrap().clone())
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn get_stores(&self) -> Result<Vec<Adapter>, GatewayError> {
        self.listing("get_stores", &self.stores)
    }

    async fn get_sources(&self) -> Result<Vec<Adapter>, GatewayError> {
        self.listing("get_sources", &self.sources)
    }

    async fn get_available_stores(&self) -> Result<Vec<AdapterInformation>, GatewayError> {
        self.listing("get_available_stores", &self.available_stores)
    }

    async fn get_available_sources(&self) -> Result<Vec<AdapterInformation>, GatewayError> {
        self.listing("get_available_sources", &self.available_sources)
    }

    async fn update_adapter_settings(
        &self,
        update: &AdapterSettingsUpdate,
    ) -> Result<ResultSet, GatewayError> {
        self.record("update_adapter_settings");
        self.updates.lock().unwrap().push(update.clone());
        next(&self.command_results)
    }

    async fn add_adapter(&self, deploy: &StagedDeploy) -> Result<ResultSet, GatewayError> {
        self.record("add_adapter");
        self.deployed.lock().unwrap().push(deploy.clone());
        next(&self.command_results)
    }

    async fn remove_adapter(&self, _unique_name: &str) -> Result<ResultSet, GatewayError> {
        self.record("remove_adapter");
        next(&self.command_results)
    }

    async fn path_access(&self, _request: &PathAccessRequest) -> Result<String, GatewayError> {
        self.record("path_access");
        next(&self.access_tokens)
    }

    async fn get_event_cache_status(&self) -> Result<CacheStatus, GatewayError> {
        self.record("get_event_cache_status");
        match self.cache_statuses.lock().unwrap().pop_front() {
            Some(Ok(status)) => Ok(status),
            _ => Err(unavailable()),
        }
    }

    async fn drop_truncate_table(
        &self,
        _request: &DropTruncateRequest,
    ) -> Result<ResultSet, GatewayError> {
        self.record("drop_truncate_table");
        next(&self.command_results)
    }

    async fn create_table(&self, request: &CreateTableRequest) -> Result<ResultSet, GatewayError> {
        self.record("create_table");
        self.created.lock().unwrap().push(request.clone());
        next(&self.command_results)
    }

    async fn rename_table(&self, _request: &RenameTableRequest) -> Result<ResultSet, GatewayError> {
        self.record("rename_table");
        next(&self.command_results)
    }

    async fn get_tables(
        &self,
        _request: &EditTableRequest,
    ) -> Result<Vec<TableSummary>, GatewayError> {
        self.listing("get_tables", &self.tables)
    }

    async fn get_type_schemas(&self) -> Result<SchemaTypes, GatewayError> {
        self.record("get_type_schemas");
        if *self.fail_listings.lock().unwrap() {
            return Err(unavailable());
        }
        Ok(self.schemas.lock().unwrap().clone())
    }

    async fn get_types(&self) -> Result<Vec<PolyType>, GatewayError> {
        self.listing("get_types", &self.types)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn instance(unique_name: &str, adapter_name: &str) -> Adapter {
    Adapter {
        unique_name: unique_name.into(),
        adapter_name: adapter_name.into(),
        kind: None,
        current_settings: Default::default(),
        adapter_settings: vec![],
    }
}

/// A CSV source type deployable by upload or by linking a directory.
pub fn csv_information() -> AdapterInformation {
    let mut method = AdapterSetting::text("method", "upload");
    method.options = Some(vec!["upload".into(), "link".into()]);
    let mut directory = AdapterSetting::text("directory", "");
    directory.file_names = Some(vec![]);

    AdapterInformation {
        name: "CSV".into(),
        kind: AdapterKind::Source,
        adapter_settings: SettingSchema::new(vec![
            SettingGroup {
                mode: ModeKey::Named("embedded".into()),
                settings: vec![method, directory, AdapterSetting::text("directoryName", "")],
            },
            SettingGroup {
                mode: ModeKey::Default,
                settings: vec![AdapterSetting::text("maxStringLength", "255")],
            },
        ]),
    }
}
