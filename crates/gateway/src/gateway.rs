//! The request/response seam between the console engines and the backend.

use async_trait::async_trait;
use polyadmin_core::adapter::{Adapter, AdapterInformation, AdapterSettingsUpdate, PathAccessRequest};
use polyadmin_core::cache_status::CacheStatus;
use polyadmin_core::deploy::StagedDeploy;
use polyadmin_core::result_set::ResultSet;
use polyadmin_core::table::{
    CreateTableRequest, DropTruncateRequest, EditTableRequest, PolyType, RenameTableRequest,
    SchemaTypes, TableSummary,
};

/// Errors from the gateway layer.
///
/// These are transport failures. Application-level failures arrive as a
/// [`ResultSet`] with its `error` set and are not represented here.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A request or response body could not be (de)serialized.
    #[error("Invalid payload: {0}")]
    Payload(String),
}

/// Backend operations used by the console.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Deployed store instances.
    async fn get_stores(&self) -> Result<Vec<Adapter>, GatewayError>;

    /// Deployed source instances.
    async fn get_sources(&self) -> Result<Vec<Adapter>, GatewayError>;

    /// Store adapter types that can be deployed.
    async fn get_available_stores(&self) -> Result<Vec<AdapterInformation>, GatewayError>;

    /// Source adapter types that can be deployed.
    async fn get_available_sources(&self) -> Result<Vec<AdapterInformation>, GatewayError>;

    async fn update_adapter_settings(
        &self,
        update: &AdapterSettingsUpdate,
    ) -> Result<ResultSet, GatewayError>;

    /// Submit a deployment: JSON `body` part plus the staged files.
    async fn add_adapter(&self, deploy: &StagedDeploy) -> Result<ResultSet, GatewayError>;

    async fn remove_adapter(&self, unique_name: &str) -> Result<ResultSet, GatewayError>;

    /// Request access to a local directory. Returns the access token the
    /// operator must place, or a blank string when access is already
    /// granted.
    async fn path_access(&self, request: &PathAccessRequest) -> Result<String, GatewayError>;

    async fn get_event_cache_status(&self) -> Result<CacheStatus, GatewayError>;

    async fn drop_truncate_table(
        &self,
        request: &DropTruncateRequest,
    ) -> Result<ResultSet, GatewayError>;

    async fn create_table(&self, request: &CreateTableRequest) -> Result<ResultSet, GatewayError>;

    async fn rename_table(&self, request: &RenameTableRequest) -> Result<ResultSet, GatewayError>;

    async fn get_tables(&self, request: &EditTableRequest)
        -> Result<Vec<TableSummary>, GatewayError>;

    async fn get_type_schemas(&self) -> Result<SchemaTypes, GatewayError>;

    async fn get_types(&self) -> Result<Vec<PolyType>, GatewayError>;
}
