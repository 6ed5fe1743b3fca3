//! HTTP implementation of [`Gateway`] using [`reqwest`].
//!
//! Every backend operation is an endpoint named after the operation under
//! the base URL, e.g. `GET {base}/getStores` or `POST {base}/createTable`.

use async_trait::async_trait;
use polyadmin_core::adapter::{Adapter, AdapterInformation, AdapterSettingsUpdate, PathAccessRequest};
use polyadmin_core::cache_status::CacheStatus;
use polyadmin_core::deploy::StagedDeploy;
use polyadmin_core::result_set::ResultSet;
use polyadmin_core::table::{
    CreateTableRequest, DropTruncateRequest, EditTableRequest, PolyType, RenameTableRequest,
    SchemaTypes, TableSummary,
};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::gateway::{Gateway, GatewayError};

/// HTTP client for one backend instance.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for a backend.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a gateway reusing an existing [`reqwest::Client`]
    /// (timeouts and connection pooling are configured on the client).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ---- private helpers ----

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GatewayError> {
        let response = self.client.get(self.url(endpoint)).send().await?;
        Self::parse_response(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let response = self.client.post(self.url(endpoint)).json(body).send().await?;
        Self::parse_response(response).await
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`GatewayError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get_stores(&self) -> Result<Vec<Adapter>, GatewayError> {
        self.get("getStores").await
    }

    async fn get_sources(&self) -> Result<Vec<Adapter>, GatewayError> {
        self.get("getSources").await
    }

    async fn get_available_stores(&self) -> Result<Vec<AdapterInformation>, GatewayError> {
        self.get("getAvailableStores").await
    }

    async fn get_available_sources(&self) -> Result<Vec<AdapterInformation>, GatewayError> {
        self.get("getAvailableSources").await
    }

    async fn update_adapter_settings(
        &self,
        update: &AdapterSettingsUpdate,
    ) -> Result<ResultSet, GatewayError> {
        self.post("updateAdapterSettings", update).await
    }

    async fn add_adapter(&self, deploy: &StagedDeploy) -> Result<ResultSet, GatewayError> {
        let body = deploy
            .body_json()
            .map_err(|e| GatewayError::Payload(e.to_string()))?;

        let mut form = Form::new().text("body", body);
        for file in &deploy.files {
            let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
            form = form.part(file.name.clone(), part);
        }

        tracing::debug!(
            unique_name = deploy.unique_name(),
            files = deploy.files.len(),
            "Submitting deployment",
        );

        let response = self
            .client
            .post(self.url("addAdapter"))
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn remove_adapter(&self, unique_name: &str) -> Result<ResultSet, GatewayError> {
        self.post("removeAdapter", unique_name).await
    }

    async fn path_access(&self, request: &PathAccessRequest) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.url("pathAccess"))
            .json(request)
            .send()
            .await?;
        let text = Self::ensure_success(response).await?.text().await?;

        // The token arrives either as a JSON string or as plain text.
        Ok(serde_json::from_str::<String>(&text).unwrap_or(text))
    }

    async fn get_event_cache_status(&self) -> Result<CacheStatus, GatewayError> {
        self.get("getEventCacheStatus").await
    }

    async fn drop_truncate_table(
        &self,
        request: &DropTruncateRequest,
    ) -> Result<ResultSet, GatewayError> {
        self.post("dropTruncateTable", request).await
    }

    async fn create_table(&self, request: &CreateTableRequest) -> Result<ResultSet, GatewayError> {
        self.post("createTable", request).await
    }

    async fn rename_table(&self, request: &RenameTableRequest) -> Result<ResultSet, GatewayError> {
        self.post("renameTable", request).await
    }

    async fn get_tables(
        &self,
        request: &EditTableRequest,
    ) -> Result<Vec<TableSummary>, GatewayError> {
        self.post("getTables", request).await
    }

    async fn get_type_schemas(&self) -> Result<SchemaTypes, GatewayError> {
        self.get("getTypeSchemas").await
    }

    async fn get_types(&self) -> Result<Vec<PolyType>, GatewayError> {
        self.get("getTypes").await
    }
}
