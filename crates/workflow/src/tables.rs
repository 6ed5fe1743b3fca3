//! Table editing within one schema: create, drop/truncate and rename.
//!
//! Local validation failures of a create are announced as warnings that
//! stay until dismissed and never reach the backend. Listings are fetched
//! again whenever the live channel reconnects.

use std::sync::Arc;

use polyadmin_core::table::{
    CreateTableRequest, DbColumn, DropTruncateRequest, EditTableRequest, PolyType,
    RenameTableRequest, TableAction, TableSummary,
};
use polyadmin_core::validation::NameRules;
use polyadmin_events::{Toast, ToastDuration, ToastService};
use polyadmin_gateway::channel::ChannelEvent;
use polyadmin_gateway::Gateway;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use crate::outcome::{settle, CommandOutcome, Notices};

/// Schema type whose table names compare case-insensitively.
const RELATIONAL: &str = "relational";

/// Why a table operation was refused before reaching the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("Please provide a name for the new table. The new table was not created.")]
    MissingName,

    #[error("Please provide a valid name for the new table. The new table was not created.")]
    InvalidName,

    #[error("A table with this name already exists. Please choose another name.")]
    AlreadyExists,

    #[error("Please specify a primary key. The new table was not created.")]
    MissingPrimaryKey,

    #[error("Please make sure all column names are valid. The new table was not created.")]
    InvalidColumnName,

    /// The confirmation text does not name the table.
    #[error("confirmation does not match `{0}`")]
    NotConfirmed(String),

    /// The new name is invalid or already used.
    #[error("cannot rename to `{0}`")]
    InvalidNewName(String),
}

impl TableError {
    /// Title of the warning announcing this error.
    pub fn title(&self) -> &'static str {
        match self {
            TableError::MissingName => "missing table name",
            TableError::InvalidName | TableError::AlreadyExists => "invalid table name",
            TableError::MissingPrimaryKey => "missing primary key",
            TableError::InvalidColumnName => "invalid column name",
            TableError::NotConfirmed(_) | TableError::InvalidNewName(_) => "warning",
        }
    }
}

#[derive(Debug, Default)]
struct Listing {
    tables: Vec<TableSummary>,
    schema_type: Option<String>,
    types: Vec<PolyType>,
}

/// Table operations of one schema.
pub struct TableEditor {
    gateway: Arc<dyn Gateway>,
    toasts: ToastService,
    rules: NameRules,
    schema: String,
    scope: CancellationToken,
    listing: RwLock<Listing>,
}

impl TableEditor {
    /// Editor of `schema`. A channel listener started by
    /// [`follow_channel`](Self::follow_channel) stops when `scope` is
    /// cancelled.
    pub fn new(
        gateway: Arc<dyn Gateway>,
        toasts: ToastService,
        rules: NameRules,
        schema: impl Into<String>,
        scope: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            toasts,
            rules,
            schema: schema.into(),
            scope,
            listing: RwLock::new(Listing::default()),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Tables of the schema, sorted by name.
    pub async fn tables(&self) -> Vec<TableSummary> {
        self.listing.read().await.tables.clone()
    }

    /// Type of the schema (`RELATIONAL`, `DOCUMENT`, ...), once known.
    pub async fn schema_type(&self) -> Option<String> {
        self.listing.read().await.schema_type.clone()
    }

    /// Column types offered for new tables.
    pub async fn types(&self) -> Vec<PolyType> {
        self.listing.read().await.types.clone()
    }

    /// Re-fetch the table list, the schema type and the column types.
    pub async fn refresh(&self) {
        let request = EditTableRequest {
            schema: self.schema.clone(),
        };
        let (tables, schemas, types) = tokio::join!(
            self.gateway.get_tables(&request),
            self.gateway.get_type_schemas(),
            self.gateway.get_types()
        );

        match tables {
            Ok(mut tables) => {
                tables.sort_by(|a, b| a.name.cmp(&b.name));
                self.listing.write().await.tables = tables;
            }
            Err(e) => {
                tracing::error!(schema = %self.schema, error = %e, "Failed to fetch tables");
                self.toasts.error("could not retrieve list of tables").await;
            }
        }
        match schemas {
            Ok(mut schemas) => {
                self.listing.write().await.schema_type = schemas.swap_remove(&self.schema);
            }
            Err(e) => tracing::error!(error = %e, "Failed to fetch schema types"),
        }
        match types {
            Ok(types) => self.listing.write().await.types = types,
            Err(e) => tracing::error!(error = %e, "Failed to fetch column types"),
        }
    }

    /// Re-fetch the listings on every live-channel reconnect until the
    /// scope closes or the channel goes away.
    pub fn follow_channel(self: &Arc<Self>, mut events: broadcast::Receiver<ChannelEvent>) {
        let editor = Arc::clone(self);
        let scope = self.scope.child_token();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = scope.cancelled() => return,
                    event = events.recv() => event,
                };
                match event {
                    Ok(ChannelEvent::Reconnected { .. }) => {
                        tracing::info!(
                            schema = %editor.schema,
                            "Live channel reconnected, re-fetching tables"
                        );
                        editor.refresh().await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            skipped,
                            schema = %editor.schema,
                            "Channel listener lagged, re-fetching tables"
                        );
                        editor.refresh().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });
    }

    /// `true` when a table named `name` exists; relational schemas compare
    /// case-insensitively.
    pub async fn name_is_taken(&self, name: &str) -> bool {
        let listing = self.listing.read().await;
        let relational = listing
            .schema_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(RELATIONAL));
        listing.tables.iter().any(|t| {
            if relational {
                t.name.eq_ignore_ascii_case(name)
            } else {
                t.name == name
            }
        })
    }

    /// Check a new table definition. Columns with an empty name are
    /// dropped from `columns`.
    pub async fn validate_create(
        &self,
        name: &str,
        columns: &mut Vec<DbColumn>,
    ) -> Result<(), TableError> {
        if name.is_empty() {
            return Err(TableError::MissingName);
        }
        if !self.rules.table_name_is_valid(name) {
            return Err(TableError::InvalidName);
        }
        if self.name_is_taken(name).await {
            return Err(TableError::AlreadyExists);
        }

        columns.retain(|c| !c.name.is_empty());
        if !columns.iter().any(|c| c.primary) {
            return Err(TableError::MissingPrimaryKey);
        }
        if columns.iter().any(|c| !self.rules.table_name_is_valid(&c.name)) {
            return Err(TableError::InvalidColumnName);
        }
        Ok(())
    }

    /// Create a table. Validation failures are announced as warnings that
    /// stay until dismissed, and nothing is sent.
    pub async fn create_table(
        &self,
        name: &str,
        mut columns: Vec<DbColumn>,
        store: Option<String>,
    ) -> Result<CommandOutcome, TableError> {
        if let Err(e) = self.validate_create(name, &mut columns).await {
            self.warn(&e).await;
            return Err(e);
        }

        let request = CreateTableRequest {
            schema: self.schema.clone(),
            table: name.to_string(),
            columns,
            store,
        };
        let response = self.gateway.create_table(&request).await;
        let reachable = response.is_ok();
        let outcome = settle(
            &self.toasts,
            "create_table",
            response,
            Notices {
                success: format!("Generated table {name}"),
                rejected: Some("Could not generate table:".to_string()),
                unreachable: Toast::error("Could not generate table"),
            },
        )
        .await;

        if reachable {
            self.refresh().await;
        }
        Ok(outcome)
    }

    /// Drop or truncate `table`. `confirmation` must be the table name, or
    /// the action followed by the table name (`drop orders`).
    pub async fn drop_truncate(
        &self,
        table: &TableSummary,
        action: TableAction,
        confirmation: &str,
    ) -> Result<CommandOutcome, TableError> {
        let prefixed = format!("{} {}", action.verb(), table.name);
        if confirmation != table.name && confirmation != prefixed {
            return Err(TableError::NotConfirmed(table.name.clone()));
        }

        let kind = table.table_type.label();
        let request = DropTruncateRequest {
            schema: self.schema.clone(),
            table: table.name.clone(),
            action,
            table_type: table.table_type,
        };
        let verb = action.verb();
        let response = self.gateway.drop_truncate_table(&request).await;
        let outcome = settle(
            &self.toasts,
            "drop_truncate_table",
            response,
            Notices {
                success: format!("{} the {kind} {}", action.past(), table.name),
                rejected: Some(format!("Could not {verb} the {kind} {}:", table.name)),
                unreachable: Toast::error(format!(
                    "Could not {verb} the {kind} {} due to an unknown error",
                    table.name
                )),
            },
        )
        .await;

        if outcome.is_applied() {
            self.refresh().await;
        }
        Ok(outcome)
    }

    /// Rename `table` to `new_name`, which must be valid and unused.
    pub async fn rename(
        &self,
        table: &TableSummary,
        new_name: &str,
    ) -> Result<CommandOutcome, TableError> {
        if !self.rules.table_name_is_valid(new_name) || self.name_is_taken(new_name).await {
            return Err(TableError::InvalidNewName(new_name.to_string()));
        }

        let kind = table.table_type.label();
        let request = RenameTableRequest {
            schema: self.schema.clone(),
            table: table.name.clone(),
            new_name: new_name.to_string(),
            table_type: table.table_type,
        };
        let response = self.gateway.rename_table(&request).await;
        let outcome = settle(
            &self.toasts,
            "rename_table",
            response,
            Notices {
                success: format!("Renamed {kind} {} to {new_name}", table.name),
                rejected: None,
                unreachable: Toast::error(format!("Could not rename the {kind} {}", table.name)),
            },
        )
        .await;

        if outcome.is_applied() {
            self.refresh().await;
        }
        Ok(outcome)
    }

    async fn warn(&self, error: &TableError) {
        self.toasts
            .warn(
                &error.to_string(),
                Some(error.title()),
                Some(ToastDuration::Infinite),
            )
            .await;
    }
}
