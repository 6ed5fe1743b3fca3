//! Local name validation for adapter instances and tables.
//!
//! The accepted-name patterns are supplied by the backend configuration;
//! [`NameRules`] compiles them once and answers validity queries without a
//! network round-trip.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Default pattern for adapter unique names.
pub const DEFAULT_ADAPTER_NAME_PATTERN: &str = "[a-z_][a-z0-9_]{0,100}";
/// Default pattern for table and column names.
pub const DEFAULT_TABLE_NAME_PATTERN: &str = "[a-zA-Z_][a-zA-Z0-9_]{0,100}";

static DEFAULT_ADAPTER_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&anchored(DEFAULT_ADAPTER_NAME_PATTERN)).expect("valid regex"));
static DEFAULT_TABLE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&anchored(DEFAULT_TABLE_NAME_PATTERN)).expect("valid regex"));

/// Why a proposed adapter unique name was rejected.
///
/// The `Display` text is the inline feedback shown under the name field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("missing unique name")]
    Missing,

    #[error(
        "invalid unique name: unique name must only contain lower case letters, digits and underscores"
    )]
    Invalid,

    #[error("name is not unique")]
    NotUnique,
}

/// Compiled naming patterns for adapters and tables.
#[derive(Debug, Clone)]
pub struct NameRules {
    adapter_name: Regex,
    table_name: Regex,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            adapter_name: DEFAULT_ADAPTER_NAME_RE.clone(),
            table_name: DEFAULT_TABLE_NAME_RE.clone(),
        }
    }
}

impl NameRules {
    /// Compile the given patterns. Each pattern must match the whole name.
    pub fn new(adapter_pattern: &str, table_pattern: &str) -> Result<Self, CoreError> {
        Ok(Self {
            adapter_name: compile(adapter_pattern)?,
            table_name: compile(table_pattern)?,
        })
    }

    /// Validate a proposed adapter unique name.
    ///
    /// Checks, in order: non-empty, matches the adapter pattern, and not
    /// equal (case-sensitive) to any of `existing`.
    pub fn validate_unique_name<'a, I>(&self, candidate: &str, existing: I) -> Result<(), NameError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if candidate.is_empty() {
            return Err(NameError::Missing);
        }
        if !self.adapter_name.is_match(candidate) {
            return Err(NameError::Invalid);
        }
        if existing.into_iter().any(|name| name == candidate) {
            return Err(NameError::NotUnique);
        }
        Ok(())
    }

    /// `true` when `name` is an acceptable table or column name.
    pub fn table_name_is_valid(&self, name: &str) -> bool {
        self.table_name.is_match(name)
    }
}

fn anchored(pattern: &str) -> String {
    let inner = pattern.trim_start_matches('^').trim_end_matches('$');
    format!("^(?:{inner})$")
}

fn compile(pattern: &str) -> Result<Regex, CoreError> {
    Regex::new(&anchored(pattern)).map_err(|e| CoreError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
