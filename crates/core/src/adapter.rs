//! Adapter wire models: deployable adapter types, deployed instances and
//! their setting descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::UniqueName;

/// Setting name holding the deployment mode of a new adapter.
pub const SETTING_MODE: &str = "mode";
/// Setting name selecting how source files are provided.
pub const SETTING_METHOD: &str = "method";
/// Setting name of the directory referenced by a `link` deployment.
pub const SETTING_DIRECTORY_NAME: &str = "directoryName";
/// Setting name carrying the path-access token of a secure deployment.
pub const SETTING_ACCESS: &str = "access";
/// Deploy method that references a local path instead of uploading files.
pub const METHOD_LINK: &str = "link";

/// Whether an adapter stores data or exposes an external source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdapterKind {
    Store,
    Source,
}

/// One configurable field of an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterSetting {
    pub name: String,
    /// Human-readable label shown next to the field.
    #[serde(default, rename = "description")]
    pub label: String,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub modifiable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Present (possibly empty) for file-upload settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_names: Option<Vec<String>>,
    #[serde(default)]
    pub position: i32,
    /// Visibility condition `"<setting>_<value>"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_of: Option<String>,
}

impl AdapterSetting {
    /// A plain text setting with the given value.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            default_value: value.into(),
            required: false,
            modifiable: true,
            options: None,
            file_names: None,
            position: 0,
            sub_of: None,
        }
    }

    /// `true` for settings whose value is a set of uploaded files.
    pub fn is_file(&self) -> bool {
        self.file_names.is_some()
    }

    /// The value a fresh form field starts with: the first option when the
    /// setting is enumerated, the default value otherwise.
    pub fn initial_value(&self) -> String {
        self.options
            .as_ref()
            .and_then(|opts| opts.first().cloned())
            .unwrap_or_else(|| self.default_value.clone())
    }
}

/// Key of a setting group inside an adapter's setting schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModeKey {
    /// Settings shared by every deployment mode.
    Default,
    /// The synthetic group holding the `mode` selector descriptor.
    Selector,
    /// A deployment variant such as `docker` or `embedded`.
    Named(String),
}

impl ModeKey {
    pub fn as_str(&self) -> &str {
        match self {
            ModeKey::Default => "default",
            ModeKey::Selector => SETTING_MODE,
            ModeKey::Named(name) => name,
        }
    }
}

impl From<String> for ModeKey {
    fn from(value: String) -> Self {
        match value.as_str() {
            "default" => ModeKey::Default,
            SETTING_MODE => ModeKey::Selector,
            _ => ModeKey::Named(value),
        }
    }
}

impl std::fmt::Display for ModeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The settings declared for one [`ModeKey`].
#[derive(Debug, Clone, PartialEq)]
pub struct SettingGroup {
    pub mode: ModeKey,
    pub settings: Vec<AdapterSetting>,
}

/// Setting schema of an adapter type, in the order the backend declared it.
///
/// Travels over the wire as a JSON object keyed by mode name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, Vec<AdapterSetting>>",
    into = "IndexMap<String, Vec<AdapterSetting>>"
)]
pub struct SettingSchema {
    groups: Vec<SettingGroup>,
}

impl SettingSchema {
    pub fn new(groups: Vec<SettingGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[SettingGroup] {
        &self.groups
    }

    /// Settings of the given group, if the schema declares it.
    pub fn group(&self, mode: &ModeKey) -> Option<&[AdapterSetting]> {
        self.groups
            .iter()
            .find(|g| &g.mode == mode)
            .map(|g| g.settings.as_slice())
    }

    /// Named deployment modes, excluding `default` and the selector group.
    pub fn named_modes(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter_map(|g| match &g.mode {
                ModeKey::Named(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every setting of every group, in declaration order.
    pub fn all_settings(&self) -> impl Iterator<Item = &AdapterSetting> {
        self.groups.iter().flat_map(|g| g.settings.iter())
    }

    /// First setting with the given name across all groups.
    pub fn find(&self, name: &str) -> Option<&AdapterSetting> {
        self.all_settings().find(|s| s.name == name)
    }
}

impl From<IndexMap<String, Vec<AdapterSetting>>> for SettingSchema {
    fn from(map: IndexMap<String, Vec<AdapterSetting>>) -> Self {
        let groups = map
            .into_iter()
            .map(|(mode, settings)| SettingGroup {
                mode: ModeKey::from(mode),
                settings,
            })
            .collect();
        Self { groups }
    }
}

impl From<SettingSchema> for IndexMap<String, Vec<AdapterSetting>> {
    fn from(schema: SettingSchema) -> Self {
        schema
            .groups
            .into_iter()
            .map(|g| (g.mode.as_str().to_string(), g.settings))
            .collect()
    }
}

/// A deployable adapter type as advertised by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterInformation {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AdapterKind,
    #[serde(default)]
    pub adapter_settings: SettingSchema,
}

/// A deployed store or source instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adapter {
    pub unique_name: UniqueName,
    pub adapter_name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<AdapterKind>,
    #[serde(default)]
    pub current_settings: IndexMap<String, String>,
    #[serde(default)]
    pub adapter_settings: Vec<AdapterSetting>,
}

impl Adapter {
    pub fn setting(&self, name: &str) -> Option<&AdapterSetting> {
        self.adapter_settings.iter().find(|s| s.name == name)
    }
}

/// Body of the `updateAdapterSettings` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterSettingsUpdate {
    pub unique_name: UniqueName,
    pub adapter_name: String,
    pub settings: IndexMap<String, String>,
}

/// Body of the `pathAccess` call opening a secure `link` deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathAccessRequest {
    pub name: UniqueName,
    pub directory_name: String,
}

/// JSON part of an `addAdapter` multipart submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub unique_name: UniqueName,
    pub adapter_name: String,
    pub adapter_type: AdapterKind,
    pub settings: IndexMap<String, AdapterSetting>,
}

impl DeployRequest {
    /// Resolved value of a setting, if present.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.settings.get(name).map(|s| s.default_value.as_str())
    }

    /// `true` when the deploy method references a local path and needs the
    /// path-access handshake before submission.
    pub fn requires_path_access(&self) -> bool {
        self.value(SETTING_METHOD) == Some(METHOD_LINK)
    }
}
