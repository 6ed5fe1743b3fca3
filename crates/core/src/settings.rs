//! Deployment settings reconciliation.
//!
//! An adapter type declares its settings grouped by deployment mode plus a
//! `default` group shared by every mode. [`DeployForms::reconcile`] turns
//! that schema into one [`SettingsForm`] per mode, each holding the mode's
//! own settings extended by the `default` group. A `default` setting with
//! the same name as a mode setting replaces it in place.

use indexmap::IndexMap;

use crate::adapter::{AdapterInformation, AdapterSetting, ModeKey};
use crate::deploy::FileAttachment;
use crate::error::CoreError;

/// Current value of a form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Files(Vec<FileAttachment>),
}

/// One editable field bound to its setting descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub setting: AdapterSetting,
    pub value: FieldValue,
}

impl FormField {
    /// A field holding the setting's initial value (no files for uploads).
    pub fn new(setting: AdapterSetting) -> Self {
        let value = if setting.is_file() {
            FieldValue::Files(Vec::new())
        } else {
            FieldValue::Text(setting.initial_value())
        };
        Self { setting, value }
    }

    /// Text value, or `None` for file fields.
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Text(text) => Some(text),
            FieldValue::Files(_) => None,
        }
    }

    /// Required text fields must be non-empty; file fields always pass.
    pub fn is_valid(&self) -> bool {
        match &self.value {
            FieldValue::Text(text) => !self.setting.required || !text.trim().is_empty(),
            FieldValue::Files(_) => true,
        }
    }
}

/// The settings form of one deployment mode.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    mode: String,
    fields: IndexMap<String, FormField>,
}

impl SettingsForm {
    fn from_settings<'a>(mode: &str, settings: impl IntoIterator<Item = &'a AdapterSetting>) -> Self {
        let mut fields = IndexMap::new();
        for setting in settings {
            // IndexMap keeps the original slot when a key is re-inserted.
            fields.insert(setting.name.clone(), FormField::new(setting.clone()));
        }
        Self {
            mode: mode.to_string(),
            fields,
        }
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn fields(&self) -> &IndexMap<String, FormField> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.get(name)
    }

    /// Setting names in the form.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields sorted by their display position; ties keep form order.
    pub fn ordered_fields(&self) -> Vec<&FormField> {
        let mut fields: Vec<_> = self.fields.values().collect();
        fields.sort_by_key(|f| f.setting.position);
        fields
    }

    /// Replace the text value of a non-file field.
    pub fn set_text(&mut self, name: &str, value: impl Into<String>) -> Result<(), CoreError> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| CoreError::UnknownSetting(name.to_string()))?;
        if field.setting.is_file() {
            return Err(CoreError::Validation(format!(
                "setting `{name}` expects files"
            )));
        }
        field.value = FieldValue::Text(value.into());
        Ok(())
    }

    /// Replace the attachments of a file field. An empty list clears it.
    pub fn attach_files(&mut self, name: &str, files: Vec<FileAttachment>) -> Result<(), CoreError> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| CoreError::UnknownSetting(name.to_string()))?;
        if !field.setting.is_file() {
            return Err(CoreError::Validation(format!(
                "setting `{name}` does not accept files"
            )));
        }
        field.value = FieldValue::Files(files);
        Ok(())
    }

    /// Label for the file picker: attached names joined, or the prompt.
    pub fn file_label(&self, name: &str) -> String {
        match self.fields.get(name).map(|f| &f.value) {
            Some(FieldValue::Files(files)) if !files.is_empty() => files
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            _ => "Choose File".to_string(),
        }
    }

    /// Whether a field is shown given the current values of the form.
    ///
    /// A field with `subOf = "<key>_<value>"` is visible only while field
    /// `key` holds `value`. Fields without a condition are always visible.
    pub fn is_visible(&self, name: &str) -> bool {
        let Some(field) = self.fields.get(name) else {
            return false;
        };
        let Some(sub_of) = field.setting.sub_of.as_deref().filter(|s| !s.is_empty()) else {
            return true;
        };
        let Some((key, expected)) = sub_of.split_once('_') else {
            return false;
        };
        self.fields
            .get(key)
            .and_then(FormField::text)
            .is_some_and(|current| current == expected)
    }

    /// Names of visible fields that fail validation.
    pub fn invalid_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(name, field)| self.is_visible(name) && !field.is_valid())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_fields().is_empty()
    }
}

/// Per-mode settings forms of an adapter type being deployed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployForms {
    adapter: AdapterInformation,
    forms: IndexMap<String, SettingsForm>,
    active: Option<String>,
}

impl DeployForms {
    /// Build one form per deployment mode of `adapter`.
    ///
    /// - No named modes: a single `default` form (possibly empty) is active.
    /// - Exactly one named mode: its form is pre-selected.
    /// - Several named modes: nothing is active until [`set_mode`](Self::set_mode).
    pub fn reconcile(adapter: &AdapterInformation) -> Self {
        let schema = &adapter.adapter_settings;
        let defaults = schema.group(&ModeKey::Default).unwrap_or_default();
        let modes = schema.named_modes();

        let mut forms = IndexMap::new();
        let active = match modes.as_slice() {
            [] => {
                let key = ModeKey::Default.as_str();
                forms.insert(key.to_string(), SettingsForm::from_settings(key, defaults));
                Some(key.to_string())
            }
            _ => {
                for mode in &modes {
                    let own = schema
                        .group(&ModeKey::Named(mode.to_string()))
                        .unwrap_or_default();
                    let form = SettingsForm::from_settings(mode, own.iter().chain(defaults));
                    forms.insert(mode.to_string(), form);
                }
                match modes.as_slice() {
                    [only] => Some(only.to_string()),
                    _ => None,
                }
            }
        };

        Self {
            adapter: adapter.clone(),
            forms,
            active,
        }
    }

    pub fn adapter(&self) -> &AdapterInformation {
        &self.adapter
    }

    /// Mode names offered to the operator.
    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }

    pub fn form(&self, mode: &str) -> Option<&SettingsForm> {
        self.forms.get(mode)
    }

    pub fn active_mode(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_form(&self) -> Option<&SettingsForm> {
        self.active.as_deref().and_then(|m| self.forms.get(m))
    }

    pub fn active_form_mut(&mut self) -> Option<&mut SettingsForm> {
        match self.active.as_deref() {
            Some(mode) => self.forms.get_mut(mode),
            None => None,
        }
    }

    /// Switch the active deployment mode.
    pub fn set_mode(&mut self, mode: &str) -> Result<(), CoreError> {
        if !self.forms.contains_key(mode) {
            return Err(CoreError::UnknownMode(mode.to_string()));
        }
        self.active = Some(mode.to_string());
        Ok(())
    }
}
