//! Deploy payload assembly.
//!
//! Turns the active [`SettingsForm`](crate::settings::SettingsForm) of a
//! [`DeployForms`] into a [`StagedDeploy`]: the JSON [`DeployRequest`] plus
//! the binary attachments that travel next to it in the multipart body.

use indexmap::IndexMap;

use crate::adapter::{
    AdapterSetting, DeployRequest, ModeKey, SETTING_ACCESS, SETTING_DIRECTORY_NAME, SETTING_MODE,
};
use crate::error::CoreError;
use crate::settings::{DeployForms, FieldValue};

/// A file chosen for an upload setting.
#[derive(Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for FileAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAttachment")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A deployment ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedDeploy {
    pub request: DeployRequest,
    pub files: Vec<FileAttachment>,
}

impl StagedDeploy {
    /// Assemble the deployment of the active mode of `forms` under
    /// `unique_name`.
    ///
    /// File fields record their attachment names in the descriptor and stage
    /// the binaries; other fields resolve the descriptor's value from the
    /// form. A `mode` setting carrying the active mode name is always
    /// appended.
    pub fn assemble(forms: &DeployForms, unique_name: &str) -> Result<Self, CoreError> {
        let mode = forms.active_mode().ok_or(CoreError::NoActiveMode)?;
        let form = forms.active_form().ok_or(CoreError::NoActiveMode)?;
        let adapter = forms.adapter();

        let mut settings = IndexMap::new();
        let mut files = Vec::new();

        for (name, field) in form.fields() {
            let mut setting = field.setting.clone();
            match &field.value {
                FieldValue::Files(attachments) => {
                    setting.file_names =
                        Some(attachments.iter().map(|f| f.name.clone()).collect());
                    files.extend(attachments.iter().cloned());
                }
                FieldValue::Text(text) => setting.default_value = text.clone(),
            }
            settings.insert(name.clone(), setting);
        }

        let mut mode_setting = adapter
            .adapter_settings
            .group(&ModeKey::Selector)
            .and_then(|group| group.first().cloned())
            .unwrap_or_else(|| AdapterSetting::text(SETTING_MODE, ""));
        mode_setting.default_value = mode.to_string();
        settings.insert(SETTING_MODE.to_string(), mode_setting);

        Ok(Self {
            request: DeployRequest {
                unique_name: unique_name.to_string(),
                adapter_name: adapter.name.clone(),
                adapter_type: adapter.kind,
                settings,
            },
            files,
        })
    }

    pub fn unique_name(&self) -> &str {
        &self.request.unique_name
    }

    /// Directory referenced by a `link` deployment, or empty.
    pub fn directory_name(&self) -> &str {
        self.request.value(SETTING_DIRECTORY_NAME).unwrap_or_default()
    }

    /// Record the path-access token granted for a secure deployment.
    pub fn set_access(&mut self, token: &str) {
        self.request.settings.insert(
            SETTING_ACCESS.to_string(),
            AdapterSetting::text(SETTING_ACCESS, token),
        );
    }

    /// JSON text of the request, sent as the multipart `body` part.
    pub fn body_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(&self.request).map_err(|e| CoreError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{AdapterInformation, AdapterKind, SettingGroup, SettingSchema};
    use assert_matches::assert_matches;

    fn csv_adapter() -> AdapterInformation {
        let mut upload = AdapterSetting::text("directory", "");
        upload.file_names = Some(vec![]);
        let mut method = AdapterSetting::text("method", "upload");
        method.options = Some(vec!["upload".into(), "link".into()]);

        AdapterInformation {
            name: "CSV".into(),
            kind: AdapterKind::Source,
            adapter_settings: SettingSchema::new(vec![
                SettingGroup {
                    mode: ModeKey::Selector,
                    settings: vec![AdapterSetting::text("mode", "embedded")],
                },
                SettingGroup {
                    mode: ModeKey::Named("embedded".into()),
                    settings: vec![method, upload],
                },
                SettingGroup {
                    mode: ModeKey::Default,
                    settings: vec![AdapterSetting::text("maxStringLength", "255")],
                },
            ]),
        }
    }

    #[test]
    fn assembles_values_files_and_mode() {
        let mut forms = DeployForms::reconcile(&csv_adapter());
        forms
            .active_form_mut()
            .unwrap()
            .attach_files(
                "directory",
                vec![
                    FileAttachment::new("a.csv", b"x,y".to_vec()),
                    FileAttachment::new("b.csv", b"1,2".to_vec()),
                ],
            )
            .unwrap();

        let staged = StagedDeploy::assemble(&forms, "csv1").unwrap();
        let request = &staged.request;

        assert_eq!(request.unique_name, "csv1");
        assert_eq!(request.adapter_name, "CSV");
        assert_eq!(request.adapter_type, AdapterKind::Source);
        assert_eq!(request.value("method"), Some("upload"));
        assert_eq!(request.value("maxStringLength"), Some("255"));
        assert_eq!(request.value("mode"), Some("embedded"));
        assert_eq!(
            request.settings["directory"].file_names,
            Some(vec!["a.csv".to_string(), "b.csv".to_string()])
        );
        assert_eq!(staged.files.len(), 2);
        assert_eq!(request.settings.keys().last().map(String::as_str), Some("mode"));
    }

    #[test]
    fn requires_active_mode() {
        let mut info = csv_adapter();
        let mut groups = info.adapter_settings.groups().to_vec();
        groups.push(SettingGroup {
            mode: ModeKey::Named("docker".into()),
            settings: vec![],
        });
        info.adapter_settings = SettingSchema::new(groups);

        let forms = DeployForms::reconcile(&info);
        assert_matches!(
            StagedDeploy::assemble(&forms, "csv1"),
            Err(CoreError::NoActiveMode)
        );
    }

    #[test]
    fn synthesizes_mode_setting_when_schema_has_none() {
        let info = AdapterInformation {
            name: "HSQLDB".into(),
            kind: AdapterKind::Store,
            adapter_settings: SettingSchema::new(vec![SettingGroup {
                mode: ModeKey::Default,
                settings: vec![AdapterSetting::text("type", "Memory")],
            }]),
        };
        let forms = DeployForms::reconcile(&info);
        let staged = StagedDeploy::assemble(&forms, "hsqldb1").unwrap();
        assert_eq!(staged.request.value("mode"), Some("default"));
    }

    #[test]
    fn access_token_lands_in_body() {
        let mut forms = DeployForms::reconcile(&csv_adapter());
        forms
            .active_form_mut()
            .unwrap()
            .set_text("method", "link")
            .unwrap();
        let mut staged = StagedDeploy::assemble(&forms, "csv1").unwrap();
        assert!(staged.request.requires_path_access());

        staged.set_access("token-123");
        let body: serde_json::Value = serde_json::from_str(&staged.body_json().unwrap()).unwrap();
        assert_eq!(body["uniqueName"], "csv1");
        assert_eq!(body["adapterType"], "SOURCE");
        assert_eq!(body["settings"]["access"]["defaultValue"], "token-123");
    }
}
