//! The [`Toast`] model and its derived identity.

use chrono::Utc;
use polyadmin_core::result_set::{ResultException, ResultSet};
use polyadmin_core::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Title used when the caller supplies none.
    pub fn default_title(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Background class of the rendered toast.
    pub fn css_class(self) -> &'static str {
        match self {
            Severity::Success => "bg-success",
            Severity::Warning => "bg-warning",
            Severity::Error => "bg-danger",
        }
    }
}

/// How long a toast stays before it expires on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastDuration {
    /// Stays until dismissed.
    Infinite,
    /// A very short notice.
    Short,
    /// Default for success messages.
    Normal,
    /// Default for warnings and errors.
    Long,
}

impl ToastDuration {
    /// Expiry delay in seconds; `0` for [`ToastDuration::Infinite`].
    pub fn as_secs(self) -> u64 {
        match self {
            ToastDuration::Infinite => 0,
            ToastDuration::Short => 2,
            ToastDuration::Normal => 5,
            ToastDuration::Long => 10,
        }
    }
}

/// Identity of a toast in the store.
///
/// Derived from the creation time (second granularity) and the message
/// text, so two identical messages raised within the same second share a
/// key and the later one replaces the earlier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastKey(String);

impl ToastKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ToastKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ToastKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub generated_query: Option<String>,
    pub created_at: Timestamp,
    pub severity: Severity,
    pub exception: Option<ResultException>,
    /// Seconds until automatic removal; `0` keeps the toast until dismissed.
    pub delay_secs: u64,
}

impl Toast {
    /// A toast created now. An empty title falls back to the severity's
    /// default title. The toast does not expire unless a delay is set.
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            title: if title.is_empty() {
                severity.default_title().to_string()
            } else {
                title
            },
            message: message.into(),
            generated_query: None,
            created_at: Utc::now(),
            severity,
            exception: None,
            delay_secs: 0,
        }
    }

    /// Success toast with the default title, expiring after
    /// [`ToastDuration::Normal`].
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, "", message).with_duration(ToastDuration::Normal)
    }

    /// Warning toast for problems caught locally, expiring after
    /// [`ToastDuration::Long`].
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, "", message).with_duration(ToastDuration::Long)
    }

    /// Error toast for failures reaching the backend, expiring after
    /// [`ToastDuration::Long`].
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, "", message).with_duration(ToastDuration::Long)
    }

    /// Warning toast describing a failed [`ResultSet`].
    ///
    /// The message is `extra` followed by the result's error text, joined by
    /// a single space unless `extra` already ends in whitespace. The result's
    /// generated query and exception are carried along so the detail view
    /// can show the stack trace. Titled `error`, expiring after
    /// [`ToastDuration::Long`].
    pub fn from_result(result: &ResultSet, extra: Option<&str>) -> Self {
        let message = compose_message(extra, result.error_text());
        let mut toast = Self::new(Severity::Warning, Severity::Error.default_title(), message)
            .with_duration(ToastDuration::Long);
        toast.generated_query = result.generated_query.clone();
        toast.exception = result.exception.clone();
        toast
    }

    /// Replace the title. An empty title keeps the current one.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        if !title.is_empty() {
            self.title = title;
        }
        self
    }

    /// Attach the query the backend generated, if any.
    pub fn with_generated_query(mut self, query: Option<String>) -> Self {
        self.generated_query = query;
        self
    }

    /// Attach a backend exception for the detail view.
    pub fn with_exception(mut self, exception: ResultException) -> Self {
        self.exception = Some(exception);
        self
    }

    /// Expire after `duration`.
    pub fn with_duration(mut self, duration: ToastDuration) -> Self {
        self.delay_secs = duration.as_secs();
        self
    }

    pub fn with_delay_secs(mut self, secs: u64) -> Self {
        self.delay_secs = secs;
        self
    }

    /// Override the creation time (and with it the identity).
    pub fn created_at(mut self, at: Timestamp) -> Self {
        self.created_at = at;
        self
    }

    /// Creation time as `H:M:S` without zero padding.
    pub fn time_label(&self) -> String {
        self.created_at.format("%-H:%-M:%-S").to_string()
    }

    /// Store identity: [`time_label`](Self::time_label) followed by the
    /// message.
    pub fn key(&self) -> ToastKey {
        ToastKey(format!("{}{}", self.time_label(), self.message))
    }

    /// `true` when a stack trace can be shown.
    pub fn has_exception(&self) -> bool {
        self.exception.is_some()
    }

    /// Render class: severity background plus `exception` when a stack
    /// trace is available on click.
    pub fn css_class(&self) -> String {
        if self.has_exception() {
            format!("{} exception", self.severity.css_class())
        } else {
            self.severity.css_class().to_string()
        }
    }
}

fn compose_message(extra: Option<&str>, error: &str) -> String {
    match extra.filter(|e| !e.is_empty()) {
        Some(extra) if extra.ends_with(char::is_whitespace) => format!("{extra}{error}"),
        Some(extra) => format!("{extra} {error}"),
        None => error.to_string(),
    }
}
