//! The `ResultSet` envelope returned by every mutating backend call.
//!
//! Only the fields the console engines act on are modelled: the error
//! string, the generated query echoed back for copy-to-clipboard, and the
//! optional structured exception with its stack trace.

use serde::{Deserialize, Serialize};

/// Outcome of a backend operation.
///
/// A populated [`error`](Self::error) marks an application-level failure;
/// everything else is a success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub generated_query: Option<String>,
    #[serde(default)]
    pub exception: Option<ResultException>,
    #[serde(default)]
    pub affected_rows: Option<i64>,
}

impl ResultSet {
    /// A successful result carrying the query the backend generated.
    pub fn success(generated_query: impl Into<String>) -> Self {
        Self {
            generated_query: Some(generated_query.into()),
            ..Default::default()
        }
    }

    /// A failed result with the given error text.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Attach a structured exception to the result.
    pub fn with_exception(mut self, exception: ResultException) -> Self {
        self.exception = Some(exception);
        self
    }

    /// `true` when the backend reported an application error.
    ///
    /// An empty error string counts as no error.
    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// The error text, or an empty string when none is set.
    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or_default()
    }
}

/// Server-side exception attached to a failed [`ResultSet`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultException {
    #[serde(default)]
    pub detail_message: String,
    #[serde(default)]
    pub stack_trace: Vec<StackFrame>,
}

/// One frame of a [`ResultException`] stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub declaring_class: String,
    pub method_name: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub line_number: i32,
}

impl ResultException {
    /// Render the stack trace one frame per line, innermost first.
    ///
    /// Used by the exception detail view.
    pub fn stack_trace_lines(&self) -> Vec<String> {
        self.stack_trace.iter().map(StackFrame::to_string).collect()
    }
}

impl std::fmt::Display for StackFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let file = self.file_name.as_deref().unwrap_or("Unknown Source");
        if self.line_number >= 0 {
            write!(
                f,
                "at {}.{}({}:{})",
                self.declaring_class, self.method_name, file, self.line_number
            )
        } else {
            write!(f, "at {}.{}({})", self.declaring_class, self.method_name, file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_envelope() {
        let json = r#"{
            "error": "Table already exists",
            "generatedQuery": "CREATE TABLE t (a INTEGER)",
            "exception": {
                "detailMessage": "duplicate",
                "stackTrace": [
                    {"declaringClass": "org.db.Ddl", "methodName": "create", "fileName": "Ddl.java", "lineNumber": 42}
                ]
            }
        }"#;

        let result: ResultSet = serde_json::from_str(json).unwrap();
        assert!(result.is_error());
        assert_eq!(result.error_text(), "Table already exists");
        let exception = result.exception.unwrap();
        assert_eq!(exception.stack_trace.len(), 1);
        assert_eq!(exception.stack_trace[0].line_number, 42);
    }

    #[test]
    fn empty_error_is_not_an_error() {
        let result = ResultSet::failure("");
        assert!(!result.is_error());
    }

    #[test]
    fn stack_trace_lines_render_java_style() {
        let exception = ResultException {
            detail_message: "boom".into(),
            stack_trace: vec![
                StackFrame {
                    declaring_class: "org.db.Ddl".into(),
                    method_name: "create".into(),
                    file_name: Some("Ddl.java".into()),
                    line_number: 42,
                },
                StackFrame {
                    declaring_class: "jdk.Native".into(),
                    method_name: "invoke0".into(),
                    file_name: None,
                    line_number: -2,
                },
            ],
        };

        assert_eq!(
            exception.stack_trace_lines(),
            vec![
                "at org.db.Ddl.create(Ddl.java:42)".to_string(),
                "at jdk.Native.invoke0(Unknown Source)".to_string(),
            ]
        );
    }
}
