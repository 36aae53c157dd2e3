//! Issue taxonomy shared by every phase, plus the fatal assembly errors.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Syntax,
    Structure,
    Node,
    Connection,
    Schema,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueKind::Syntax => write!(f, "Syntax"),
            IssueKind::Structure => write!(f, "Structure"),
            IssueKind::Node => write!(f, "Node"),
            IssueKind::Connection => write!(f, "Connection"),
            IssueKind::Schema => write!(f, "Schema"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single finding from sanitization or validation.
///
/// Issues are collected, never raised: a workflow with errors still gets a
/// snapshot, just with degraded fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub code: String,
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    pub node_id: Option<String>,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(
                f,
                "[{}:{}] {} (node '{}')",
                self.kind, self.code, self.message, id
            ),
            None => write!(f, "[{}:{}] {}", self.kind, self.code, self.message),
        }
    }
}

impl ValidationIssue {
    fn new(
        code: &str,
        kind: IssueKind,
        severity: Severity,
        message: impl Into<String>,
        node_id: Option<String>,
    ) -> Self {
        ValidationIssue {
            code: code.into(),
            kind,
            severity,
            message: message.into(),
            node_id,
        }
    }

    pub fn syntax(code: &str, message: impl Into<String>) -> Self {
        Self::new(code, IssueKind::Syntax, Severity::Error, message, None)
    }

    pub fn structure(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::new(code, IssueKind::Structure, Severity::Error, message, node_id)
    }

    pub fn node(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::new(code, IssueKind::Node, Severity::Error, message, node_id)
    }

    pub fn connection(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::new(code, IssueKind::Connection, Severity::Error, message, node_id)
    }

    pub fn schema(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::new(code, IssueKind::Schema, Severity::Error, message, node_id)
    }

    /// Downgrade to a warning. Warnings never affect validity.
    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Post-condition failures of snapshot assembly. These signal a bug in the
/// engine, never a problem with the submitted workflow.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("snapshot was assembled without a version")]
    MissingVersion,
    #[error("snapshot was assembled without a valid timestamp")]
    MissingTimestamp,
}

/// Failure to load an [`AnalyzerConfig`](crate::config::AnalyzerConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse analyzer config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid analyzer config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_node() {
        let issue = ValidationIssue::connection("C001", "dangling", Some("7".into()));
        assert_eq!(issue.to_string(), "[Connection:C001] dangling (node '7')");
    }

    #[test]
    fn warning_downgrades_severity() {
        let issue = ValidationIssue::schema("V002", "unknown type", None).warning();
        assert!(!issue.is_error());
        assert_eq!(issue.kind, IssueKind::Schema);
    }
}
