//! WASM entry points for browser use.

use wasm_bindgen::prelude::*;

use crate::assemble::MetadataAssembler;
use crate::error::ValidationIssue;
use crate::snapshot::MetadataSnapshot;
use crate::validate::ValidationReport;

/// Validate a workflow JSON without building a snapshot.
/// Returns a JSON array of issues, errors first.
#[wasm_bindgen]
pub fn validate_workflow(json: &str) -> JsValue {
    let result = validate_workflow_inner(json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_workflow_inner(json: &str) -> Vec<IssueDto> {
    let report = MetadataAssembler::default().validate(json);
    report.issues().cloned().map(IssueDto::from).collect()
}

/// Full pipeline: parse → validate → resolve → extract → estimate.
/// Returns a JSON object with either `validation` + `snapshot` (success) or
/// `errors` (the input could not be analyzed).
#[wasm_bindgen]
pub fn analyze_workflow(json: &str) -> JsValue {
    let result = analyze_workflow_inner(json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn analyze_workflow_inner(json: &str) -> AnalyzeResult {
    let analysis = match MetadataAssembler::default().assemble(json) {
        Ok(a) => a,
        Err(e) => {
            return AnalyzeResult::Errors {
                errors: vec![IssueDto {
                    code: "A001".into(),
                    kind: "assembly".into(),
                    severity: "error".into(),
                    message: e.to_string(),
                    node_id: None,
                }],
            };
        }
    };

    match analysis.snapshot {
        Some(snapshot) => AnalyzeResult::Success {
            validation: analysis.validation,
            snapshot: Box::new(snapshot),
        },
        None => AnalyzeResult::Errors {
            errors: analysis
                .validation
                .errors
                .into_iter()
                .map(IssueDto::from)
                .collect(),
        },
    }
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueDto {
    code: String,
    kind: String,
    severity: String,
    message: String,
    node_id: Option<String>,
}

impl From<ValidationIssue> for IssueDto {
    fn from(e: ValidationIssue) -> Self {
        let severity = if e.is_error() { "error" } else { "warning" };
        IssueDto {
            code: e.code,
            kind: e.kind.to_string().to_lowercase(),
            severity: severity.into(),
            message: e.message,
            node_id: e.node_id,
        }
    }
}

#[derive(serde::Serialize)]
#[serde(tag = "status")]
enum AnalyzeResult {
    #[serde(rename = "success")]
    Success {
        validation: ValidationReport,
        snapshot: Box<MetadataSnapshot>,
    },
    #[serde(rename = "errors")]
    Errors { errors: Vec<IssueDto> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_lists_errors_before_warnings() {
        let issues = validate_workflow_inner(
            r#"{"a": {"class_type": "KSampler", "inputs": {"model": ["9", 0]}}}"#,
        );
        let first_warning = issues.iter().position(|i| i.severity == "warning").unwrap();
        assert!(issues[..first_warning].iter().all(|i| i.severity == "error"));
        assert!(issues.iter().any(|i| i.code == "C001" && i.kind == "connection"));
        assert!(issues.iter().any(|i| i.code == "S002"));
    }

    #[test]
    fn validate_reports_cycles_like_analyze() {
        let json = r#"{"1": {"class_type": "A", "inputs": {"x": ["2", 0]}},
                       "2": {"class_type": "B", "inputs": {"x": ["1", 0]}}}"#;
        let issues = validate_workflow_inner(json);
        assert!(issues.iter().any(|i| i.code == "S004" && i.severity == "warning"));

        let AnalyzeResult::Success { validation, .. } = analyze_workflow_inner(json) else {
            panic!("expected a snapshot");
        };
        let analyzed: Vec<_> = validation.issues().map(|i| i.code.clone()).collect();
        let validated: Vec<_> = issues.iter().map(|i| i.code.clone()).collect();
        assert_eq!(analyzed, validated);
    }

    #[test]
    fn issue_dto_keeps_severity() {
        let warning = IssueDto::from(ValidationIssue::schema("V002", "unknown", Some("4".into())).warning());
        assert_eq!(warning.severity, "warning");
        assert_eq!(warning.kind, "schema");
        assert_eq!(warning.node_id.as_deref(), Some("4"));

        let error = IssueDto::from(ValidationIssue::connection("C001", "dangling", None));
        assert_eq!(error.severity, "error");
        assert_eq!(error.code, "C001");
    }

    #[test]
    fn analyze_reports_syntax_errors() {
        let result = analyze_workflow_inner("nope");
        match result {
            AnalyzeResult::Errors { errors } => assert_eq!(errors[0].code, "P001"),
            AnalyzeResult::Success { .. } => panic!("expected errors"),
        }
    }

    #[test]
    fn analyze_success_serializes_with_status_tag() {
        let result = analyze_workflow_inner(r#"{"1": {"class_type": "KSampler", "inputs": {}}}"#);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["snapshot"]["workflow"]["nodeCount"], 1);
        assert_eq!(value["validation"]["isValid"], false);
    }
}
