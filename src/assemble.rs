//! Snapshot assembly: runs every phase in order and composes the result.
//!
//! Pipeline: sanitize → validate → resolve → extract → features → estimate.
//! Validation findings never abort the pipeline; only a broken post-condition
//! on the finished snapshot is returned as an error.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::analyze::features::{self, detect_features};
use crate::analyze::{estimate, Estimate};
use crate::config::AnalyzerConfig;
use crate::error::{AssemblyError, ValidationIssue};
use crate::extract::{extract, Parameters};
use crate::parse::{self, WorkflowGraph};
use crate::registry::NodeTypeRegistry;
use crate::resolve::{resolve, Connections};
use crate::snapshot::types::*;
use crate::validate::{validate_connections, validate_graph, ValidationReport};

/// Outcome of one analysis. `snapshot` is `None` only when the input never
/// became a graph (`P001`/`P002`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub validation: ValidationReport,
    pub snapshot: Option<MetadataSnapshot>,
}

impl Analysis {
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid
    }
}

pub struct MetadataAssembler<'r> {
    registry: &'r NodeTypeRegistry,
    config: AnalyzerConfig,
}

impl Default for MetadataAssembler<'static> {
    fn default() -> Self {
        Self::new(NodeTypeRegistry::builtin())
    }
}

impl<'r> MetadataAssembler<'r> {
    pub fn new(registry: &'r NodeTypeRegistry) -> Self {
        MetadataAssembler {
            registry,
            config: AnalyzerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Validation only: every issue [`assemble`](Self::assemble) would report,
    /// without building a snapshot.
    pub fn validate(&self, json: &str) -> ValidationReport {
        let sanitized = match parse::parse_and_sanitize(json) {
            Ok(s) => s,
            Err(issue) => return ValidationReport::fatal(issue),
        };
        let connections = resolve(&sanitized.graph, self.registry);
        self.report(&sanitized.graph, sanitized.warnings, &connections)
    }

    fn report(
        &self,
        graph: &WorkflowGraph,
        sanitizer_warnings: Vec<ValidationIssue>,
        connections: &Connections,
    ) -> ValidationReport {
        let mut report = validate_graph(graph, self.registry, &self.config.ranges);
        report.extend(sanitizer_warnings);
        report.extend(validate_connections(connections));
        report
    }

    pub fn assemble(&self, json: &str) -> Result<Analysis, AssemblyError> {
        self.assemble_named(json, None)
    }

    /// Same as [`assemble`](Self::assemble), recording `name` as the workflow name.
    pub fn assemble_named(&self, json: &str, name: Option<&str>) -> Result<Analysis, AssemblyError> {
        match parse::parse(json) {
            Ok(raw) => self.assemble_value(&raw, name),
            Err(issue) => Ok(fatal(issue)),
        }
    }

    pub fn assemble_value(&self, raw: &Value, name: Option<&str>) -> Result<Analysis, AssemblyError> {
        let sanitized = match parse::sanitize(raw) {
            Ok(s) => s,
            Err(issue) => return Ok(fatal(issue)),
        };
        let graph = sanitized.graph;
        let connections = resolve(&graph, self.registry);
        let validation = self.report(&graph, sanitized.warnings, &connections);

        tracing::debug!(
            nodes = graph.len(),
            edges = connections.len(),
            errors = validation.errors.len(),
            warnings = validation.warnings.len(),
            valid = validation.is_valid,
            "validated workflow"
        );

        let parameters = extract(&graph, &connections);
        let features = detect_features(&graph);
        let estimate = estimate(&graph, self.registry, &connections, &self.config.estimator);

        tracing::debug!(
            architecture = %parameters.architecture(),
            complexity = ?estimate.level,
            score = estimate.score,
            "estimated workflow cost"
        );

        let snapshot = self.build_snapshot(&graph, connections, parameters, features, estimate, name);
        if let Err(e) = verify(&snapshot) {
            tracing::error!(error = %e, "snapshot post-condition failed");
            return Err(e);
        }

        Ok(Analysis {
            validation,
            snapshot: Some(snapshot),
        })
    }

    fn build_snapshot(
        &self,
        graph: &WorkflowGraph,
        connections: Connections,
        parameters: Parameters,
        features: FeatureFlags,
        estimate: Estimate,
        name: Option<&str>,
    ) -> MetadataSnapshot {
        let architecture = parameters.architecture();
        let nodes = self.node_details(graph, &connections, &estimate);

        let workflow = WorkflowInfo {
            id: Uuid::new_v4(),
            name: name.map(str::to_string),
            tags: tags(architecture, &features),
            architecture,
            complexity: estimate.level,
            node_count: estimate.node_count,
            connection_count: estimate.connection_count,
            custom_node_count: estimate.custom_node_count,
            estimated_vram: estimate.vram_mb,
            estimated_execution_time: estimate.execution_time,
            features,
        };

        let performance = PerformanceInfo {
            total_nodes: estimate.node_count,
            processed_nodes: estimate.node_count,
            cached_nodes: 0,
            estimated_time: estimate.total_node_time,
            bottlenecks: estimate.bottlenecks,
        };

        MetadataSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            timestamp: Utc::now(),
            workflow,
            generation: parameters.generation,
            models: parameters.models,
            performance,
            nodes,
            relationships: connections.into_edges(),
        }
    }

    fn node_details(
        &self,
        graph: &WorkflowGraph,
        connections: &Connections,
        estimate: &Estimate,
    ) -> Vec<NodeDetail> {
        let view = connections.graph();
        // Without a valid topological order no node gets a position.
        let order: HashMap<&str, usize> = match view.find_cycle() {
            Some(_) => HashMap::new(),
            None => view
                .execution_order()
                .into_iter()
                .enumerate()
                .map(|(i, id)| (id, i))
                .collect(),
        };

        graph
            .iter()
            .map(|(id, node)| {
                let schema = self.registry.get(&node.class_type);
                let inputs: BTreeMap<String, Value> = node
                    .inputs
                    .iter()
                    .filter_map(|(k, v)| v.as_literal().map(|lit| (k.clone(), lit.clone())))
                    .collect();
                let cost = estimate.node_costs.get(id);

                NodeDetail {
                    id: id.to_string(),
                    class_type: node.class_type.clone(),
                    title: node.title.clone(),
                    category: schema.map_or_else(|| "custom".to_string(), |s| s.category.clone()),
                    is_custom: schema.is_none(),
                    inputs,
                    connected_inputs: node.connections().map(|(name, _)| name.to_string()).collect(),
                    upstream: view.upstream(id).into_iter().map(str::to_string).collect(),
                    downstream: view.downstream(id).into_iter().map(str::to_string).collect(),
                    execution_order: order.get(id).copied(),
                    estimated_time: cost.map_or(0.0, |c| c.time),
                    estimated_memory_mb: cost.map_or(0.0, |c| c.memory_mb),
                    position: node.position,
                    size: node.size,
                }
            })
            .collect()
    }
}

fn fatal(issue: ValidationIssue) -> Analysis {
    tracing::debug!(code = %issue.code, "workflow rejected before sanitization");
    Analysis {
        validation: ValidationReport::fatal(issue),
        snapshot: None,
    }
}

/// Lowercase architecture (unless unknown) followed by enabled feature tags.
fn tags(architecture: Architecture, flags: &FeatureFlags) -> Vec<String> {
    let mut tags = Vec::new();
    if architecture != Architecture::Unknown {
        tags.push(architecture.as_str().to_lowercase());
    }
    tags.extend(features::enabled(flags).iter().map(|f| f.tag().to_string()));
    tags
}

fn verify(snapshot: &MetadataSnapshot) -> Result<(), AssemblyError> {
    if snapshot.version.is_empty() {
        return Err(AssemblyError::MissingVersion);
    }
    if snapshot.timestamp.timestamp_millis() <= 0 {
        return Err(AssemblyError::MissingTimestamp);
    }
    Ok(())
}

/// Analyze workflow JSON with the builtin registry and default config.
pub fn analyze(json: &str) -> Result<Analysis, AssemblyError> {
    MetadataAssembler::default().assemble(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn snapshot(json: &str) -> MetadataSnapshot {
        analyze(json).unwrap().snapshot.unwrap()
    }

    #[test]
    fn syntax_error_has_no_snapshot() {
        let analysis = analyze("{not json").unwrap();
        assert!(analysis.snapshot.is_none());
        assert_eq!(analysis.validation.errors.len(), 1);
        assert_eq!(analysis.validation.errors[0].code, "P001");

        let analysis = analyze("[1, 2]").unwrap();
        assert!(analysis.snapshot.is_none());
        assert_eq!(analysis.validation.errors[0].code, "P002");
    }

    #[test]
    fn sanitizer_warnings_reach_the_report() {
        let analysis = analyze(r#"{"1": {"class_type": "KSampler", "inputs": {}}, "2": 5}"#).unwrap();
        assert!(analysis.validation.warnings.iter().any(|w| w.code == "P003"));
        assert_eq!(analysis.snapshot.unwrap().workflow.node_count, 1);
    }

    #[test]
    fn cycle_is_warning() {
        let json = r#"{"1": {"class_type": "A", "inputs": {"x": ["2", 0]}},
                       "2": {"class_type": "B", "inputs": {"x": ["1", 0]}}}"#;
        let analysis = analyze(json).unwrap();
        assert!(analysis.validation.warnings.iter().any(|w| w.code == "S004"));
        assert_eq!(MetadataAssembler::default().validate(json), analysis.validation);
        let snap = analysis.snapshot.unwrap();
        assert!(snap.nodes.iter().all(|n| n.execution_order.is_none()));
    }

    #[test]
    fn validate_reports_fatal_input() {
        let report = MetadataAssembler::default().validate("[1, 2]");
        assert!(!report.is_valid);
        assert_eq!(report.errors[0].code, "P002");
    }

    #[test]
    fn tags_follow_architecture_and_features() {
        let snap = snapshot(
            r#"{"1": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "sdxl_base.safetensors"}},
                "2": {"class_type": "LoraLoader", "inputs": {"lora_name": "x.safetensors", "model": ["1", 0], "clip": ["1", 1]}}}"#,
        );
        assert_eq!(snap.workflow.tags, vec!["sdxl", "lora"]);
    }

    #[test]
    fn node_details_split_literals_and_connections() {
        let snap = snapshot(
            r#"{"1": {"class_type": "CheckpointLoaderSimple", "inputs": {"ckpt_name": "m.safetensors"}},
                "2": {"class_type": "CLIPTextEncode", "inputs": {"text": "hi", "clip": ["1", 1]},
                      "_meta": {"title": "Prompt"}},
                "3": {"class_type": "Mystery", "inputs": {}}}"#,
        );
        let enc = &snap.nodes[1];
        assert_eq!(enc.title.as_deref(), Some("Prompt"));
        assert_eq!(enc.connected_inputs, vec!["clip"]);
        assert_eq!(enc.inputs.len(), 1);
        assert_eq!(enc.upstream, vec!["1"]);
        assert_eq!(enc.execution_order, Some(1));
        assert_eq!(snap.nodes[0].downstream, vec!["2"]);
        assert!(snap.nodes[2].is_custom);
        assert_eq!(snap.nodes[2].category, "custom");
    }

    #[test]
    fn named_workflow() {
        let analysis = MetadataAssembler::default()
            .assemble_named(r#"{"1": {"class_type": "KSampler", "inputs": {}}}"#, Some("portrait"))
            .unwrap();
        assert_eq!(analysis.snapshot.unwrap().workflow.name.as_deref(), Some("portrait"));
    }

    #[test]
    fn verify_rejects_broken_snapshot() {
        let mut snap = snapshot(r#"{"1": {"class_type": "KSampler", "inputs": {}}}"#);
        assert!(verify(&snap).is_ok());

        snap.timestamp = DateTime::from_timestamp(0, 0).unwrap();
        assert!(matches!(verify(&snap), Err(AssemblyError::MissingTimestamp)));

        snap.version.clear();
        assert!(matches!(verify(&snap), Err(AssemblyError::MissingVersion)));
    }
}
