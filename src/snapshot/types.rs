//! Snapshot type definitions.
//!
//! A [`MetadataSnapshot`] is the read-only summary handed to rendering,
//! search and preset collaborators. It is built once per parse and never
//! mutated afterward. Field names serialize in camelCase.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::parse::types::{Position, Size};
use crate::resolve::RelationshipEdge;

pub const SNAPSHOT_VERSION: &str = "1.0.0";

// =============================================================================
// TOP-LEVEL SNAPSHOT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSnapshot {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub workflow: WorkflowInfo,
    pub generation: GenerationInfo,
    pub models: ModelStack,
    pub performance: PerformanceInfo,
    pub nodes: Vec<NodeDetail>,
    pub relationships: Vec<RelationshipEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInfo {
    pub id: Uuid,
    pub name: Option<String>,
    pub tags: Vec<String>,
    pub architecture: Architecture,
    pub complexity: ComplexityLevel,
    pub node_count: usize,
    pub connection_count: usize,
    pub custom_node_count: usize,
    /// Sum of per-node memory estimates, in MB.
    #[serde(rename = "estimatedVRAM")]
    pub estimated_vram: f64,
    /// Seconds.
    pub estimated_execution_time: f64,
    pub features: FeatureFlags,
}

/// Target model family inferred from the checkpoint filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "SD1.5")]
    Sd15,
    #[serde(rename = "SDXL")]
    Sdxl,
    #[serde(rename = "SD3")]
    Sd3,
    Flux,
    Unknown,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Sd15 => "SD1.5",
            Architecture::Sdxl => "SDXL",
            Architecture::Sd3 => "SD3",
            Architecture::Flux => "Flux",
            Architecture::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub image_to_image: bool,
    pub control_net: bool,
    pub lora: bool,
    pub embeddings: bool,
    pub upscaling: bool,
    pub inpainting: bool,
    pub face_restore: bool,
    pub animation: bool,
    pub ip_adapter: bool,
    pub regional_prompting: bool,
    pub batch_processing: bool,
    pub custom_samplers: bool,
}

// =============================================================================
// GENERATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationInfo {
    /// Seed of the first sampler, if it is a literal.
    pub seed: Option<i64>,
    /// Sum of `steps` across every sampler.
    pub total_steps: u64,
    pub sampler_chain: Vec<SamplerEntry>,
    pub prompt_embeddings: Vec<PromptEmbedding>,
    /// cfg of the first sampler, 0 when absent.
    pub guidance_scale: f64,
    /// Strength of the first ControlNet, 1 when there is none.
    pub conditioning_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplerEntry {
    pub node_id: String,
    pub class_type: String,
    pub sampler_name: Option<String>,
    pub scheduler: Option<String>,
    pub steps: Option<u64>,
    pub cfg: Option<f64>,
    pub denoise: f64,
    pub seed: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptEmbedding {
    pub node_id: String,
    #[serde(rename = "type")]
    pub kind: PromptKind,
    pub text: String,
}

// =============================================================================
// MODELS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStack {
    pub checkpoint: Option<CheckpointInfo>,
    pub vae: Option<VaeInfo>,
    pub loras: Vec<LoraInfo>,
    /// Textual-inversion names referenced as `embedding:<name>` in prompts.
    pub embeddings: Vec<String>,
    pub controlnets: Vec<ControlNetInfo>,
    pub upscalers: Vec<UpscalerInfo>,
    pub face_restorers: Vec<FaceRestorerInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointInfo {
    pub node_id: String,
    pub name: String,
    pub architecture: Architecture,
    pub base_model: String,
    pub hash: Option<String>,
    pub clip_skip: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaeInfo {
    pub node_id: String,
    pub name: String,
    pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoraInfo {
    pub node_id: String,
    pub name: String,
    pub model_strength: f64,
    pub clip_strength: f64,
    pub trigger_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlNetInfo {
    pub node_id: String,
    pub model: Option<String>,
    pub strength: f64,
    pub start_percent: f64,
    pub end_percent: f64,
    pub preprocessor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpscalerInfo {
    pub node_id: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceRestorerInfo {
    pub node_id: String,
    pub class_type: String,
    pub model: Option<String>,
}

// =============================================================================
// PERFORMANCE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInfo {
    pub total_nodes: usize,
    pub processed_nodes: usize,
    pub cached_nodes: usize,
    /// Sum of per-node time estimates, in seconds.
    pub estimated_time: f64,
    pub bottlenecks: Vec<Bottleneck>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    pub node_id: String,
    pub class_type: String,
    pub estimated_time: f64,
    pub reason: String,
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetail {
    pub id: String,
    pub class_type: String,
    pub title: Option<String>,
    /// Schema category, or `"custom"` for unregistered types.
    pub category: String,
    pub is_custom: bool,
    /// Literal input values only; connected inputs are listed separately.
    pub inputs: BTreeMap<String, serde_json::Value>,
    pub connected_inputs: Vec<String>,
    pub upstream: Vec<String>,
    pub downstream: Vec<String>,
    pub execution_order: Option<usize>,
    pub estimated_time: f64,
    pub estimated_memory_mb: f64,
    pub position: Option<Position>,
    pub size: Option<Size>,
}
