//! Tunable thresholds for validation heuristics and cost estimates.
//!
//! Every field has a default, so a partial JSON document only overrides the
//! values it names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    pub ranges: ValueRanges,
    pub estimator: EstimatorConfig,
}

impl AnalyzerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AnalyzerConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let r = &self.ranges;
        if r.steps.min > r.steps.max || r.cfg.min > r.cfg.max || r.batch_size.min > r.batch_size.max
        {
            return Err(ConfigError::Invalid("range minimum exceeds maximum".into()));
        }
        if r.dimension_multiple == 0 {
            return Err(ConfigError::Invalid("dimensionMultiple must be positive".into()));
        }
        if r.dimension.min > r.dimension.max {
            return Err(ConfigError::Invalid("dimension minimum exceeds maximum".into()));
        }
        Ok(())
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Bounds { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Plausible-value ranges checked by the validator. Values outside a range
/// only produce warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValueRanges {
    pub steps: Bounds,
    pub cfg: Bounds,
    pub dimension: Bounds,
    pub dimension_multiple: u64,
    pub batch_size: Bounds,
    pub checkpoint_extensions: Vec<String>,
}

impl Default for ValueRanges {
    fn default() -> Self {
        ValueRanges {
            steps: Bounds::new(1.0, 1000.0),
            cfg: Bounds::new(1.0, 30.0),
            dimension: Bounds::new(64.0, 4096.0),
            dimension_multiple: 8,
            batch_size: Bounds::new(1.0, 10.0),
            checkpoint_extensions: vec![".safetensors".into(), ".ckpt".into()],
        }
    }
}

/// Constants of the linear cost model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EstimatorConfig {
    /// Fixed overhead of a run, in seconds.
    pub base_time: f64,
    /// Added per node to the workflow-level execution time.
    pub time_per_node: f64,
    /// Per-node estimate for anything that is not a sampler.
    pub default_node_time: f64,
    pub time_per_step: f64,
    /// Steps assumed for a sampler whose `steps` input is not a literal.
    pub default_steps: f64,
    pub bottleneck_threshold: f64,
    pub default_memory_mb: f64,
    /// Memory estimates keyed by exact class type.
    pub memory_mb: BTreeMap<String, f64>,
    /// Memory estimate applied to sampler-family types absent from `memory_mb`.
    pub sampler_memory_mb: f64,
    /// Same, for checkpoint/UNet loaders.
    pub checkpoint_memory_mb: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        let memory_mb = [
            ("CheckpointLoaderSimple", 2000.0),
            ("CheckpointLoader", 2000.0),
            ("KSampler", 1500.0),
            ("KSamplerAdvanced", 1500.0),
            ("ControlNetApply", 800.0),
            ("ControlNetApplyAdvanced", 800.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        EstimatorConfig {
            base_time: 30.0,
            time_per_node: 2.0,
            default_node_time: 5.0,
            time_per_step: 0.5,
            default_steps: 20.0,
            bottleneck_threshold: 15.0,
            default_memory_mb: 100.0,
            memory_mb,
            sampler_memory_mb: 1500.0,
            checkpoint_memory_mb: 2000.0,
        }
    }
}
