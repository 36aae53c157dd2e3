//! Static analysis of node-graph image-generation workflows.
//!
//! Takes workflow JSON (node id → `{ class_type, inputs }`), validates it and
//! assembles a [`MetadataSnapshot`] describing models, sampling parameters,
//! features and cost estimates.

pub mod analyze;
pub mod assemble;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod parse;
pub mod registry;
pub mod resolve;
pub mod snapshot;
pub mod validate;
pub mod wasm;

pub use assemble::{analyze, Analysis, MetadataAssembler};
pub use config::AnalyzerConfig;
pub use error::{AssemblyError, ConfigError, IssueKind, Severity, ValidationIssue};
pub use registry::{NodeTypeRegistry, NodeTypeSchema};
pub use snapshot::MetadataSnapshot;
pub use validate::ValidationReport;
