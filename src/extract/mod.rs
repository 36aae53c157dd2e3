//! Extraction phase: resolved graph → model stack and generation parameters.
//!
//! Extraction never fails. Missing or connected values fall back to
//! defaults so a snapshot can be built even from an invalid graph.

pub mod models;
pub mod sampling;

use crate::classify;
use crate::parse::types::WorkflowGraph;
use crate::resolve::Connections;
use crate::snapshot::types::{Architecture, GenerationInfo, ModelStack};

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub models: ModelStack,
    pub generation: GenerationInfo,
}

impl Parameters {
    /// Architecture of the checkpoint, `Unknown` without one.
    pub fn architecture(&self) -> Architecture {
        self.models
            .checkpoint
            .as_ref()
            .map_or(Architecture::Unknown, |c| c.architecture)
    }
}

pub fn extract(graph: &WorkflowGraph, connections: &Connections) -> Parameters {
    let sampler_chain = sampling::extract_sampler_chain(graph);
    let prompt_embeddings = sampling::extract_prompts(graph, connections);
    let controlnets = models::extract_controlnets(graph, connections);

    let models = ModelStack {
        checkpoint: models::extract_checkpoint(graph),
        vae: models::extract_vae(graph),
        loras: models::extract_loras(graph),
        embeddings: models::extract_embeddings(
            graph
                .nodes_where(classify::is_text_encoder)
                .flat_map(|(_, node)| node.prompt_texts()),
        ),
        upscalers: models::extract_upscalers(graph),
        face_restorers: models::extract_face_restorers(graph),
        controlnets,
    };

    let first = sampler_chain.first();
    let generation = GenerationInfo {
        seed: first.and_then(|s| s.seed),
        total_steps: sampling::total_steps(&sampler_chain),
        guidance_scale: first.and_then(|s| s.cfg).unwrap_or(0.0),
        conditioning_strength: models.controlnets.first().map_or(1.0, |c| c.strength),
        sampler_chain,
        prompt_embeddings,
    };

    Parameters { models, generation }
}
