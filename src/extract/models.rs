//! Model stack extraction: checkpoint, VAE, LoRAs, ControlNets, upscalers,
//! face restorers and prompt embeddings.

use std::sync::LazyLock;

use regex::Regex;

use crate::classify;
use crate::parse::types::{Node, WorkflowGraph};
use crate::resolve::Connections;
use crate::snapshot::types::*;

/// `embedding:<name>` references inside prompt text.
static EMBEDDING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)embedding:([A-Za-z0-9_.\-]+)").expect("valid regex"));

/// Infer the model family from checkpoint filename tokens.
pub fn infer_architecture(filename: &str) -> Architecture {
    let lower = filename.to_lowercase();
    if lower.contains("xl") {
        Architecture::Sdxl
    } else if lower.contains("sd3") {
        Architecture::Sd3
    } else if lower.contains("flux") {
        Architecture::Flux
    } else {
        Architecture::Sd15
    }
}

/// Human-readable base model within an architecture.
pub fn infer_base_model(filename: &str, architecture: Architecture) -> String {
    let lower = filename.to_lowercase();
    let base = match architecture {
        Architecture::Sdxl if lower.contains("pony") => "Pony",
        Architecture::Sdxl if lower.contains("turbo") => "SDXL Turbo",
        Architecture::Sdxl if lower.contains("lightning") => "SDXL Lightning",
        Architecture::Sdxl => "SDXL 1.0",
        Architecture::Sd3 => "SD 3",
        Architecture::Flux if lower.contains("schnell") => "Flux.1 Schnell",
        Architecture::Flux => "Flux.1 Dev",
        Architecture::Sd15 => "SD 1.5",
        Architecture::Unknown => "Unknown",
    };
    base.to_string()
}

fn hash_of(node: &Node) -> Option<String> {
    node.string("hash")
        .or_else(|| node.string("model_hash"))
        .map(str::to_string)
}

pub fn extract_checkpoint(graph: &WorkflowGraph) -> Option<CheckpointInfo> {
    let (id, node) = graph
        .nodes_where(classify::is_checkpoint_loader)
        .find(|(_, n)| checkpoint_name(n).is_some())?;
    let name = checkpoint_name(node)?.to_string();
    let architecture = infer_architecture(&name);

    let clip_skip = graph
        .nodes_where(|t| t == classify::CLIP_SET_LAST_LAYER)
        .find_map(|(_, n)| n.integer("stop_at_clip_layer"))
        .map(i64::abs);

    Some(CheckpointInfo {
        node_id: id.to_string(),
        base_model: infer_base_model(&name, architecture),
        architecture,
        hash: hash_of(node),
        clip_skip,
        name,
    })
}

fn checkpoint_name(node: &Node) -> Option<&str> {
    node.string("ckpt_name").or_else(|| node.string("unet_name"))
}

pub fn extract_vae(graph: &WorkflowGraph) -> Option<VaeInfo> {
    graph
        .nodes_where(|t| t == classify::VAE_LOADER)
        .find_map(|(id, node)| {
            Some(VaeInfo {
                node_id: id.to_string(),
                name: node.string("vae_name")?.to_string(),
                hash: hash_of(node),
            })
        })
}

pub fn extract_loras(graph: &WorkflowGraph) -> Vec<LoraInfo> {
    graph
        .nodes_where(classify::is_lora_loader)
        .filter_map(|(id, node)| {
            let model_only = node.class_type == "LoraLoaderModelOnly";
            let trigger_words = node
                .string("trigger_words")
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|w| !w.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(LoraInfo {
                node_id: id.to_string(),
                name: node.string("lora_name")?.to_string(),
                model_strength: node.number("strength_model").unwrap_or(1.0),
                clip_strength: if model_only {
                    0.0
                } else {
                    node.number("strength_clip").unwrap_or(1.0)
                },
                trigger_words,
            })
        })
        .collect()
}

pub fn extract_controlnets(graph: &WorkflowGraph, connections: &Connections) -> Vec<ControlNetInfo> {
    graph
        .nodes_where(classify::is_controlnet_apply)
        .map(|(id, node)| {
            let model = connections
                .source_of(id, "control_net")
                .and_then(|e| graph.get(&e.from_node))
                .and_then(|loader| loader.string("control_net_name"))
                .map(str::to_string);
            let preprocessor = connections
                .source_of(id, "image")
                .and_then(|e| graph.get(&e.from_node))
                .filter(|src| !classify::is_image_loader(&src.class_type))
                .map(|src| src.class_type.clone());

            ControlNetInfo {
                node_id: id.to_string(),
                model,
                strength: node.number("strength").unwrap_or(1.0),
                start_percent: node.number("start_percent").unwrap_or(0.0),
                end_percent: node.number("end_percent").unwrap_or(1.0),
                preprocessor,
            }
        })
        .collect()
}

pub fn extract_upscalers(graph: &WorkflowGraph) -> Vec<UpscalerInfo> {
    graph
        .nodes_where(|t| t == classify::UPSCALE_MODEL_LOADER)
        .filter_map(|(id, node)| {
            Some(UpscalerInfo {
                node_id: id.to_string(),
                model: node.string("model_name")?.to_string(),
            })
        })
        .collect()
}

pub fn extract_face_restorers(graph: &WorkflowGraph) -> Vec<FaceRestorerInfo> {
    graph
        .nodes_where(classify::is_face_restorer)
        .map(|(id, node)| FaceRestorerInfo {
            node_id: id.to_string(),
            class_type: node.class_type.clone(),
            model: node
                .string("facerestore_model")
                .or_else(|| node.string("model_name"))
                .map(str::to_string),
        })
        .collect()
}

/// Distinct embedding names in order of first mention.
pub fn extract_embeddings<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for text in texts {
        for cap in EMBEDDING_RE.captures_iter(text) {
            let name = cap[1].trim_end_matches('.').to_string();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn architecture_from_tokens() {
        assert_eq!(infer_architecture("model_xl.safetensors"), Architecture::Sdxl);
        assert_eq!(infer_architecture("sd3_medium.safetensors"), Architecture::Sd3);
        assert_eq!(infer_architecture("FLUX1-dev.safetensors"), Architecture::Flux);
        assert_eq!(infer_architecture("v1-5-pruned.ckpt"), Architecture::Sd15);
    }

    #[test]
    fn base_model_variants() {
        assert_eq!(infer_base_model("ponyDiffusionXL.safetensors", Architecture::Sdxl), "Pony");
        assert_eq!(infer_base_model("flux1-schnell.safetensors", Architecture::Flux), "Flux.1 Schnell");
        assert_eq!(infer_base_model("dreamshaper_8.safetensors", Architecture::Sd15), "SD 1.5");
    }

    #[test]
    fn embeddings_deduplicated() {
        let names = extract_embeddings([
            "a photo, embedding:goodhands, sharp",
            "blurry, (embedding:EasyNegative:1.2), embedding:goodhands.",
        ]);
        assert_eq!(names, vec!["goodhands", "EasyNegative"]);
    }
}
