use serde_json::{json, Map, Value};
use workflow_inspector::{Analysis, MetadataAssembler, MetadataSnapshot};

// =============================================================================
// Workflow JSON builders
// =============================================================================

pub const SDXL_TXT2IMG: &str = include_str!("../fixtures/sdxl_txt2img.json");
pub const CONTROLNET_IMG2IMG: &str = include_str!("../fixtures/controlnet_img2img.json");
pub const MALFORMED_ENTRIES: &str = include_str!("../fixtures/malformed_entries.json");

/// A `[source, slot]` connection reference.
pub fn link(source: &str, slot: u64) -> Value {
    json!([source, slot])
}

pub fn node(class_type: &str, inputs: Value) -> Value {
    json!({ "class_type": class_type, "inputs": inputs })
}

/// Build a workflow object from `(id, node)` pairs.
pub fn workflow(nodes: Vec<(&str, Value)>) -> Value {
    let map: Map<String, Value> = nodes.into_iter().map(|(id, n)| (id.to_string(), n)).collect();
    Value::Object(map)
}

/// Loader → two encoders → latent → sampler → decoder → save. Every required
/// input is present, so the only findings are the ones a test introduces.
pub fn txt2img(ckpt: &str, width: u64, steps: u64) -> Value {
    workflow(vec![
        ("1", node("CheckpointLoaderSimple", json!({ "ckpt_name": ckpt }))),
        ("2", node("CLIPTextEncode", json!({ "text": "a cat", "clip": link("1", 1) }))),
        ("3", node("CLIPTextEncode", json!({ "text": "blurry", "clip": link("1", 1) }))),
        (
            "4",
            node("EmptyLatentImage", json!({ "width": width, "height": 512, "batch_size": 1 })),
        ),
        (
            "5",
            node(
                "KSampler",
                json!({
                    "seed": 7,
                    "steps": steps,
                    "cfg": 7.0,
                    "sampler_name": "euler",
                    "scheduler": "normal",
                    "model": link("1", 0),
                    "positive": link("2", 0),
                    "negative": link("3", 0),
                    "latent_image": link("4", 0)
                }),
            ),
        ),
        ("6", node("VAEDecode", json!({ "samples": link("5", 0), "vae": link("1", 2) }))),
        ("7", node("SaveImage", json!({ "images": link("6", 0), "filename_prefix": "out" }))),
    ])
}

// =============================================================================
// Assembly shortcuts
// =============================================================================

pub fn analyze_value(raw: &Value) -> Analysis {
    MetadataAssembler::default()
        .assemble_value(raw, None)
        .expect("assembly post-conditions hold")
}

pub fn snapshot_of(raw: &Value) -> MetadataSnapshot {
    analyze_value(raw).snapshot.expect("object input always yields a snapshot")
}

pub fn codes(analysis: &Analysis) -> Vec<&str> {
    analysis.validation.issues().map(|i| i.code.as_str()).collect()
}
