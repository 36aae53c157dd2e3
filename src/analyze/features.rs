//! Capability flags inferred from which node types a workflow uses.
//!
//! All heuristics live in [`FEATURE_TABLE`], one predicate per flag, evaluated
//! once per parse. False negatives on renamed custom nodes are expected.

use std::collections::BTreeSet;

use crate::classify;
use crate::parse::types::WorkflowGraph;
use crate::snapshot::types::FeatureFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    ImageToImage,
    ControlNet,
    Lora,
    Embeddings,
    Upscaling,
    Inpainting,
    FaceRestore,
    Animation,
    IpAdapter,
    RegionalPrompting,
    BatchProcessing,
    CustomSamplers,
}

impl Feature {
    /// Tag name used in snapshot tags.
    pub fn tag(&self) -> &'static str {
        match self {
            Feature::ImageToImage => "img2img",
            Feature::ControlNet => "controlnet",
            Feature::Lora => "lora",
            Feature::Embeddings => "embeddings",
            Feature::Upscaling => "upscaling",
            Feature::Inpainting => "inpainting",
            Feature::FaceRestore => "face-restore",
            Feature::Animation => "animation",
            Feature::IpAdapter => "ip-adapter",
            Feature::RegionalPrompting => "regional-prompting",
            Feature::BatchProcessing => "batch",
            Feature::CustomSamplers => "custom-samplers",
        }
    }

    fn flag(self, flags: &mut FeatureFlags) -> &mut bool {
        match self {
            Feature::ImageToImage => &mut flags.image_to_image,
            Feature::ControlNet => &mut flags.control_net,
            Feature::Lora => &mut flags.lora,
            Feature::Embeddings => &mut flags.embeddings,
            Feature::Upscaling => &mut flags.upscaling,
            Feature::Inpainting => &mut flags.inpainting,
            Feature::FaceRestore => &mut flags.face_restore,
            Feature::Animation => &mut flags.animation,
            Feature::IpAdapter => &mut flags.ip_adapter,
            Feature::RegionalPrompting => &mut flags.regional_prompting,
            Feature::BatchProcessing => &mut flags.batch_processing,
            Feature::CustomSamplers => &mut flags.custom_samplers,
        }
    }
}

/// What the predicates see: the distinct class types (original and
/// lowercased) plus the graph for value-based checks.
pub struct FeatureContext<'a> {
    pub class_types: BTreeSet<&'a str>,
    lowered: Vec<String>,
    pub graph: &'a WorkflowGraph,
}

impl<'a> FeatureContext<'a> {
    pub fn new(graph: &'a WorkflowGraph) -> Self {
        let class_types: BTreeSet<&str> = graph.iter().map(|(_, n)| n.class_type.as_str()).collect();
        let lowered = class_types.iter().map(|t| t.to_lowercase()).collect();
        FeatureContext {
            class_types,
            lowered,
            graph,
        }
    }

    /// Case-insensitive substring test over every class type.
    pub fn any_contains(&self, needle: &str) -> bool {
        self.lowered.iter().any(|t| t.contains(needle))
    }

    pub fn has(&self, class_type: &str) -> bool {
        self.class_types.contains(class_type)
    }

    pub fn any(&self, pred: impl Fn(&str) -> bool) -> bool {
        self.class_types.iter().any(|t| pred(*t))
    }
}

type Predicate = fn(&FeatureContext) -> bool;

pub const FEATURE_TABLE: &[(Feature, Predicate)] = &[
    (Feature::ImageToImage, image_to_image),
    (Feature::ControlNet, |c| c.any_contains("controlnet")),
    (Feature::Lora, |c| c.any_contains("lora")),
    (Feature::Embeddings, embeddings),
    (Feature::Upscaling, |c| c.any_contains("upscale")),
    (Feature::Inpainting, |c| c.any_contains("inpaint") || c.has("SetLatentNoiseMask")),
    (Feature::FaceRestore, |c| c.any(classify::is_face_restorer)),
    (Feature::Animation, animation),
    (Feature::IpAdapter, |c| c.any_contains("ipadapter")),
    (Feature::RegionalPrompting, regional_prompting),
    (Feature::BatchProcessing, batch_processing),
    (Feature::CustomSamplers, custom_samplers),
];

fn image_to_image(c: &FeatureContext) -> bool {
    c.any(classify::is_image_loader) && c.any(classify::is_vae_encoder)
}

fn embeddings(c: &FeatureContext) -> bool {
    c.any_contains("embedding")
        || c.graph.iter().any(|(_, n)| {
            n.prompt_texts()
                .any(|t| t.to_lowercase().contains("embedding:"))
        })
}

fn animation(c: &FeatureContext) -> bool {
    c.any_contains("animatediff") || c.any_contains("video") || c.has("SVD_img2vid_Conditioning")
}

fn regional_prompting(c: &FeatureContext) -> bool {
    c.any_contains("regional") || c.has("ConditioningSetArea") || c.has("ConditioningSetMask")
}

fn batch_processing(c: &FeatureContext) -> bool {
    c.graph
        .iter()
        .any(|(_, n)| n.number("batch_size").is_some_and(|b| b > 1.0))
}

/// Any sampler-like type other than the two stock samplers.
fn custom_samplers(c: &FeatureContext) -> bool {
    c.any(|t| t.contains("Sampler") && t != classify::KSAMPLER && t != classify::KSAMPLER_ADVANCED)
}

pub fn detect_features(graph: &WorkflowGraph) -> FeatureFlags {
    let ctx = FeatureContext::new(graph);
    let mut flags = FeatureFlags::default();
    for (feature, predicate) in FEATURE_TABLE {
        *feature.flag(&mut flags) = predicate(&ctx);
    }
    flags
}

/// Enabled features, in table order.
pub fn enabled(flags: &FeatureFlags) -> Vec<Feature> {
    let mut copy = *flags;
    FEATURE_TABLE
        .iter()
        .map(|(f, _)| *f)
        .filter(|f| *f.flag(&mut copy))
        .collect()
}
