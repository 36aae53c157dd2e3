//! Node type schemas: which inputs a node type requires and which typed
//! outputs it exposes, by slot index.
//!
//! The builtin table is constructed once and never mutated. Callers that know
//! about custom node packs clone it and [`register`](NodeTypeRegistry::register)
//! their own schemas on the copy.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl OutputDescriptor {
    pub fn new(name: &str, data_type: &str) -> Self {
        OutputDescriptor {
            name: name.into(),
            data_type: data_type.into(),
        }
    }

    /// Placeholder used when a source type or slot cannot be resolved.
    pub fn unknown() -> Self {
        Self::new("unknown", "unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeSchema {
    pub category: String,
    pub required_inputs: BTreeSet<String>,
    pub optional_inputs: BTreeSet<String>,
    pub outputs: Vec<OutputDescriptor>,
}

impl NodeTypeSchema {
    pub fn builder(category: &str) -> NodeTypeSchemaBuilder {
        NodeTypeSchemaBuilder {
            schema: NodeTypeSchema {
                category: category.into(),
                required_inputs: BTreeSet::new(),
                optional_inputs: BTreeSet::new(),
                outputs: Vec::new(),
            },
        }
    }

    pub fn is_required(&self, input: &str) -> bool {
        self.required_inputs.contains(input)
    }
}

pub struct NodeTypeSchemaBuilder {
    schema: NodeTypeSchema,
}

impl NodeTypeSchemaBuilder {
    pub fn required(mut self, inputs: &[&str]) -> Self {
        self.schema
            .required_inputs
            .extend(inputs.iter().map(|s| s.to_string()));
        self
    }

    pub fn optional(mut self, inputs: &[&str]) -> Self {
        self.schema
            .optional_inputs
            .extend(inputs.iter().map(|s| s.to_string()));
        self
    }

    /// Append an output; slot indices follow call order.
    pub fn output(mut self, name: &str, data_type: &str) -> Self {
        self.schema.outputs.push(OutputDescriptor::new(name, data_type));
        self
    }

    pub fn build(self) -> NodeTypeSchema {
        self.schema
    }
}

#[derive(Debug, Clone, Default)]
pub struct NodeTypeRegistry {
    schemas: HashMap<String, NodeTypeSchema>,
}

static BUILTIN: LazyLock<NodeTypeRegistry> = LazyLock::new(NodeTypeRegistry::with_builtin_types);

impl NodeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table of stock node types.
    pub fn builtin() -> &'static NodeTypeRegistry {
        &BUILTIN
    }

    /// Add or replace a schema. Returns the schema it replaced, if any.
    pub fn register(&mut self, class_type: &str, schema: NodeTypeSchema) -> Option<NodeTypeSchema> {
        self.schemas.insert(class_type.to_string(), schema)
    }

    pub fn get(&self, class_type: &str) -> Option<&NodeTypeSchema> {
        self.schemas.get(class_type)
    }

    pub fn contains(&self, class_type: &str) -> bool {
        self.schemas.contains_key(class_type)
    }

    /// Output descriptor at `index` for `class_type`, if both are known.
    pub fn output(&self, class_type: &str, index: usize) -> Option<&OutputDescriptor> {
        self.get(class_type).and_then(|s| s.outputs.get(index))
    }

    pub fn is_required(&self, class_type: &str, input: &str) -> bool {
        self.get(class_type).is_some_and(|s| s.is_required(input))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn with_builtin_types() -> Self {
        let mut r = NodeTypeRegistry::new();

        // Loaders
        r.register(
            "CheckpointLoaderSimple",
            NodeTypeSchema::builder("loaders")
                .required(&["ckpt_name"])
                .output("MODEL", "MODEL")
                .output("CLIP", "CLIP")
                .output("VAE", "VAE")
                .build(),
        );
        r.register(
            "CheckpointLoader",
            NodeTypeSchema::builder("loaders")
                .required(&["config_name", "ckpt_name"])
                .output("MODEL", "MODEL")
                .output("CLIP", "CLIP")
                .output("VAE", "VAE")
                .build(),
        );
        r.register(
            "UNETLoader",
            NodeTypeSchema::builder("loaders")
                .required(&["unet_name"])
                .optional(&["weight_dtype"])
                .output("MODEL", "MODEL")
                .build(),
        );
        r.register(
            "VAELoader",
            NodeTypeSchema::builder("loaders")
                .required(&["vae_name"])
                .output("VAE", "VAE")
                .build(),
        );
        r.register(
            "CLIPLoader",
            NodeTypeSchema::builder("loaders")
                .required(&["clip_name"])
                .optional(&["type"])
                .output("CLIP", "CLIP")
                .build(),
        );
        r.register(
            "DualCLIPLoader",
            NodeTypeSchema::builder("loaders")
                .required(&["clip_name1", "clip_name2", "type"])
                .output("CLIP", "CLIP")
                .build(),
        );
        r.register(
            "LoraLoader",
            NodeTypeSchema::builder("loaders")
                .required(&["model", "clip", "lora_name", "strength_model", "strength_clip"])
                .output("MODEL", "MODEL")
                .output("CLIP", "CLIP")
                .build(),
        );
        r.register(
            "LoraLoaderModelOnly",
            NodeTypeSchema::builder("loaders")
                .required(&["model", "lora_name", "strength_model"])
                .output("MODEL", "MODEL")
                .build(),
        );
        r.register(
            "ControlNetLoader",
            NodeTypeSchema::builder("loaders")
                .required(&["control_net_name"])
                .output("CONTROL_NET", "CONTROL_NET")
                .build(),
        );
        r.register(
            "UpscaleModelLoader",
            NodeTypeSchema::builder("loaders")
                .required(&["model_name"])
                .output("UPSCALE_MODEL", "UPSCALE_MODEL")
                .build(),
        );

        // Conditioning
        r.register(
            "CLIPTextEncode",
            NodeTypeSchema::builder("conditioning")
                .required(&["text", "clip"])
                .output("CONDITIONING", "CONDITIONING")
                .build(),
        );
        r.register(
            "CLIPTextEncodeSDXL",
            NodeTypeSchema::builder("conditioning")
                .required(&["clip", "text_g", "text_l", "width", "height"])
                .optional(&["crop_w", "crop_h", "target_width", "target_height"])
                .output("CONDITIONING", "CONDITIONING")
                .build(),
        );
        r.register(
            "CLIPSetLastLayer",
            NodeTypeSchema::builder("conditioning")
                .required(&["clip", "stop_at_clip_layer"])
                .output("CLIP", "CLIP")
                .build(),
        );
        r.register(
            "ConditioningCombine",
            NodeTypeSchema::builder("conditioning")
                .required(&["conditioning_1", "conditioning_2"])
                .output("CONDITIONING", "CONDITIONING")
                .build(),
        );
        r.register(
            "ConditioningSetArea",
            NodeTypeSchema::builder("conditioning")
                .required(&["conditioning", "width", "height", "x", "y", "strength"])
                .output("CONDITIONING", "CONDITIONING")
                .build(),
        );
        r.register(
            "ControlNetApply",
            NodeTypeSchema::builder("conditioning")
                .required(&["conditioning", "control_net", "image", "strength"])
                .output("CONDITIONING", "CONDITIONING")
                .build(),
        );
        r.register(
            "ControlNetApplyAdvanced",
            NodeTypeSchema::builder("conditioning")
                .required(&[
                    "positive",
                    "negative",
                    "control_net",
                    "image",
                    "strength",
                    "start_percent",
                    "end_percent",
                ])
                .optional(&["vae"])
                .output("positive", "CONDITIONING")
                .output("negative", "CONDITIONING")
                .build(),
        );

        // Sampling
        r.register(
            "KSampler",
            NodeTypeSchema::builder("sampling")
                .required(&[
                    "model",
                    "seed",
                    "steps",
                    "cfg",
                    "sampler_name",
                    "scheduler",
                    "positive",
                    "negative",
                    "latent_image",
                ])
                .optional(&["denoise"])
                .output("LATENT", "LATENT")
                .build(),
        );
        r.register(
            "KSamplerAdvanced",
            NodeTypeSchema::builder("sampling")
                .required(&[
                    "model",
                    "add_noise",
                    "noise_seed",
                    "steps",
                    "cfg",
                    "sampler_name",
                    "scheduler",
                    "positive",
                    "negative",
                    "latent_image",
                    "start_at_step",
                    "end_at_step",
                    "return_with_leftover_noise",
                ])
                .output("LATENT", "LATENT")
                .build(),
        );
        r.register(
            "SamplerCustom",
            NodeTypeSchema::builder("sampling")
                .required(&[
                    "model",
                    "add_noise",
                    "noise_seed",
                    "cfg",
                    "positive",
                    "negative",
                    "sampler",
                    "sigmas",
                    "latent_image",
                ])
                .output("output", "LATENT")
                .output("denoised_output", "LATENT")
                .build(),
        );
        r.register(
            "KSamplerSelect",
            NodeTypeSchema::builder("sampling")
                .required(&["sampler_name"])
                .output("SAMPLER", "SAMPLER")
                .build(),
        );

        // Latent
        r.register(
            "EmptyLatentImage",
            NodeTypeSchema::builder("latent")
                .required(&["width", "height", "batch_size"])
                .output("LATENT", "LATENT")
                .build(),
        );
        r.register(
            "VAEDecode",
            NodeTypeSchema::builder("latent")
                .required(&["samples", "vae"])
                .output("IMAGE", "IMAGE")
                .build(),
        );
        r.register(
            "VAEEncode",
            NodeTypeSchema::builder("latent")
                .required(&["pixels", "vae"])
                .output("LATENT", "LATENT")
                .build(),
        );
        r.register(
            "VAEEncodeForInpaint",
            NodeTypeSchema::builder("latent/inpaint")
                .required(&["pixels", "vae", "mask", "grow_mask_by"])
                .output("LATENT", "LATENT")
                .build(),
        );
        r.register(
            "SetLatentNoiseMask",
            NodeTypeSchema::builder("latent/inpaint")
                .required(&["samples", "mask"])
                .output("LATENT", "LATENT")
                .build(),
        );
        r.register(
            "LatentUpscale",
            NodeTypeSchema::builder("latent")
                .required(&["samples", "upscale_method", "width", "height", "crop"])
                .output("LATENT", "LATENT")
                .build(),
        );
        r.register(
            "LatentUpscaleBy",
            NodeTypeSchema::builder("latent")
                .required(&["samples", "upscale_method", "scale_by"])
                .output("LATENT", "LATENT")
                .build(),
        );

        // Image
        r.register(
            "LoadImage",
            NodeTypeSchema::builder("image")
                .required(&["image"])
                .optional(&["upload"])
                .output("IMAGE", "IMAGE")
                .output("MASK", "MASK")
                .build(),
        );
        r.register(
            "SaveImage",
            NodeTypeSchema::builder("image")
                .required(&["images"])
                .optional(&["filename_prefix"])
                .build(),
        );
        r.register(
            "PreviewImage",
            NodeTypeSchema::builder("image")
                .required(&["images"])
                .build(),
        );
        r.register(
            "ImageScale",
            NodeTypeSchema::builder("image/upscaling")
                .required(&["image", "upscale_method", "width", "height", "crop"])
                .output("IMAGE", "IMAGE")
                .build(),
        );
        r.register(
            "ImageUpscaleWithModel",
            NodeTypeSchema::builder("image/upscaling")
                .required(&["upscale_model", "image"])
                .output("IMAGE", "IMAGE")
                .build(),
        );

        r
    }
}
