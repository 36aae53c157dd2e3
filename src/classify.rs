//! Class-type families shared by the validator, extractor and estimators.
//!
//! These are name heuristics; renamed or aliased custom nodes are missed.

pub const KSAMPLER: &str = "KSampler";
pub const KSAMPLER_ADVANCED: &str = "KSamplerAdvanced";
pub const CLIP_SET_LAST_LAYER: &str = "CLIPSetLastLayer";
pub const VAE_LOADER: &str = "VAELoader";
pub const UPSCALE_MODEL_LOADER: &str = "UpscaleModelLoader";

const CHECKPOINT_LOADERS: &[&str] = &[
    "CheckpointLoaderSimple",
    "CheckpointLoader",
    "ImageOnlyCheckpointLoader",
    "unCLIPCheckpointLoader",
    "UNETLoader",
];

const LORA_LOADERS: &[&str] = &["LoraLoader", "LoraLoaderModelOnly"];

const CONTROLNET_APPLY: &[&str] = &["ControlNetApply", "ControlNetApplyAdvanced"];

pub fn is_checkpoint_loader(class_type: &str) -> bool {
    CHECKPOINT_LOADERS.contains(&class_type)
}

/// Anything that brings a diffusion model into the graph.
pub fn is_model_loader(class_type: &str) -> bool {
    is_checkpoint_loader(class_type) || class_type.ends_with("CheckpointLoader")
}

/// Samplers that produce latents: `KSampler*` (except the `KSamplerSelect`
/// helper) and `SamplerCustom*`.
pub fn is_sampler(class_type: &str) -> bool {
    (class_type.contains(KSAMPLER) && class_type != "KSamplerSelect")
        || class_type.starts_with("SamplerCustom")
}

pub fn is_text_encoder(class_type: &str) -> bool {
    class_type.contains("TextEncode")
}

pub fn is_decoder(class_type: &str) -> bool {
    class_type.starts_with("VAEDecode")
}

pub fn is_vae_encoder(class_type: &str) -> bool {
    class_type.starts_with("VAEEncode")
}

pub fn is_image_loader(class_type: &str) -> bool {
    class_type.starts_with("LoadImage")
}

pub fn is_lora_loader(class_type: &str) -> bool {
    LORA_LOADERS.contains(&class_type)
}

pub fn is_controlnet_apply(class_type: &str) -> bool {
    CONTROLNET_APPLY.contains(&class_type)
}

pub fn is_face_restorer(class_type: &str) -> bool {
    let lower = class_type.to_lowercase();
    lower.contains("facerestore") || lower.contains("facedetailer")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_family() {
        assert!(is_sampler("KSampler"));
        assert!(is_sampler("KSamplerAdvanced"));
        assert!(is_sampler("SamplerCustomAdvanced"));
        assert!(is_sampler("KSampler (Efficient)"));
        assert!(!is_sampler("KSamplerSelect"));
        assert!(!is_sampler("SamplerDPMPP_2M"));
    }

    #[test]
    fn loader_family() {
        assert!(is_model_loader("CheckpointLoaderSimple"));
        assert!(is_model_loader("UNETLoader"));
        assert!(is_model_loader("CustomCheckpointLoader"));
        assert!(!is_model_loader("VAELoader"));
    }

    #[test]
    fn encoders_and_decoders() {
        assert!(is_text_encoder("CLIPTextEncodeSDXL"));
        assert!(is_decoder("VAEDecodeTiled"));
        assert!(is_vae_encoder("VAEEncodeForInpaint"));
        assert!(is_face_restorer("FaceRestoreWithModel"));
        assert!(is_face_restorer("FaceDetailer"));
    }
}
