//! Image Generation Adapter: one scene in, one decoded raster out.
//!
//! Failures are always tagged with the scene index so the orchestrator can say
//! which illustration broke the book:
//! - call error or deadline → `GenerationFailure`
//! - bytes that are not a PNG/JPEG we can decode → `MalformedResponse`

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::{AppError, Stage};
use crate::illustration::prompts::build_scene_prompt;
use crate::llm_client::LlmError;

/// The external image-generation capability. Receives the full prompt
/// (style preamble + scene) and returns the encoded image file bytes.
///
/// Carried in `AppState` as `Arc<dyn ImageModel>`.
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, LlmError>;
}

/// A decoded illustration bound to the scene that produced it.
///
/// Pixels are 8-bit RGB, row-major, `width * height * 3` bytes.
#[derive(Clone)]
pub struct GeneratedImage {
    scene: usize,
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl GeneratedImage {
    /// Decodes PNG or JPEG bytes. CPU-bound: call from the blocking pool.
    pub fn decode(scene: usize, bytes: &[u8]) -> Result<Self, image::ImageError> {
        let raster = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = raster.dimensions();
        Ok(Self {
            scene,
            width,
            height,
            rgb: raster.into_raw(),
        })
    }

    pub fn scene(&self) -> usize {
        self.scene
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }
}

impl fmt::Debug for GeneratedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedImage")
            .field("scene", &self.scene)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rgb_len", &self.rgb.len())
            .finish()
    }
}

/// Generates and decodes the illustration for one scene.
///
/// `style` must be the same string for every scene of a book.
pub async fn generate_image(
    scene: usize,
    scene_prompt: &str,
    style: &str,
    model: &dyn ImageModel,
    timeout: Duration,
) -> Result<GeneratedImage, AppError> {
    let stage = Stage::Scene(scene);
    let prompt = build_scene_prompt(style, scene_prompt);

    let bytes = match tokio::time::timeout(timeout, model.render(&prompt)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) if e.is_malformed() => return Err(AppError::malformed(stage, e.to_string())),
        Ok(Err(e)) => return Err(AppError::generation(stage, e.to_string())),
        Err(_) => {
            return Err(AppError::generation(
                stage,
                format!("timed out after {}s", timeout.as_secs()),
            ))
        }
    };

    let image = tokio::task::spawn_blocking(move || GeneratedImage::decode(scene, &bytes))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "spawn_blocking failed decoding scene {scene}: {e}"
            ))
        })?
        .map_err(|e| AppError::malformed(stage, format!("image could not be decoded: {e}")))?;

    debug!(
        scene,
        width = image.width,
        height = image.height,
        "Scene illustrated"
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::illustration::prompts::{ART_STYLE_PROMPT, COVER_SCENE_PROMPT};
    use crate::testing::{png, ScriptedImageModel};

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[test]
    fn test_decode_png_reports_dimensions() {
        let image = GeneratedImage::decode(2, &png(8, 6)).unwrap();
        assert_eq!(image.scene(), 2);
        assert_eq!((image.width(), image.height()), (8, 6));
        assert_eq!(image.rgb().len(), 8 * 6 * 3);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(GeneratedImage::decode(0, b"definitely not a png").is_err());
    }

    #[tokio::test]
    async fn test_generate_image_sends_style_then_scene() {
        let scenes = vec![COVER_SCENE_PROMPT.to_string()];
        let model = ScriptedImageModel::new(&scenes);

        let image = generate_image(0, COVER_SCENE_PROMPT, ART_STYLE_PROMPT, &model, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(image.scene(), 0);

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with(ART_STYLE_PROMPT));
        assert!(prompts[0].ends_with(COVER_SCENE_PROMPT));
    }

    #[tokio::test]
    async fn test_generate_image_call_error_is_tagged_generation_failure() {
        let scenes = vec!["a".to_string(), "b".to_string()];
        let model = ScriptedImageModel::new(&scenes).fail(1);

        let err = generate_image(1, "b", ART_STYLE_PROMPT, &model, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::GenerationFailure {
                stage: Stage::Scene(1),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_generate_image_undecodable_bytes_is_malformed() {
        let scenes = vec!["a".to_string()];
        let model = ScriptedImageModel::new(&scenes).garbage(0);

        let err = generate_image(0, "a", ART_STYLE_PROMPT, &model, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::MalformedResponse {
                stage: Stage::Scene(0),
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_image_deadline_is_generation_failure() {
        let scenes = vec!["a".to_string()];
        let model = ScriptedImageModel::new(&scenes).delay(0, Duration::from_secs(600));

        let err = generate_image(0, "a", ART_STYLE_PROMPT, &model, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::GenerationFailure {
                stage: Stage::Scene(0),
                ..
            }
        ));
        assert!(err.to_string().contains("timed out"));
    }
}
