//! Fan-out Orchestrator: issues every image call of a book at once and
//! reassembles the results in scene order.
//!
//! # Scene order
//! Scene 0 is the cover; scene `i + 1` illustrates `paragraphs[i]` verbatim.
//! Results are written into a fixed slot per scene, so completion order never
//! leaks into output order.
//!
//! # Failure policy
//! All-or-nothing. The first failed scene aborts every sibling still in flight
//! and its error (scene index attached) is returned. No partial image list ever
//! leaves this module.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::illustration::adapter::{generate_image, GeneratedImage, ImageModel};

/// Tuning for one fan-out.
#[derive(Debug, Clone, Copy)]
pub struct FanoutOptions {
    /// Upper bound on image calls in flight at once. At least 1.
    pub max_in_flight: usize,
    /// Deadline for each individual call.
    pub call_timeout: Duration,
}

/// One illustration to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenePrompt {
    pub index: usize,
    pub text: String,
}

/// Builds the scene list: the cover description first, then each paragraph as-is.
pub fn scene_prompts(cover_prompt: &str, paragraphs: &[String]) -> Vec<ScenePrompt> {
    std::iter::once(cover_prompt)
        .chain(paragraphs.iter().map(String::as_str))
        .enumerate()
        .map(|(index, text)| ScenePrompt {
            index,
            text: text.to_string(),
        })
        .collect()
}

/// Generates `paragraphs.len() + 1` images concurrently.
///
/// Returns them indexed by scene: `[cover, paragraph_0, …, paragraph_{n-1}]`.
pub async fn generate_all_images(
    cover_prompt: &str,
    paragraphs: &[String],
    style: &str,
    model: Arc<dyn ImageModel>,
    options: FanoutOptions,
) -> Result<Vec<GeneratedImage>, AppError> {
    let scenes = scene_prompts(cover_prompt, paragraphs);
    let total = scenes.len();
    let style: Arc<str> = Arc::from(style);
    let permits = Arc::new(Semaphore::new(options.max_in_flight.max(1)));

    info!(
        scenes = total,
        max_in_flight = options.max_in_flight,
        "Issuing image calls"
    );

    let mut tasks = JoinSet::new();
    for scene in scenes {
        let model = Arc::clone(&model);
        let style = Arc::clone(&style);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.map_err(|e| {
                AppError::Internal(anyhow::anyhow!("image call semaphore closed: {e}"))
            })?;
            generate_image(
                scene.index,
                &scene.text,
                &style,
                model.as_ref(),
                options.call_timeout,
            )
            .await
        });
    }

    let mut slots: Vec<Option<GeneratedImage>> = (0..total).map(|_| None).collect();

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("image task panicked or was cancelled: {e}"))
        });

        match outcome.and_then(|result| result) {
            Ok(image) => {
                let index = image.scene();
                slots[index] = Some(image);
            }
            Err(e) => {
                tasks.abort_all();
                warn!(
                    scene = ?e.scene(),
                    outstanding = tasks.len(),
                    "Image call failed, abandoning the remaining scenes"
                );
                return Err(e);
            }
        }
    }

    let images = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                AppError::InvariantViolation(format!("scene {index} finished without an image"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    info!(images = images.len(), "All scenes illustrated");
    Ok(images)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Stage;
    use crate::illustration::prompts::{ART_STYLE_PROMPT, COVER_SCENE_PROMPT};
    use crate::testing::{sample_paragraphs, ScriptedImageModel};

    fn options(max_in_flight: usize) -> FanoutOptions {
        FanoutOptions {
            max_in_flight,
            call_timeout: Duration::from_secs(60),
        }
    }

    fn all_scenes(paragraphs: &[String]) -> Vec<String> {
        scene_prompts(COVER_SCENE_PROMPT, paragraphs)
            .into_iter()
            .map(|s| s.text)
            .collect()
    }

    // ── scene_prompts ───────────────────────────────────────────────────────

    #[test]
    fn test_scene_prompts_cover_first_then_paragraphs_verbatim() {
        let paragraphs = sample_paragraphs(3);
        let scenes = scene_prompts("portada", &paragraphs);

        assert_eq!(scenes.len(), 4);
        assert_eq!(scenes[0].text, "portada");
        for (i, paragraph) in paragraphs.iter().enumerate() {
            assert_eq!(scenes[i + 1].index, i + 1);
            assert_eq!(&scenes[i + 1].text, paragraph);
        }
    }

    // ── ordering ────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_output_order_ignores_completion_order() {
        let paragraphs = sample_paragraphs(5);
        let scenes = all_scenes(&paragraphs);
        // Scene 0 finishes last, scene 5 first.
        let mut model = ScriptedImageModel::new(&scenes);
        for i in 0..scenes.len() {
            model = model.delay(i, Duration::from_millis(100 * (scenes.len() - i) as u64));
        }
        let model = Arc::new(model);

        let images = generate_all_images(
            COVER_SCENE_PROMPT,
            &paragraphs,
            ART_STYLE_PROMPT,
            model.clone(),
            options(8),
        )
        .await
        .unwrap();

        assert_eq!(images.len(), paragraphs.len() + 1);
        for (position, image) in images.iter().enumerate() {
            assert_eq!(image.scene(), position);
            // The double encodes the scene it drew into the image width.
            assert_eq!(image.width(), ScriptedImageModel::width_for(position));
        }
        assert_eq!(model.completion_order(), vec![5, 4, 3, 2, 1, 0]);
    }

    #[tokio::test]
    async fn test_every_call_gets_identical_style_preamble() {
        let paragraphs = sample_paragraphs(5);
        let scenes = all_scenes(&paragraphs);
        let model = Arc::new(ScriptedImageModel::new(&scenes));

        generate_all_images(
            COVER_SCENE_PROMPT,
            &paragraphs,
            ART_STYLE_PROMPT,
            model.clone(),
            options(8),
        )
        .await
        .unwrap();

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 6);
        for prompt in &prompts {
            assert!(prompt.starts_with(&format!("{ART_STYLE_PROMPT}\n\n**Scene:** ")));
        }
        for scene in &scenes {
            assert!(
                prompts.iter().any(|p| p.ends_with(scene.as_str())),
                "no call was made for scene {scene:?}"
            );
        }
    }

    // ── concurrency ─────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_issued_concurrently() {
        let paragraphs = sample_paragraphs(5);
        let scenes = all_scenes(&paragraphs);
        let mut model = ScriptedImageModel::new(&scenes);
        for i in 0..scenes.len() {
            model = model.delay(i, Duration::from_millis(250));
        }
        let model = Arc::new(model);

        generate_all_images(
            COVER_SCENE_PROMPT,
            &paragraphs,
            ART_STYLE_PROMPT,
            model.clone(),
            options(8),
        )
        .await
        .unwrap();

        assert_eq!(model.peak_in_flight(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_calls_are_bounded() {
        let paragraphs = sample_paragraphs(5);
        let scenes = all_scenes(&paragraphs);
        let mut model = ScriptedImageModel::new(&scenes);
        for i in 0..scenes.len() {
            model = model.delay(i, Duration::from_millis(250));
        }
        let model = Arc::new(model);

        let images = generate_all_images(
            COVER_SCENE_PROMPT,
            &paragraphs,
            ART_STYLE_PROMPT,
            model.clone(),
            options(2),
        )
        .await
        .unwrap();

        assert_eq!(images.len(), 6);
        assert!(model.peak_in_flight() <= 2);
    }

    // ── failure policy ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_any_single_failure_fails_the_batch() {
        let paragraphs = sample_paragraphs(5);
        let scenes = all_scenes(&paragraphs);

        for failing in 0..scenes.len() {
            let model = Arc::new(ScriptedImageModel::new(&scenes).fail(failing));
            let err = generate_all_images(
                COVER_SCENE_PROMPT,
                &paragraphs,
                ART_STYLE_PROMPT,
                model,
                options(8),
            )
            .await
            .unwrap_err();

            match err {
                AppError::GenerationFailure {
                    stage: Stage::Scene(index),
                    ..
                } => assert_eq!(index, failing),
                other => panic!("scene {failing}: unexpected error {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_abandons_in_flight_siblings() {
        let paragraphs = sample_paragraphs(5);
        let scenes = all_scenes(&paragraphs);
        let mut model = ScriptedImageModel::new(&scenes).fail(3);
        for i in (0..scenes.len()).filter(|i| *i != 3) {
            model = model.delay(i, Duration::from_secs(30));
        }
        let model = Arc::new(model);

        let err = generate_all_images(
            COVER_SCENE_PROMPT,
            &paragraphs,
            ART_STYLE_PROMPT,
            model.clone(),
            options(8),
        )
        .await
        .unwrap_err();
        assert_eq!(err.scene(), Some(3));

        // Siblings were aborted mid-call, so none of them ever finishes.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(model.completion_order().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_image_fails_the_batch_as_malformed() {
        let paragraphs = sample_paragraphs(2);
        let scenes = all_scenes(&paragraphs);
        let model = Arc::new(ScriptedImageModel::new(&scenes).garbage(2));

        let err = generate_all_images(
            COVER_SCENE_PROMPT,
            &paragraphs,
            ART_STYLE_PROMPT,
            model,
            options(8),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::MalformedResponse {
                stage: Stage::Scene(2),
                ..
            }
        ));
    }
}
