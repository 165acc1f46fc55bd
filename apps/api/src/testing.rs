//! Scripted doubles for the model seams, shared by unit tests across modules.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::illustration::prompts::SCENE_LABEL;
use crate::illustration::{GeneratedImage, ImageModel};
use crate::llm_client::LlmError;
use crate::story::StoryModel;

/// Encodes a solid-colour PNG.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let raster = image::RgbImage::from_pixel(width, height, image::Rgb([214, 162, 96]));
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(raster)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

pub fn solid_image(scene: usize, width: u32, height: u32) -> GeneratedImage {
    GeneratedImage::decode(scene, &png(width, height)).unwrap()
}

/// `paragraphs + 1` small 4:3 images, scene-indexed.
pub fn book_images(paragraphs: usize) -> Vec<GeneratedImage> {
    (0..=paragraphs).map(|scene| solid_image(scene, 64, 48)).collect()
}

pub fn sample_paragraphs(count: usize) -> Vec<String> {
    const SENTENCES: [&str; 6] = [
        "Una mañana de viento, Pepito y Pepón encontraron un barrilete rojo enganchado en la rama más baja del jacarandá de la vereda.",
        "Pepón sostuvo el hilo con mucho cuidado mientras Pepito corría detrás, riéndose cada vez que la cola de trapo le hacía cosquillas en la nariz.",
        "El barrilete subió tan alto que parecía tocar las nubes, y los dos hermanos se quedaron mirándolo con la boca abierta.",
        "De pronto el viento se calmó y el barrilete empezó a bajar despacito, como una hoja que no tiene apuro.",
        "Esa noche, con el barrilete apoyado junto a la cama, Pepito le dijo a Pepón que mañana iban a volar todavía más alto.",
        "La abuela les preparó chocolatada y escuchó, sonriendo, toda la aventura desde el principio.",
    ];
    (0..count)
        .map(|i| format!("{} ({})", SENTENCES[i % SENTENCES.len()], i + 1))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Story double
// ────────────────────────────────────────────────────────────────────────────

type StoryReply = Box<dyn Fn() -> Result<String, LlmError> + Send + Sync>;

pub struct ScriptedStoryModel {
    reply: StoryReply,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedStoryModel {
    pub fn replying(text: String) -> Self {
        Self {
            reply: Box::new(move || Ok(text.clone())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails the first call with `error`; any later call reports empty content.
    pub fn failing(error: LlmError) -> Self {
        let slot = Mutex::new(Some(error));
        Self {
            reply: Box::new(move || {
                Err(slot
                    .lock()
                    .unwrap()
                    .take()
                    .unwrap_or(LlmError::EmptyContent))
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(system, prompt)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoryModel for ScriptedStoryModel {
    async fn write_story(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        (self.reply)()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Image double
// ────────────────────────────────────────────────────────────────────────────

enum Failure {
    Api,
    Garbage,
}

/// Image double that recognises which scene it was asked for by the text after
/// the scene label, and draws an image whose width identifies that scene.
pub struct ScriptedImageModel {
    scenes: Vec<String>,
    delays: HashMap<usize, Duration>,
    failures: HashMap<usize, Failure>,
    prompts: Mutex<Vec<String>>,
    completed: Mutex<Vec<usize>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedImageModel {
    pub fn new(scenes: &[String]) -> Self {
        Self {
            scenes: scenes.to_vec(),
            delays: HashMap::new(),
            failures: HashMap::new(),
            prompts: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn delay(mut self, scene: usize, delay: Duration) -> Self {
        self.delays.insert(scene, delay);
        self
    }

    pub fn fail(mut self, scene: usize) -> Self {
        self.failures.insert(scene, Failure::Api);
        self
    }

    pub fn garbage(mut self, scene: usize) -> Self {
        self.failures.insert(scene, Failure::Garbage);
        self
    }

    pub fn width_for(scene: usize) -> u32 {
        16 + scene as u32
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Scenes that returned an image, in the order their calls finished.
    pub fn completion_order(&self) -> Vec<usize> {
        self.completed.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn scene_of(&self, prompt: &str) -> usize {
        let (_, scene_text) = prompt
            .split_once(SCENE_LABEL)
            .expect("prompt has no scene label");
        self.scenes
            .iter()
            .position(|s| s == scene_text)
            .unwrap_or_else(|| panic!("unexpected scene {scene_text:?}"))
    }
}

#[async_trait]
impl ImageModel for ScriptedImageModel {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let scene = self.scene_of(prompt);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&scene) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.failures.get(&scene) {
            Some(Failure::Api) => Err(LlmError::Api {
                status: 400,
                message: format!("scene {scene} rejected by the safety system"),
            }),
            Some(Failure::Garbage) => Ok(b"<html>not an image</html>".to_vec()),
            None => {
                self.completed.lock().unwrap().push(scene);
                Ok(png(Self::width_for(scene), 12))
            }
        }
    }
}
