// Illustration: one image call per scene (cover + one per paragraph), issued
// concurrently and collected back into scene order.
// All model calls go through the `ImageModel` seam, implemented by llm_client.

pub mod adapter;
pub mod fanout;
pub mod prompts;

pub use adapter::{GeneratedImage, ImageModel};
pub use fanout::{generate_all_images, FanoutOptions};
