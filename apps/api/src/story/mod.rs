// Story writing: one text-generation call per theme, validated eagerly into a
// title plus exactly five paragraphs.
// All model calls go through the `StoryModel` seam, implemented by llm_client.

pub mod generator;
pub mod handlers;
pub mod prompts;

pub use generator::{generate_story, Story, StoryModel, StoryTheme};
