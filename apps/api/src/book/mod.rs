// Book assembly: illustrate a finished story and lay it out as an A5-landscape
// PDF (cover, then a text page and an illustration page per paragraph).
// Layout is computed as a plain `BookPlan` first; `pdf` only serialises it.

pub mod font_metrics;
pub mod handlers;
pub mod pdf;
pub mod pipeline;
pub mod plan;
pub mod wrap;

pub use pdf::{render_book, RenderedBook};
pub use pipeline::{generate_book, BookRequest};
