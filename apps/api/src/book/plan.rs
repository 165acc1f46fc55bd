//! Book plan: the complete page layout, computed before any PDF object exists.
//!
//! # Page sequence
//! 1. Cover: `images[0]` fitted to the page, title overlaid at a quarter height.
//!    A title too long for one line at the minimum size wraps onto centred lines
//!    stacked upward from there.
//! 2. For each paragraph `i`: a text page, then an illustration page with `images[i + 1]`.
//!
//! So a book with N paragraphs always has `1 + 2N` pages, all the same size.
//! Planning is pure: same inputs, same plan.

use serde::Serialize;
use tracing::warn;

use crate::book::font_metrics::{get_metrics, FontFace};
use crate::book::wrap::{wrap_breaking_words, wrap_paragraph};
use crate::errors::AppError;
use crate::illustration::GeneratedImage;

// ────────────────────────────────────────────────────────────────────────────
// Page geometry (A5 landscape, points)
// ────────────────────────────────────────────────────────────────────────────

pub const PAGE_WIDTH_PT: f32 = 595.28;
pub const PAGE_HEIGHT_PT: f32 = 419.53;
pub const MARGIN_PT: f32 = 50.0;

pub const BODY_SIZE_PT: f32 = 14.0;
pub const BODY_LEADING_PT: f32 = 20.0;
pub const FIRST_LINE_INDENT_PT: f32 = 20.0;
/// Smallest body size an overflowing paragraph is shrunk to.
pub const MIN_BODY_SIZE_PT: f32 = 9.0;

pub const TITLE_SIZE_PT: f32 = 36.0;
pub const MIN_TITLE_SIZE_PT: f32 = 18.0;
/// Baseline-to-baseline distance of a wrapped title, as a multiple of its size.
pub const TITLE_LEADING: f32 = 1.2;

/// Uniform warm background behind body text.
pub const CREAM: Rgb = Rgb(0.99, 0.98, 0.88);
pub const INK: Rgb = Rgb(0.0, 0.0, 0.0);
pub const TITLE_COLOR: Rgb = Rgb(1.0, 1.0, 1.0);
pub const TITLE_OPACITY: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

// ────────────────────────────────────────────────────────────────────────────
// Plan types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageKind {
    Cover,
    Text,
    Illustration,
}

/// Axis-aligned box in page coordinates (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A run of text whose baseline starts at `(x, y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PagePlan {
    Cover {
        image: usize,
        frame: Rect,
        /// Top line first.
        title: Vec<PlacedText>,
        title_size: f32,
    },
    Text {
        paragraph: usize,
        font_size: f32,
        lines: Vec<PlacedText>,
    },
    Illustration {
        image: usize,
        frame: Rect,
    },
}

impl PagePlan {
    pub fn kind(&self) -> PageKind {
        match self {
            PagePlan::Cover { .. } => PageKind::Cover,
            PagePlan::Text { .. } => PageKind::Text,
            PagePlan::Illustration { .. } => PageKind::Illustration,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookPlan {
    pub pages: Vec<PagePlan>,
}

impl BookPlan {
    pub fn kinds(&self) -> Vec<PageKind> {
        self.pages.iter().map(PagePlan::kind).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Planning
// ────────────────────────────────────────────────────────────────────────────

/// Lays out the whole book.
///
/// Fails with `InvariantViolation` when `images` is not exactly
/// `[cover, paragraph_0, …]`: that means the orchestrator handed over the
/// wrong batch, and nothing is laid out.
pub fn plan_book(
    title: &str,
    paragraphs: &[String],
    images: &[GeneratedImage],
) -> Result<BookPlan, AppError> {
    if images.len() != paragraphs.len() + 1 {
        return Err(AppError::InvariantViolation(format!(
            "expected {} images for {} paragraphs, got {}",
            paragraphs.len() + 1,
            paragraphs.len(),
            images.len()
        )));
    }
    if let Some((position, image)) = images
        .iter()
        .enumerate()
        .find(|(position, image)| image.scene() != *position)
    {
        return Err(AppError::InvariantViolation(format!(
            "image at position {position} belongs to scene {}",
            image.scene()
        )));
    }

    let mut pages = Vec::with_capacity(1 + 2 * paragraphs.len());

    let (title, title_size) = plan_title(title);
    pages.push(PagePlan::Cover {
        image: 0,
        frame: fit_image(images[0].width(), images[0].height()),
        title,
        title_size,
    });

    for (i, paragraph) in paragraphs.iter().enumerate() {
        let (font_size, lines) = plan_text(i, paragraph);
        pages.push(PagePlan::Text {
            paragraph: i,
            font_size,
            lines,
        });
        pages.push(PagePlan::Illustration {
            image: i + 1,
            frame: fit_image(images[i + 1].width(), images[i + 1].height()),
        });
    }

    Ok(BookPlan { pages })
}

/// Scales an image to the largest size that fits the page without cropping or
/// distortion, centred on both axes.
pub fn fit_image(image_width: u32, image_height: u32) -> Rect {
    let (w, h) = (image_width.max(1) as f32, image_height.max(1) as f32);
    let scale = (PAGE_WIDTH_PT / w).min(PAGE_HEIGHT_PT / h);
    let (width, height) = (w * scale, h * scale);
    Rect {
        x: (PAGE_WIDTH_PT - width) / 2.0,
        y: (PAGE_HEIGHT_PT - height) / 2.0,
        width,
        height,
    }
}

/// Centres the title at a quarter of the page height, shrinking it if it would
/// run past the side margins. Below the minimum size it wraps instead, with the
/// last line on the quarter-height baseline and the others above it.
fn plan_title(title: &str) -> (Vec<PlacedText>, f32) {
    let text = title.split_whitespace().collect::<Vec<_>>().join(" ");
    let metrics = get_metrics(FontFace::HelveticaBold);
    let available = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;
    let baseline = PAGE_HEIGHT_PT / 4.0;

    let natural = metrics.measure(&text, TITLE_SIZE_PT);
    if natural <= available {
        return (vec![centred(text, natural, baseline)], TITLE_SIZE_PT);
    }

    let shrunk = TITLE_SIZE_PT * available / natural;
    if shrunk >= MIN_TITLE_SIZE_PT {
        let width = metrics.measure(&text, shrunk);
        return (vec![centred(text, width, baseline)], shrunk);
    }

    let wrapped = wrap_breaking_words(&text, metrics, MIN_TITLE_SIZE_PT, available);
    let leading = MIN_TITLE_SIZE_PT * TITLE_LEADING;
    let last = wrapped.len().saturating_sub(1);
    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(n, line)| centred(line.text, line.width, baseline + leading * (last - n) as f32))
        .collect();
    (lines, MIN_TITLE_SIZE_PT)
}

fn centred(text: String, width: f32, y: f32) -> PlacedText {
    PlacedText {
        text,
        x: (PAGE_WIDTH_PT - width) / 2.0,
        y,
    }
}

/// Wraps a paragraph into the margin box, anchored at the top. Steps the size
/// down one point at a time until the last baseline clears the bottom margin.
fn plan_text(index: usize, paragraph: &str) -> (f32, Vec<PlacedText>) {
    let metrics = get_metrics(FontFace::Helvetica);
    let box_width = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;
    let top = PAGE_HEIGHT_PT - MARGIN_PT;

    let mut size = BODY_SIZE_PT;
    loop {
        let leading = BODY_LEADING_PT * size / BODY_SIZE_PT;
        let wrapped = wrap_paragraph(
            paragraph,
            metrics,
            size,
            box_width,
            FIRST_LINE_INDENT_PT,
        );
        let last_baseline = top - size - leading * wrapped.len().saturating_sub(1) as f32;

        if last_baseline >= MARGIN_PT || size <= MIN_BODY_SIZE_PT {
            if last_baseline < MARGIN_PT {
                warn!(
                    paragraph = index,
                    lines = wrapped.len(),
                    "Paragraph overflows its page even at {MIN_BODY_SIZE_PT}pt"
                );
            }
            let lines = wrapped
                .into_iter()
                .enumerate()
                .map(|(n, line)| PlacedText {
                    text: line.text,
                    x: MARGIN_PT + line.indent,
                    y: top - size - leading * n as f32,
                })
                .collect();
            return (size, lines);
        }

        size -= 1.0;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
