//! Greedy word wrap for body text.
//!
//! Same algorithm as a typewriter: words are placed left to right and a word that
//! would cross the right edge starts a new line. Runs of whitespace collapse to
//! one space. A single word wider than the line gets a line of its own and is
//! allowed to overflow; it is never split.

use crate::book::font_metrics::FontMetricTable;

/// One laid-out line of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    /// Horizontal offset from the left edge of the text box, in points.
    pub indent: f32,
    /// Rendered width of `text` in points.
    pub width: f32,
}

/// Wraps `text` into lines no wider than `max_width` points.
///
/// The first line starts `first_line_indent` points in and has that much less
/// room. An empty or all-whitespace paragraph yields no lines.
pub fn wrap_paragraph(
    text: &str,
    metrics: &FontMetricTable,
    size_pt: f32,
    max_width: f32,
    first_line_indent: f32,
) -> Vec<WrappedLine> {
    let space_w = metrics.space_width(size_pt);
    let mut lines: Vec<WrappedLine> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in text.split_whitespace() {
        let word_w = metrics.measure(word, size_pt);
        let indent = if lines.is_empty() {
            first_line_indent
        } else {
            0.0
        };

        if current.is_empty() {
            current.push_str(word);
            current_width = word_w;
        } else if indent + current_width + space_w + word_w > max_width {
            // Current line is full: close it and start the next with this word.
            lines.push(WrappedLine {
                text: std::mem::take(&mut current),
                indent,
                width: current_width,
            });
            current.push_str(word);
            current_width = word_w;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += space_w + word_w;
        }
    }

    if !current.is_empty() {
        let indent = if lines.is_empty() {
            first_line_indent
        } else {
            0.0
        };
        lines.push(WrappedLine {
            text: current,
            indent,
            width: current_width,
        });
    }

    lines
}

/// Wraps `text` into lines no wider than `max_width` points, with no indent.
///
/// Unlike `wrap_paragraph`, a word wider than the line is broken between
/// characters, so every returned line fits.
pub fn wrap_breaking_words(
    text: &str,
    metrics: &FontMetricTable,
    size_pt: f32,
    max_width: f32,
) -> Vec<WrappedLine> {
    let space_w = metrics.space_width(size_pt);
    let mut lines: Vec<WrappedLine> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    let mut flush = |current: &mut String, current_width: &mut f32| {
        if !current.is_empty() {
            lines.push(WrappedLine {
                text: std::mem::take(current),
                indent: 0.0,
                width: std::mem::take(current_width),
            });
        }
    };

    for word in text.split_whitespace() {
        let word_w = metrics.measure(word, size_pt);

        if word_w > max_width {
            flush(&mut current, &mut current_width);
            for c in word.chars() {
                let char_w = metrics.char_width(c) as f32 * size_pt / 1000.0;
                if !current.is_empty() && current_width + char_w > max_width {
                    flush(&mut current, &mut current_width);
                }
                current.push(c);
                current_width += char_w;
            }
        } else if current.is_empty() {
            current.push_str(word);
            current_width = word_w;
        } else if current_width + space_w + word_w > max_width {
            flush(&mut current, &mut current_width);
            current.push_str(word);
            current_width = word_w;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += space_w + word_w;
        }
    }
    flush(&mut current, &mut current_width);

    lines
}
