//! PDF serialisation of a `BookPlan` with `lopdf`.
//!
//! Fonts are the standard-14 Helvetica faces with WinAnsi encoding, so nothing is
//! embedded and the widths in `font_metrics` are the ones viewers use. Images are
//! raw RGB XObjects; every stream is Flate-compressed on save. No timestamps or
//! random IDs are written, so identical inputs give identical bytes.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::book::font_metrics::FontFace;
use crate::book::plan::{
    plan_book, BookPlan, PageKind, PagePlan, PlacedText, Rect, Rgb, CREAM, INK, PAGE_HEIGHT_PT,
    PAGE_WIDTH_PT, TITLE_COLOR, TITLE_OPACITY,
};
use crate::errors::AppError;
use crate::illustration::GeneratedImage;

const IMAGE_NAME: &str = "Im0";
const TITLE_ALPHA_NAME: &str = "GS1";
const PRODUCER: &str = "fabrica-api";

/// A finished book: PDF bytes plus the kind of each page, in order.
#[derive(Debug, Clone)]
pub struct RenderedBook {
    pub bytes: Vec<u8>,
    pub pages: Vec<PageKind>,
}

/// Lays out and renders the book. Checks the image/paragraph contract before
/// anything is written. CPU-bound: call from the blocking pool.
pub fn render_book(
    title: &str,
    paragraphs: &[String],
    images: &[GeneratedImage],
) -> Result<RenderedBook, AppError> {
    let plan = plan_book(title, paragraphs, images)?;
    let bytes = write_pdf(title, &plan, images)?;
    Ok(RenderedBook {
        bytes,
        pages: plan.kinds(),
    })
}

fn write_pdf(title: &str, plan: &BookPlan, images: &[GeneratedImage]) -> Result<Vec<u8>, AppError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let body_font = doc.add_object(font_dict(FontFace::Helvetica));
    let title_font = doc.add_object(font_dict(FontFace::HelveticaBold));
    let title_alpha = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => TITLE_OPACITY,
    });

    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(plan.pages.len());
    for page in &plan.pages {
        let mut resources = Dictionary::new();
        let operations = match page {
            PagePlan::Cover {
                image,
                frame,
                title,
                title_size,
            } => {
                let image_id = doc.add_object(image_xobject(&images[*image]));
                resources.set("XObject", dictionary! { IMAGE_NAME => image_id });
                resources.set(
                    "Font",
                    dictionary! { FontFace::HelveticaBold.resource_name() => title_font },
                );
                resources.set("ExtGState", dictionary! { TITLE_ALPHA_NAME => title_alpha });

                let mut ops = draw_image(frame);
                ops.extend(draw_title(title, *title_size));
                ops
            }
            PagePlan::Text {
                font_size, lines, ..
            } => {
                resources.set(
                    "Font",
                    dictionary! { FontFace::Helvetica.resource_name() => body_font },
                );
                draw_text_page(lines, *font_size)
            }
            PagePlan::Illustration { image, frame } => {
                let image_id = doc.add_object(image_xobject(&images[*image]));
                resources.set("XObject", dictionary! { IMAGE_NAME => image_id });
                draw_image(frame)
            }
        };

        let content = Content { operations }
            .encode()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF content encoding failed: {e}")))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box(),
            "Contents" => content_id,
            "Resources" => resources,
        });
        page_ids.push(page_id);
    }

    let page_count = page_ids.len() as i64;
    let kids: Vec<Object> = page_ids.into_iter().map(Object::Reference).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => media_box(),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(utf16_text(title), StringFormat::Hexadecimal),
        "Producer" => Object::string_literal(PRODUCER),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF serialisation failed: {e}")))?;
    Ok(bytes)
}

// ────────────────────────────────────────────────────────────────────────────
// Objects
// ────────────────────────────────────────────────────────────────────────────

fn font_dict(face: FontFace) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => face.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn image_xobject(image: &GeneratedImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        },
        image.rgb().to_vec(),
    )
}

fn media_box() -> Vec<Object> {
    vec![0.0_f32.into(), 0.0_f32.into(), PAGE_WIDTH_PT.into(), PAGE_HEIGHT_PT.into()]
}

// ────────────────────────────────────────────────────────────────────────────
// Content streams
// ────────────────────────────────────────────────────────────────────────────

fn draw_image(frame: &Rect) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                frame.width.into(),
                0.0_f32.into(),
                0.0_f32.into(),
                frame.height.into(),
                frame.x.into(),
                frame.y.into(),
            ],
        ),
        Operation::new("Do", vec![name(IMAGE_NAME)]),
        Operation::new("Q", vec![]),
    ]
}

fn draw_title(lines: &[PlacedText], size: f32) -> Vec<Operation> {
    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![name(TITLE_ALPHA_NAME)]),
        fill_color(TITLE_COLOR),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![name(FontFace::HelveticaBold.resource_name()), size.into()],
        ),
    ];
    for line in lines {
        ops.push(move_to(line));
        ops.push(show_text(&line.text));
    }
    ops.push(Operation::new("ET", vec![]));
    ops.push(Operation::new("Q", vec![]));
    ops
}

fn draw_text_page(lines: &[PlacedText], size: f32) -> Vec<Operation> {
    let mut ops = vec![
        Operation::new("q", vec![]),
        fill_color(CREAM),
        Operation::new(
            "re",
            vec![
                0.0_f32.into(),
                0.0_f32.into(),
                PAGE_WIDTH_PT.into(),
                PAGE_HEIGHT_PT.into(),
            ],
        ),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
        fill_color(INK),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![name(FontFace::Helvetica.resource_name()), size.into()],
        ),
    ];
    for line in lines {
        ops.push(move_to(line));
        ops.push(show_text(&line.text));
    }
    ops.push(Operation::new("ET", vec![]));
    ops
}

fn fill_color(Rgb(r, g, b): Rgb) -> Operation {
    Operation::new("rg", vec![r.into(), g.into(), b.into()])
}

/// Absolute text matrix: baseline origin at `(x, y)`.
fn move_to(text: &PlacedText) -> Operation {
    Operation::new(
        "Tm",
        vec![
            1.0_f32.into(),
            0.0_f32.into(),
            0.0_f32.into(),
            1.0_f32.into(),
            text.x.into(),
            text.y.into(),
        ],
    )
}

fn show_text(text: &str) -> Operation {
    Operation::new(
        "Tj",
        vec![Object::String(win_ansi(text), StringFormat::Literal)],
    )
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

// ────────────────────────────────────────────────────────────────────────────
// Text encodings
// ────────────────────────────────────────────────────────────────────────────

/// Encodes text for a WinAnsi simple font. Characters outside the code page
/// become `?`.
pub(crate) fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}

/// UTF-16BE with byte-order mark, for document info strings.
fn utf16_text(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
