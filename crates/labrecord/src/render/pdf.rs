//! PDF backend: draws a [`DocumentLayout`] with `printpdf`.
//!
//! Layout works top-down in millimetres; PDF user space grows upwards from
//! the bottom-left corner, so every `y` is flipped against the page height.

use std::path::Path;

use image::RgbImage;
use printpdf::{
    Actions, BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, LinkAnnotation, Mm, PdfDocument, PdfLayerReference, Point, Px, Rect,
    Rgb,
};
use tracing::{debug, warn};

use super::layout::{
    layout_document, Align, DocumentLayout, DrawOp, LayoutOptions, PageLayout, TextOp,
    PAGE_HEIGHT_MM, PAGE_WIDTH_MM, ROWS_PER_PAGE,
};
use super::metrics::{text_width_mm, FontFace, PT_PER_MM};
use super::qr::qr_image;
use super::{DocumentFormat, DocumentRenderer, Pagination, RenderedDocument};
use crate::config::{DocumentConfig, DEFAULT_CONFIRMATION_STATEMENT};
use crate::error::{Error, Result};
use crate::model::FormSnapshot;

const DOCUMENT_TITLE: &str = "Lab Record";
const LAYER_NAME: &str = "Layer 1";
const MM_PER_INCH: f32 = 25.4;
/// Table border width in points (about 0.2 mm).
const BORDER_THICKNESS_PT: f32 = 0.57;

/// Renders the paginated lab record as PDF.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    logo: Option<RgbImage>,
    confirmation_statement: String,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRMATION_STATEMENT)
    }
}

impl PdfRenderer {
    /// Create a renderer without a logo.
    #[must_use]
    pub fn new(confirmation_statement: impl Into<String>) -> Self {
        Self {
            logo: None,
            confirmation_statement: confirmation_statement.into(),
        }
    }

    /// Create a renderer from the `[document]` config section.
    ///
    /// A logo that cannot be read is logged and left out.
    #[must_use]
    pub fn from_config(config: &DocumentConfig) -> Self {
        let renderer = Self::new(config.confirmation_statement.clone());
        match &config.logo_path {
            Some(path) => match load_logo(path) {
                Some(logo) => renderer.with_logo(logo),
                None => renderer,
            },
            None => renderer,
        }
    }

    /// Use `logo` above the title on the first page.
    #[must_use]
    pub fn with_logo(mut self, logo: RgbImage) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Whether a logo is loaded.
    #[must_use]
    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }

    /// Compute the page layout without producing PDF bytes.
    #[must_use]
    pub fn layout(&self, snapshot: &FormSnapshot) -> DocumentLayout {
        layout_document(
            snapshot,
            LayoutOptions {
                logo: self.logo.is_some(),
                confirmation_statement: &self.confirmation_statement,
            },
        )
    }

    fn draw_page(&self, layer: &PdfLayerReference, fonts: &Fonts, page: &PageLayout) {
        layer.set_outline_thickness(BORDER_THICKNESS_PT);
        layer.set_outline_color(rgb((0, 0, 0)));

        for op in &page.ops {
            match op {
                DrawOp::Text(text) => draw_text(layer, fonts, text),
                DrawOp::Rect {
                    x,
                    y,
                    width,
                    height,
                } => draw_rect(layer, *x, *y, *width, *height),
                DrawOp::Logo {
                    x,
                    y,
                    width,
                    height,
                } => {
                    if let Some(logo) = &self.logo {
                        draw_logo(layer, logo, *x, *y, *width, *height);
                    }
                }
                DrawOp::QrCode {
                    experiment,
                    payload,
                    x,
                    y,
                    size,
                } => match qr_image(payload) {
                    Some(code) => draw_qr(layer, &code, *x, *y, *size),
                    None => debug!("No QR code drawn for experiment {}", experiment + 1),
                },
            }
        }
    }
}

impl DocumentRenderer for PdfRenderer {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn pagination(&self) -> Pagination {
        Pagination::Paginated {
            rows_per_page: ROWS_PER_PAGE,
        }
    }

    fn render(&self, snapshot: &FormSnapshot) -> Result<RenderedDocument> {
        let layout = self.layout(snapshot);
        let title = if snapshot.course_title.is_empty() {
            DOCUMENT_TITLE
        } else {
            snapshot.course_title.as_str()
        };

        let (doc, first_page, first_layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        let fonts = Fonts {
            regular: doc
                .add_builtin_font(BuiltinFont::TimesRoman)
                .map_err(|e| Error::pdf(e.to_string()))?,
            bold: doc
                .add_builtin_font(BuiltinFont::TimesBold)
                .map_err(|e| Error::pdf(e.to_string()))?,
        };

        for (index, page) in layout.pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) =
                    doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
                doc.get_page(page_index).get_layer(layer_index)
            };
            self.draw_page(&layer, &fonts, page);
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| Error::pdf(e.to_string()))?;

        debug!(
            "Rendered PDF: {} experiment(s), {} page(s), {} bytes",
            snapshot.experiments.len(),
            layout.page_count(),
            bytes.len()
        );
        Ok(RenderedDocument::new(
            DocumentFormat::Pdf,
            bytes,
            Some(layout.page_count()),
        ))
    }
}

#[derive(Debug)]
struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, face: FontFace) -> &IndirectFontRef {
        match face {
            FontFace::Regular => &self.regular,
            FontFace::Bold => &self.bold,
        }
    }
}

/// Read a logo image, compositing any transparency onto white.
fn load_logo(path: &Path) -> Option<RgbImage> {
    match image::open(path) {
        Ok(img) => {
            let rgba = img.to_rgba8();
            let mut rgb_image = RgbImage::new(rgba.width(), rgba.height());
            for (x, y, pixel) in rgba.enumerate_pixels() {
                let [r, g, b, a] = pixel.0;
                let blend = |c: u8| -> u8 {
                    let alpha = u16::from(a);
                    let value = (u16::from(c) * alpha + 255 * (255 - alpha)) / 255;
                    u8::try_from(value).unwrap_or(u8::MAX)
                };
                rgb_image.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
            }
            debug!("Loaded logo {} ({}x{})", path.display(), rgba.width(), rgba.height());
            Some(rgb_image)
        }
        Err(e) => {
            warn!("Logo {} not loaded, leaving space blank: {e}", path.display());
            None
        }
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn flip(y: f32) -> f32 {
    PAGE_HEIGHT_MM - y
}

/// Layout has already folded `op.text` to ASCII, which the built-in fonts encode.
fn draw_text(layer: &PdfLayerReference, fonts: &Fonts, op: &TextOp) {
    let width = text_width_mm(&op.text, op.face, op.size);
    let left = match op.align {
        Align::Left => op.x,
        Align::Center => op.x - width / 2.0,
        Align::Right => op.x - width,
    };

    layer.set_fill_color(rgb(op.color));
    layer.use_text(
        op.text.as_str(),
        op.size,
        Mm(left),
        Mm(flip(op.y)),
        fonts.get(op.face),
    );

    if let Some(url) = &op.link {
        let height = op.size / PT_PER_MM;
        let annotation = LinkAnnotation::new(
            Rect::new(
                Mm(left),
                Mm(flip(op.y) - 0.25 * height),
                Mm(left + width),
                Mm(flip(op.y) + 0.8 * height),
            ),
            None,
            None,
            Actions::uri(url.clone()),
            None,
        );
        layer.add_link_annotation(annotation);
    }
}

fn draw_rect(layer: &PdfLayerReference, x: f32, y: f32, width: f32, height: f32) {
    let top = flip(y);
    let bottom = flip(y + height);
    let points = vec![
        (Point::new(Mm(x), Mm(top)), false),
        (Point::new(Mm(x + width), Mm(top)), false),
        (Point::new(Mm(x + width), Mm(bottom)), false),
        (Point::new(Mm(x), Mm(bottom)), false),
    ];
    layer.add_line(Line {
        points,
        is_closed: true,
    });
}

#[allow(clippy::cast_precision_loss)]
fn draw_qr(layer: &PdfLayerReference, code: &image::GrayImage, x: f32, y: f32, size: f32) {
    let (width_px, height_px) = code.dimensions();
    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Greyscale,
        bits_per_component: ColorBits::Bit8,
        interpolate: false,
        image_data: code.as_raw().clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // dpi chosen so the pixel width maps to exactly `size` millimetres.
    let dpi = width_px as f32 / (size / MM_PER_INCH);
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(flip(y + size))),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}

#[allow(clippy::cast_precision_loss)]
fn draw_logo(layer: &PdfLayerReference, logo: &RgbImage, x: f32, y: f32, width: f32, height: f32) {
    let (width_px, height_px) = logo.dimensions();
    if width_px == 0 || height_px == 0 {
        return;
    }
    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: logo.as_raw().clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // Stretch to the fixed logo box: dpi fixes the width, scale_y the height.
    let dpi = width_px as f32 / (width / MM_PER_INCH);
    let natural_height = height_px as f32 / dpi * MM_PER_INCH;
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(flip(y + height))),
            dpi: Some(dpi),
            scale_y: Some(height / natural_height),
            ..Default::default()
        },
    );
}
