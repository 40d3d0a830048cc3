//! QR code rasterisation for experiment links.

use image::{GrayImage, Luma};
use qrcode::QrCode;
use tracing::warn;

/// Minimum edge length of a generated code, in pixels.
pub const QR_MIN_PIXELS: u32 = 160;

/// Rasterise `text` as a greyscale QR code.
///
/// Returns `None` for blank input or when the text cannot be encoded (too
/// long for the largest QR version); the caller leaves the cell empty.
#[must_use]
pub fn qr_image(text: &str) -> Option<GrayImage> {
    if text.is_empty() {
        return None;
    }
    match QrCode::new(text.as_bytes()) {
        Ok(code) => Some(
            code.render::<Luma<u8>>()
                .min_dimensions(QR_MIN_PIXELS, QR_MIN_PIXELS)
                .build(),
        ),
        Err(e) => {
            warn!("Skipping QR code for {} byte link: {e}", text.len());
            None
        }
    }
}
