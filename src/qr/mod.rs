use image::{ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;
use thiserror::Error;

use crate::types::CheckInCode;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Render a guest's check-in code as a PNG
pub fn render_png(code: &CheckInCode, module_pixels: u32) -> Result<Vec<u8>, QrError> {
    let qr = QrCode::new(code.to_string().as_bytes())?;
    let image = qr
        .render::<Luma<u8>>()
        .module_dimensions(module_pixels.max(1), module_pixels.max(1))
        .quiet_zone(true)
        .build();

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
