//! Environment map decoding (Radiance HDR, OpenEXR) to RGBA16F.

use half::f16;

use crate::errors::LoadError;
use crate::scene::EnvironmentTexture;

/// Decodes `bytes` into an environment texture.
///
/// A known file `extension` selects the decoder; otherwise the format is
/// sniffed from the bytes. CPU bound; run it on a blocking thread.
pub fn decode_environment(
    uri: &str,
    bytes: &[u8],
    extension: Option<&str>,
) -> Result<EnvironmentTexture, LoadError> {
    let decoded = match extension.and_then(image::ImageFormat::from_extension) {
        Some(format) => image::load_from_memory_with_format(bytes, format),
        None => image::load_from_memory(bytes),
    };
    let img = decoded.map_err(|e| match e {
        image::ImageError::Unsupported(_) => LoadError::Unsupported {
            uri: uri.to_string(),
            reason: e.to_string(),
        },
        _ => LoadError::Decode {
            uri: uri.to_string(),
            reason: format!("Failed to decode HDR: {e}"),
        },
    })?;

    let width = img.width();
    let height = img.height();
    let rgb32f = img.into_rgb32f();

    // RGB32F -> RGBA16F for the GPU
    let mut data = Vec::with_capacity(width as usize * height as usize * 4 * 2);
    let alpha = f16::ONE.to_le_bytes();
    for pixel in rgb32f.pixels() {
        for &channel in &pixel.0 {
            data.extend_from_slice(&f16::from_f32(channel).to_le_bytes());
        }
        data.extend_from_slice(&alpha);
    }

    EnvironmentTexture::new(uri, width, height, data).ok_or_else(|| LoadError::Decode {
        uri: uri.to_string(),
        reason: format!("Empty environment image ({width}x{height})"),
    })
}
