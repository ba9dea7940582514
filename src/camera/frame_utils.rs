//! Frame transformation and still-image encoding.

use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgb};

use super::types::{CaptureError, Frame, FrameFormat};

/// Fixed JPEG quality for captured stills.
pub const JPEG_QUALITY: u8 = 90;

/// Encodings shorter than this are treated as degenerate.
pub const MIN_ENCODED_LEN: usize = 100;

/// Mirror a frame horizontally (flip left-right) to match a selfie preview.
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let bpp = frame.bytes_per_pixel();
    let stride = width * bpp;
    if stride == 0 {
        return;
    }

    for row in frame.data.chunks_exact_mut(stride) {
        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}

/// Encode a raw frame as JPEG at the given quality.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, CaptureError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(CaptureError::ZeroDimensions);
    }
    if !frame.is_consistent() {
        return Err(CaptureError::EncodeFailed(format!(
            "buffer holds {} bytes, expected {} for {}x{}",
            frame.data.len(),
            frame.width as usize * frame.height as usize * frame.bytes_per_pixel(),
            frame.width,
            frame.height
        )));
    }

    let image = match frame.format {
        FrameFormat::Rgb => {
            ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(frame.width, frame.height, &frame.data[..])
                .ok_or_else(|| CaptureError::EncodeFailed("invalid RGB buffer".to_string()))?
        }
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(&image)
        .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;

    if jpeg.len() < MIN_ENCODED_LEN {
        return Err(CaptureError::EncodeFailed(format!(
            "encoder produced only {} bytes",
            jpeg.len()
        )));
    }

    Ok(jpeg)
}
