use base64::{engine::general_purpose, Engine as _};
use image::DynamicImage;

use crate::error::DecodeError;

/// Decodes the base64 text of a frame into the raw compressed image bytes.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(general_purpose::STANDARD.decode(payload.as_bytes())?)
}

/// Decodes a frame payload into a raster image.
///
/// The device sends JPEG, but any format `image` can sniff is accepted.
pub fn decode_frame(payload: &str) -> Result<DynamicImage, DecodeError> {
    let bytes = decode_payload(payload)?;
    Ok(image::load_from_memory(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 8) as u8, (y * 8) as u8, 128])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .expect("Failed to encode JPEG");
        bytes
    }

    #[test]
    fn test_decode_payload_round_trip() {
        let bytes = jpeg_bytes(16, 8);
        let payload = general_purpose::STANDARD.encode(&bytes);

        let decoded = decode_payload(&payload).unwrap();
        assert_eq!(decoded, bytes);
        assert_eq!(general_purpose::STANDARD.encode(&decoded), payload);
    }

    #[test]
    fn test_decode_frame_keeps_dimensions() {
        let payload = general_purpose::STANDARD.encode(jpeg_bytes(24, 10));
        let img = decode_frame(&payload).unwrap();
        assert_eq!((img.width(), img.height()), (24, 10));
    }

    #[test]
    fn test_decode_frame_rejects_bad_base64() {
        let err = decode_frame("not*base64!").unwrap_err();
        assert!(matches!(err, DecodeError::Base64(_)));
    }

    #[test]
    fn test_decode_frame_rejects_non_image() {
        let payload = general_purpose::STANDARD.encode(b"hello, not a jpeg");
        let err = decode_frame(&payload).unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
    }
}
