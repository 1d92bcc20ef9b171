//! Image encoding: staged page → base64 PNG for the request body.
//!
//! Whatever format the rasteriser staged a page in, it goes over the wire as
//! PNG. Lossless compression keeps glyph edges crisp; JPEG artefacts on
//! rendered text measurably hurt vision-model transcription.

use crate::error::PageError;
use crate::pipeline::render::PageImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// MIME type of every transported page image.
pub const TRANSPORT_MIME: &str = "image/png";

/// A page image ready for inline transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    /// Base64 (standard alphabet, padded) of the PNG bytes.
    pub data: String,
}

impl EncodedImage {
    /// `data:` URI accepted by OpenAI-compatible `image_url` parts.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Encode an in-memory image as base64 PNG.
pub fn encode_image(img: &DynamicImage) -> Result<EncodedImage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let data = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes PNG, {} bytes base64", buf.len(), data.len());

    Ok(EncodedImage {
        mime_type: TRANSPORT_MIME,
        data,
    })
}

/// Load a staged page and encode it for transport.
pub fn encode_page(page: &PageImage) -> Result<EncodedImage, PageError> {
    let img = page.load().map_err(|e| PageError::EncodeFailed {
        page: page.index,
        detail: format!("cannot read staged {} image: {e}", page.format),
    })?;
    encode_image(&img).map_err(|e| PageError::EncodeFailed {
        page: page.index,
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RasterFormat;
    use crate::pipeline::render::RasterizedDocument;
    use image::{Rgba, RgbaImage};

    fn red(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn encode_small_image() {
        let data = encode_image(&red(10, 10)).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(&decoded[1..4], b"PNG");
    }

    #[test]
    fn data_url_prefix() {
        let data = encode_image(&red(2, 2)).unwrap();
        let url = data.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        assert!(url.ends_with(&data.data));
    }

    #[test]
    fn jpeg_staged_page_is_sent_as_png() {
        let doc = RasterizedDocument::from_images(vec![red(8, 8)], 300, RasterFormat::Jpeg).unwrap();
        let encoded = encode_page(&doc.pages()[0]).unwrap();
        let bytes = STANDARD.decode(&encoded.data).unwrap();
        let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).unwrap();
        assert_eq!((img.width(), img.height()), (8, 8));
    }

    #[test]
    fn missing_staged_file_is_a_page_error() {
        let doc = RasterizedDocument::from_images(vec![red(3, 3)], 72, RasterFormat::Png).unwrap();
        let page = doc.pages()[0].clone();
        std::fs::remove_file(page.path()).unwrap();
        match encode_page(&page) {
            Err(PageError::EncodeFailed { page, .. }) => assert_eq!(page, 1),
            other => panic!("expected EncodeFailed, got {other:?}"),
        }
    }

    #[test]
    fn higher_resolution_means_larger_payload() {
        let small = encode_image(&DynamicImage::ImageRgba8(RgbaImage::from_fn(50, 50, |x, y| {
            Rgba([(x * 5) as u8, (y * 5) as u8, 0, 255])
        })))
        .unwrap();
        let large = encode_image(&DynamicImage::ImageRgba8(RgbaImage::from_fn(200, 200, |x, y| {
            Rgba([x as u8, y as u8, 0, 255])
        })))
        .unwrap();
        assert!(large.data.len() > small.data.len());
    }
}
