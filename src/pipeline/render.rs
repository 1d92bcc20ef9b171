//! PDF rasterisation: render every page via pdfium and stage it on disk.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! Tokio workers never stall during CPU-heavy rendering.
//!
//! ## Staging
//!
//! Rendered pages are written into a run-scoped [`TempDir`] in the configured
//! [`RasterFormat`] and loaded back one at a time by the processor, so peak
//! memory holds one decoded page rather than the whole document. The
//! directory is removed when the [`RasterizedDocument`] is dropped, on every
//! exit path.

use crate::config::{OcrConfig, RasterFormat};
use crate::error::PdfOcrError;
use crate::output::DocumentInfo;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Environment variable naming a pdfium library file or its directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// PDF user space is 72 points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// One rasterised page, staged on disk.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-indexed page number in document order.
    pub index: usize,
    /// Resolution the page was rendered at.
    pub dpi: u32,
    /// Format of the staged file.
    pub format: RasterFormat,
    pub width: u32,
    pub height: u32,
    path: PathBuf,
}

impl PageImage {
    /// Location of the staged image inside the run's staging directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the staged image.
    pub fn load(&self) -> Result<DynamicImage, image::ImageError> {
        image::open(&self.path)
    }
}

/// Rasteriser parameters.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub dpi: u32,
    pub format: RasterFormat,
    pub password: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            format: RasterFormat::Png,
            password: None,
        }
    }
}

impl From<&OcrConfig> for RenderOptions {
    fn from(config: &OcrConfig) -> Self {
        Self {
            dpi: config.dpi,
            format: config.format,
            password: config.password.clone(),
        }
    }
}

/// Ordered page images plus the staging directory that backs them.
#[derive(Debug)]
pub struct RasterizedDocument {
    pages: Vec<PageImage>,
    staging: TempDir,
}

impl RasterizedDocument {
    /// Stage already-decoded page images, numbering them from 1 in the order
    /// given.
    ///
    /// Pages are flattened to opaque RGB before staging so every format
    /// (JPEG included) can hold them.
    pub fn from_images<I>(images: I, dpi: u32, format: RasterFormat) -> Result<Self, PdfOcrError>
    where
        I: IntoIterator<Item = DynamicImage>,
    {
        let staging = create_staging_dir()?;
        let pages = images
            .into_iter()
            .enumerate()
            .map(|(i, img)| stage_page(staging.path(), i + 1, &img, dpi, format))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pages, staging })
    }

    pub fn pages(&self) -> &[PageImage] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Directory holding the staged files; gone once `self` is dropped.
    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }
}

/// Rasterise every page of a PDF.
///
/// # Errors
/// Fatal, with no partial result: unreadable/corrupt PDF, missing or wrong
/// password, zero pages, a page that fails to render or stage, or no pdfium
/// library to bind to.
pub async fn render_document(
    pdf_path: &Path,
    options: &RenderOptions,
) -> Result<RasterizedDocument, PdfOcrError> {
    let path = pdf_path.to_path_buf();
    let options = options.clone();

    tokio::task::spawn_blocking(move || render_document_blocking(&path, &options))
        .await
        .map_err(|e| PdfOcrError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
fn render_document_blocking(
    pdf_path: &Path,
    options: &RenderOptions,
) -> Result<RasterizedDocument, PdfOcrError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, pdf_path, options.password.as_deref())?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    if total_pages == 0 {
        return Err(PdfOcrError::EmptyDocument {
            path: pdf_path.to_path_buf(),
        });
    }
    info!("PDF loaded: {} pages, rendering at {} DPI", total_pages, options.dpi);

    let staging = create_staging_dir()?;
    let mut staged = Vec::with_capacity(total_pages);

    for (i, page) in pages.iter().enumerate() {
        let index = i + 1;

        // pdfium reports the crop box size; scaling it keeps the full page
        // geometry with no clipping and no size cap.
        let render_config = PdfRenderConfig::new()
            .set_target_width(target_pixels(page.width().value, options.dpi))
            .set_target_height(target_pixels(page.height().value, options.dpi));

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            PdfOcrError::RasterisationFailed {
                page: index,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index,
            image.width(),
            image.height()
        );

        staged.push(stage_page(
            staging.path(),
            index,
            &image,
            options.dpi,
            options.format,
        )?);
    }

    Ok(RasterizedDocument {
        pages: staged,
        staging,
    })
}

/// Read page count and PDF version without rendering.
pub async fn inspect_document(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentInfo, PdfOcrError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = load_document(&pdfium, &path, pwd.as_deref())?;
        let page_count = document.pages().len() as usize;
        let pdf_version = format!("{:?}", document.version());
        Ok(DocumentInfo {
            page_count,
            pdf_version,
        })
    })
    .await
    .map_err(|e| PdfOcrError::Internal(format!("Inspect task panicked: {}", e)))?
}

/// Bind to a pdfium library.
///
/// Search order: `PDFIUM_LIB_PATH` (file or directory), the current
/// directory, then the system library path.
pub fn bind_pdfium() -> Result<Pdfium, PdfOcrError> {
    let bindings = match std::env::var_os(PDFIUM_LIB_PATH_ENV) {
        Some(configured) => {
            let configured = PathBuf::from(configured);
            let lib = if configured.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&configured)
            } else {
                configured
            };
            Pdfium::bind_to_library(lib)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| PdfOcrError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, PdfOcrError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                PdfOcrError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                PdfOcrError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            PdfOcrError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Pixel length of `points` at `dpi`, never less than one pixel.
pub(crate) fn target_pixels(points: f32, dpi: u32) -> i32 {
    ((points * dpi as f32 / POINTS_PER_INCH).round() as i32).max(1)
}

fn create_staging_dir() -> Result<TempDir, PdfOcrError> {
    tempfile::Builder::new()
        .prefix("pdf-ocr-")
        .tempdir()
        .map_err(|e| PdfOcrError::StagingFailed {
            page: 0,
            detail: format!("cannot create staging directory: {e}"),
        })
}

fn stage_page(
    dir: &Path,
    index: usize,
    image: &DynamicImage,
    dpi: u32,
    format: RasterFormat,
) -> Result<PageImage, PdfOcrError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let path = dir.join(format!("page-{index:04}.{}", format.extension()));

    rgb.save_with_format(&path, format.image_format())
        .map_err(|e| PdfOcrError::StagingFailed {
            page: index,
            detail: e.to_string(),
        })?;

    Ok(PageImage {
        index,
        dpi,
        format,
        width: rgb.width(),
        height: rgb.height(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn blank(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([200, 30, 30, 255])))
    }

    #[test]
    fn target_pixels_scales_with_dpi() {
        // US Letter width: 612 pt = 8.5 in.
        assert_eq!(target_pixels(612.0, 72), 612);
        assert_eq!(target_pixels(612.0, 300), 2550);
        assert_eq!(target_pixels(612.0, 600), 5100);
        assert_eq!(target_pixels(0.1, 72), 1);
    }

    #[test]
    fn staged_pages_are_numbered_from_one_in_order() {
        let doc = RasterizedDocument::from_images(
            vec![blank(4, 4), blank(5, 5), blank(6, 6)],
            300,
            RasterFormat::Png,
        )
        .unwrap();

        let indices: Vec<usize> = doc.pages().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(doc.pages()[2].width, 6);
        for page in doc.pages() {
            assert!(page.path().starts_with(doc.staging_dir()));
            assert_eq!(page.dpi, 300);
        }
    }

    #[test]
    fn every_format_round_trips_dimensions() {
        for format in [RasterFormat::Png, RasterFormat::Jpeg, RasterFormat::Tiff] {
            let doc = RasterizedDocument::from_images(vec![blank(9, 7)], 150, format).unwrap();
            let page = &doc.pages()[0];
            assert_eq!(page.format, format);
            assert!(page.path().extension().is_some());
            let img = page.load().unwrap();
            assert_eq!((img.width(), img.height()), (9, 7), "format {format}");
        }
    }

    #[test]
    fn staging_dir_is_removed_on_drop() {
        let doc = RasterizedDocument::from_images(vec![blank(2, 2)], 72, RasterFormat::Png).unwrap();
        let dir = doc.staging_dir().to_path_buf();
        assert!(dir.exists());
        drop(doc);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn render_real_pdf_when_pdfium_available() {
        // Needs libpdfium and a fixture path; skipped otherwise.
        let Ok(pdf) = std::env::var("PDFIUM_TEST_PDF") else {
            println!("SKIP — set PDFIUM_TEST_PDF=/path/to/file.pdf to run");
            return;
        };
        let low = render_document(Path::new(&pdf), &RenderOptions { dpi: 72, ..Default::default() })
            .await
            .expect("render at 72 dpi");
        let high = render_document(Path::new(&pdf), &RenderOptions { dpi: 144, ..Default::default() })
            .await
            .expect("render at 144 dpi");

        assert_eq!(low.len(), high.len());
        for (a, b) in low.pages().iter().zip(high.pages()) {
            assert_eq!(a.index, b.index);
            assert!(b.width > a.width);
        }
    }
}
