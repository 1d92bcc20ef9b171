//! Page OCR processor: one request per page, one record per page.
//!
//! Each page is handled on its own: encode → request → backend call bounded
//! by a timeout. The outcome is a plain `Result<OcrResponse, PageError>`,
//! folded into a [`PageResult`] at the page boundary, so a failing page
//! becomes a failure-marked record and never stops the run.
//!
//! With `concurrency == 1` pages go strictly one after another. Larger
//! values use `StreamExt::buffered`, which polls up to `n` pages at once but
//! yields results in input order, so the document is always in page order.

use crate::backend::{OcrBackend, OcrResponse};
use crate::config::OcrConfig;
use crate::error::PageError;
use crate::output::{OcrDocument, PageResult};
use crate::pipeline::encode;
use crate::pipeline::render::{PageImage, RasterizedDocument};
use crate::pipeline::request::OcrRequest;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Runs OCR over rasterised pages with a fixed backend and config.
pub struct PageProcessor {
    backend: Arc<dyn OcrBackend>,
    config: OcrConfig,
}

impl PageProcessor {
    pub fn new(backend: Arc<dyn OcrBackend>, config: &OcrConfig) -> Self {
        Self {
            backend,
            config: config.clone(),
        }
    }

    /// OCR every page of a rasterised document.
    pub async fn process_document(&self, document: &RasterizedDocument) -> OcrDocument {
        self.process_pages(document.pages()).await
    }

    /// OCR `pages` and return one [`PageResult`] per page, in the same order.
    pub async fn process_pages(&self, pages: &[PageImage]) -> OcrDocument {
        let total = pages.len();
        let start = Instant::now();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_run_start(total);
        }

        let results: Vec<PageResult> = if self.config.concurrency <= 1 {
            let mut results = Vec::with_capacity(total);
            for page in pages {
                results.push(self.process_page(page, total).await);
            }
            results
        } else {
            stream::iter(pages.iter().map(|page| self.process_page(page, total)))
                .buffered(self.config.concurrency)
                .collect()
                .await
        };

        let document = OcrDocument::new(results);
        let ok = document.success_count();
        info!(
            "OCR complete via {}: {}/{} pages in {}ms",
            self.backend.name(),
            ok,
            total,
            start.elapsed().as_millis()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_run_complete(total, ok);
        }
        document
    }

    /// OCR a single page. Never fails: errors are recorded in the result.
    pub async fn process_page(&self, page: &PageImage, total_pages: usize) -> PageResult {
        let index = page.index;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_page_start(index, total_pages);
        }

        let start = Instant::now();
        let result = match self.ocr_page(page).await {
            Ok(response) => {
                debug!(
                    "Page {}: {} chars in {}ms",
                    index,
                    response.text.chars().count(),
                    start.elapsed().as_millis()
                );
                let raw = if self.config.include_raw_response {
                    response.raw
                } else {
                    String::new()
                };
                PageResult::success(index, response.text, raw)
            }
            Err(e) => {
                warn!("Page {}: OCR failed: {}", index, e);
                PageResult::failure(index, e)
            }
        };

        if let Some(ref cb) = self.config.progress_callback {
            match &result.error {
                None => cb.on_page_complete(index, total_pages, &result.text),
                Some(e) => cb.on_page_error(index, total_pages, &e.to_string()),
            }
        }
        result
    }

    async fn ocr_page(&self, page: &PageImage) -> Result<OcrResponse, PageError> {
        let image = encode::encode_page(page)?;
        let request = OcrRequest::new(page.index, image, &self.config);

        let secs = self.config.api_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), self.backend.complete(&request)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(PageError::Timeout {
                page: page.index,
                secs,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RasterFormat;
    use crate::progress::OcrProgressCallback;
    use async_trait::async_trait;
    use image::{DynamicImage, Rgba, RgbaImage};
    use std::sync::Mutex;

    /// Echoes "page N", fails pages listed in `fail`, sleeps `delay(N)`.
    struct Scripted {
        fail: Vec<usize>,
        delay_ms: fn(usize) -> u64,
        calls: Mutex<Vec<usize>>,
    }

    impl Scripted {
        fn new(fail: Vec<usize>) -> Self {
            Self {
                fail,
                delay_ms: |_| 0,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OcrBackend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &OcrRequest) -> Result<OcrResponse, PageError> {
            self.calls.lock().unwrap().push(request.page);
            let delay = (self.delay_ms)(request.page);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if self.fail.contains(&request.page) {
                return Err(PageError::Service {
                    page: request.page,
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(OcrResponse {
                text: format!("page {}", request.page),
                raw: format!("{{\"page\":{}}}", request.page),
            })
        }
    }

    fn document(n: usize) -> RasterizedDocument {
        let images = (0..n).map(|i| {
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(4 + i as u32, 4, Rgba([0, 0, 0, 255])))
        });
        RasterizedDocument::from_images(images, 72, RasterFormat::Png).unwrap()
    }

    fn indices(doc: &OcrDocument) -> Vec<usize> {
        doc.pages.iter().map(|p| p.index).collect()
    }

    #[tokio::test]
    async fn one_record_per_page_in_order() {
        let backend = Arc::new(Scripted::new(vec![]));
        let processor = PageProcessor::new(backend.clone(), &OcrConfig::default());
        let out = processor.process_document(&document(5)).await;

        assert_eq!(indices(&out), vec![1, 2, 3, 4, 5]);
        assert_eq!(out.pages[2].text, "page 3");
        assert_eq!(out.pages[2].raw_response, "{\"page\":3}");
        assert_eq!(*backend.calls.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn failed_page_is_recorded_not_dropped() {
        let backend = Arc::new(Scripted::new(vec![2]));
        let processor = PageProcessor::new(backend, &OcrConfig::default());
        let out = processor.process_document(&document(3)).await;

        assert_eq!(indices(&out), vec![1, 2, 3]);
        assert!(out.pages[0].is_ok());
        assert!(!out.pages[1].is_ok());
        assert!(out.pages[1].text.contains("HTTP 500"));
        assert!(out.pages[2].is_ok());
        assert_eq!(out.failed_pages(), vec![2]);
    }

    #[tokio::test]
    async fn every_page_failing_still_yields_full_document() {
        let backend = Arc::new(Scripted::new(vec![1, 2, 3, 4]));
        let processor = PageProcessor::new(backend, &OcrConfig::default());
        let out = processor.process_document(&document(4)).await;
        assert_eq!(out.len(), 4);
        assert_eq!(out.success_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_run_keeps_page_order() {
        let mut scripted = Scripted::new(vec![3]);
        // Early pages finish last.
        scripted.delay_ms = |page| 60 - 10 * page as u64;
        let backend = Arc::new(scripted);
        let config = OcrConfig::builder().concurrency(4).build().unwrap();
        let processor = PageProcessor::new(backend, &config);

        let out = processor.process_document(&document(5)).await;
        assert_eq!(indices(&out), vec![1, 2, 3, 4, 5]);
        assert_eq!(out.pages[0].text, "page 1");
        assert!(!out.pages[2].is_ok());
    }

    #[tokio::test]
    async fn slow_page_times_out_others_succeed() {
        let mut scripted = Scripted::new(vec![]);
        scripted.delay_ms = |page| if page == 2 { 3_000 } else { 0 };
        let config = OcrConfig::builder().api_timeout_secs(1).build().unwrap();
        let processor = PageProcessor::new(Arc::new(scripted), &config);

        let out = processor.process_document(&document(3)).await;
        assert_eq!(
            out.pages[1].error,
            Some(PageError::Timeout { page: 2, secs: 1 })
        );
        assert!(out.pages[0].is_ok() && out.pages[2].is_ok());
    }

    #[tokio::test]
    async fn raw_response_can_be_omitted() {
        let config = OcrConfig::builder().include_raw_response(false).build().unwrap();
        let processor = PageProcessor::new(Arc::new(Scripted::new(vec![])), &config);
        let out = processor.process_document(&document(1)).await;
        assert_eq!(out.pages[0].text, "page 1");
        assert_eq!(out.pages[0].raw_response, "");
    }

    #[tokio::test]
    async fn unreadable_staged_page_fails_without_backend_call() {
        let backend = Arc::new(Scripted::new(vec![]));
        let processor = PageProcessor::new(backend.clone(), &OcrConfig::default());
        let doc = document(2);
        std::fs::remove_file(doc.pages()[0].path()).unwrap();

        let out = processor.process_document(&doc).await;
        assert!(matches!(
            out.pages[0].error,
            Some(PageError::EncodeFailed { page: 1, .. })
        ));
        assert!(out.pages[1].is_ok());
        assert_eq!(*backend.calls.lock().unwrap(), vec![2]);
    }

    #[derive(Default)]
    struct Events(Mutex<Vec<String>>);

    impl OcrProgressCallback for Events {
        fn on_run_start(&self, total: usize) {
            self.0.lock().unwrap().push(format!("start {total}"));
        }
        fn on_page_complete(&self, page: usize, _total: usize, text: &str) {
            self.0.lock().unwrap().push(format!("ok {page} {text}"));
        }
        fn on_page_error(&self, page: usize, _total: usize, _error: &str) {
            self.0.lock().unwrap().push(format!("err {page}"));
        }
        fn on_run_complete(&self, total: usize, ok: usize) {
            self.0.lock().unwrap().push(format!("done {ok}/{total}"));
        }
    }

    #[tokio::test]
    async fn progress_events_follow_pages() {
        let events = Arc::new(Events::default());
        let config = OcrConfig::builder()
            .progress_callback(events.clone())
            .build()
            .unwrap();
        let processor = PageProcessor::new(Arc::new(Scripted::new(vec![2])), &config);
        processor.process_document(&document(2)).await;

        assert_eq!(
            *events.0.lock().unwrap(),
            vec!["start 2", "ok 1 page 1", "err 2", "done 1/2"]
        );
    }
}
