//! HTML to PDF export.
//!
//! The exporter is a trait so the HTTP layer never knows which engine sits
//! behind it. Production uses [`ChromiumExporter`], which drives a headless
//! browser from the command line; tests plug in a stub.

pub mod chromium;
pub mod handlers;
pub mod page;

pub use chromium::ChromiumExporter;
pub use page::{Margin, PageFormat, PageOptions, PageOptionsRequest, PageRanges};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Byte signature every PDF file starts with.
pub const PDF_SIGNATURE: &[u8] = b"%PDF";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write HTML source: {0}")]
    WriteHtml(#[source] std::io::Error),
    #[error("failed to launch browser '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },
    #[error("browser process failed: {0}")]
    Process(#[source] std::io::Error),
    #[error("browser exited with status {code}: {stderr}")]
    BrowserExit { code: i32, stderr: String },
    #[error("PDF rendering timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to read generated PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
    #[error("generated PDF is empty")]
    EmptyOutput,
    #[error("PDF output does not start with %PDF (got {header:?}, {size} bytes)")]
    InvalidSignature { header: String, size: usize },
    #[error("page range selects no pages of a {total}-page document")]
    NoPagesSelected { total: u32 },
    #[error("failed to post-process PDF: {0}")]
    PostProcess(String),
}

#[async_trait]
pub trait PdfExporter: Send + Sync {
    async fn render_to_pdf(&self, html: &str, options: &PageOptions) -> Result<Vec<u8>, PdfError>;
}

pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_SIGNATURE)
}
