#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use invoice_pdf_server::config::AppConfig;
use invoice_pdf_server::db::{connect_pool, IN_MEMORY};
use invoice_pdf_server::invoice::InvoiceNormalizer;
use invoice_pdf_server::pdf::{PageOptions, PdfError, PdfExporter};
use invoice_pdf_server::AppState;

pub const TEST_API_KEY: &str = "html2pdf_0123456789abcdef";
pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<<>>\nendobj\n%%EOF\n";

/// Returns a fixed PDF buffer and remembers the HTML it was handed.
#[derive(Default)]
pub struct StaticPdfExporter {
    pub rendered: Mutex<Vec<(String, PageOptions)>>,
}

impl StaticPdfExporter {
    pub fn last_html(&self) -> Option<String> {
        self.rendered
            .lock()
            .unwrap()
            .last()
            .map(|(html, _)| html.clone())
    }

    pub fn last_options(&self) -> Option<PageOptions> {
        self.rendered
            .lock()
            .unwrap()
            .last()
            .map(|(_, options)| options.clone())
    }
}

#[async_trait]
impl PdfExporter for StaticPdfExporter {
    async fn render_to_pdf(&self, html: &str, options: &PageOptions) -> Result<Vec<u8>, PdfError> {
        self.rendered
            .lock()
            .unwrap()
            .push((html.to_string(), options.clone()));
        Ok(FAKE_PDF.to_vec())
    }
}

/// Simulates a browser that crashes.
pub struct FailingPdfExporter;

#[async_trait]
impl PdfExporter for FailingPdfExporter {
    async fn render_to_pdf(&self, _html: &str, _options: &PageOptions) -> Result<Vec<u8>, PdfError> {
        Err(PdfError::BrowserExit {
            code: 1,
            stderr: "crashed".to_string(),
        })
    }
}

/// Produces bytes that are not a PDF.
pub struct GarbageExporter;

#[async_trait]
impl PdfExporter for GarbageExporter {
    async fn render_to_pdf(&self, _html: &str, _options: &PageOptions) -> Result<Vec<u8>, PdfError> {
        Ok(b"<html>oops</html>".to_vec())
    }
}

pub fn fixed_now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2026-01-15T10:00:00+02:00").unwrap()
}

pub fn test_config() -> AppConfig {
    AppConfig {
        api_key: Some(TEST_API_KEY.to_string()),
        database_path: IN_MEMORY.to_string(),
        ..AppConfig::default()
    }
}

pub async fn state_with(config: AppConfig, exporter: Arc<dyn PdfExporter>) -> AppState {
    let pool = connect_pool(IN_MEMORY).await.unwrap();
    AppState::new_with_pool_and_exporter(config, pool, exporter)
        .await
        .unwrap()
        .with_normalizer(InvoiceNormalizer::fixed(fixed_now()))
}

pub async fn test_state() -> AppState {
    state_with(test_config(), Arc::new(StaticPdfExporter::default())).await
}

pub fn sample_invoice() -> serde_json::Value {
    serde_json::json!({
        "templateType": "receipt",
        "invoiceNumber": "INV-1001",
        "customer": { "name": "ישראל ישראלי", "email": "israel@example.com" },
        "items": [
            { "description": "ייעוץ", "quantity": 2, "rate": 100, "amount": 200 }
        ],
        "taxRate": 10
    })
}
