//! PDF render metrics.
//!
//! Registered in the prometheus default registry and served separately from
//! the per-request HTTP metrics at `/metrics`.

use std::time::Instant;

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    pub static ref PDF_RENDERS: IntCounterVec = register_int_counter_vec!(
        "pdf_renders_total",
        "PDF renders by request source and outcome",
        &["source", "outcome"]
    )
    .unwrap();
    pub static ref PDF_RENDER_SECONDS: HistogramVec = register_histogram_vec!(
        "pdf_render_seconds",
        "Time spent in the PDF exporter",
        &["source"],
        vec![0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]
    )
    .unwrap();
}

/// Which endpoint asked for a render.
#[derive(Debug, Clone, Copy)]
pub enum RenderSource {
    Invoice,
    Html,
    Debug,
}

impl RenderSource {
    fn label(self) -> &'static str {
        match self {
            RenderSource::Invoice => "invoice",
            RenderSource::Html => "html",
            RenderSource::Debug => "debug",
        }
    }
}

pub fn record_render(source: RenderSource, started: Instant, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    PDF_RENDERS
        .with_label_values(&[source.label(), outcome])
        .inc();
    PDF_RENDER_SECONDS
        .with_label_values(&[source.label()])
        .observe(started.elapsed().as_secs_f64());
}

pub async fn pdf_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        log::error!("Failed to encode PDF metrics: {}", e);
        return HttpResponse::InternalServerError().finish();
    }
    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_render_counts_outcomes() {
        let before = PDF_RENDERS
            .with_label_values(&["debug", "failure"])
            .get();
        record_render(RenderSource::Debug, Instant::now(), false);
        let after = PDF_RENDERS
            .with_label_values(&["debug", "failure"])
            .get();
        assert_eq!(after, before + 1);
    }
}
