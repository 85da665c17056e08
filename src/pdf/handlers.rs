use std::time::Instant;

use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use sanitize_filename::sanitize;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PageOptions, PageOptionsRequest, PdfError};
use crate::error::AppError;
use crate::invoice::validation::{validate_required, ValidationErrors};
use crate::metrics::{record_render, RenderSource};
use crate::AppState;

const DEFAULT_FILENAME: &str = "document";

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct HtmlToPdfRequest {
    #[schema(example = "<html><body><h1>שלום</h1></body></html>")]
    pub html: Option<String>,
    /// Download name without extension.
    #[schema(example = "report")]
    pub filename: Option<String>,
    pub options: Option<PageOptionsRequest>,
}

/// Run the exporter, recording timing and outcome.
pub(crate) async fn export_pdf(
    state: &AppState,
    source: RenderSource,
    html: &str,
    options: &PageOptions,
) -> Result<Vec<u8>, PdfError> {
    let started = Instant::now();
    log::debug!("Exporting {} bytes of HTML to PDF", html.len());

    let result = state.exporter.render_to_pdf(html, options).await;
    record_render(source, started, result.is_ok());

    match &result {
        Ok(pdf) => log::info!(
            "PDF generated: {} bytes in {} ms",
            pdf.len(),
            started.elapsed().as_millis()
        ),
        Err(e) => log::error!("PDF export failed: {}", e),
    }
    result
}

/// PDF download response. `filename` is used as given.
pub(crate) fn pdf_response(pdf: Vec<u8>, filename: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename.to_string())],
        })
        .insert_header((header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"))
        .insert_header((header::PRAGMA, "no-cache"))
        .insert_header((header::EXPIRES, "0"))
        .body(pdf)
}

/// Strip anything unsafe for a download name, falling back to `fallback`.
pub(crate) fn download_name(raw: &str, fallback: &str) -> String {
    let cleaned = sanitize(raw.trim());
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

#[utoipa::path(
    post,
    path = "/api/html-to-pdf",
    tag = "PDF",
    request_body = HtmlToPdfRequest,
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 400, description = "Missing HTML or invalid page options", body = crate::ErrorResponse),
        (status = 500, description = "Rendering failed", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn html_to_pdf(
    state: web::Data<AppState>,
    body: web::Json<HtmlToPdfRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();

    let mut errors = ValidationErrors::new();
    validate_required(request.html.as_deref(), "html", "HTML content", &mut errors);
    let options = match request.options.unwrap_or_default().resolve() {
        Ok(options) => options,
        Err(option_errors) => {
            errors.extend(option_errors);
            PageOptions::default()
        }
    };
    errors.into_result()?;

    let html = request.html.unwrap_or_default();
    let pdf = export_pdf(&state, RenderSource::Html, &html, &options).await?;

    let filename = download_name(
        request.filename.as_deref().unwrap_or(DEFAULT_FILENAME),
        DEFAULT_FILENAME,
    );
    Ok(pdf_response(pdf, &format!("{}.pdf", filename)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/html-to-pdf").route(web::post().to(html_to_pdf)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_name_is_sanitized() {
        assert_eq!(download_name("report", "document"), "report");
        assert_eq!(download_name("q3/report", "document"), "q3report");
        assert_eq!(download_name("   ", "document"), "document");
    }

    #[test]
    fn test_pdf_response_headers() {
        let response = pdf_response(b"%PDF-1.7".to_vec(), "invoice-1.pdf");
        let headers = response.headers();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/pdf");
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"invoice-1.pdf\""
        );
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "no-cache, no-store, must-revalidate"
        );
    }
}
