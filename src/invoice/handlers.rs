use actix_web::{web, HttpResponse};

use super::models::{
    BusinessInput, CustomerInput, HistoryQuery, InvoiceDetail, InvoiceHistoryResponse,
    InvoiceRequest, LineItem, NormalizedInvoice,
};
use super::validation::{validate_invoice_request, validate_preview_request};
use crate::error::AppError;
use crate::metrics::RenderSource;
use crate::pdf::handlers::{download_name, export_pdf, pdf_response};
use crate::pdf::{has_pdf_signature, PageOptions, PdfError};
use crate::render::RenderError;
use crate::AppState;

const UTF8_BOM: char = '\u{feff}';

/// Fill business fields the caller left empty from the stored profile.
/// A store failure is logged and the request goes on with what it has.
async fn merge_business_profile(state: &AppState, request: InvoiceRequest) -> InvoiceRequest {
    match state.get_business_settings().await {
        Ok(Some(settings)) => request.with_business_profile(&settings.to_profile()),
        Ok(None) => request,
        Err(e) => {
            log::error!("Failed to load business settings, using request as is: {}", e);
            request
        }
    }
}

async fn render_invoice(state: &AppState, invoice: &NormalizedInvoice) -> Result<String, AppError> {
    let template = state
        .get_template(&invoice.template_type)
        .await?
        .ok_or_else(|| RenderError::TemplateNotFound(invoice.template_type.clone()))?;

    let html = state
        .renderer
        .render(&template.name, &template.content, invoice)?;
    log::debug!(
        "Rendered template '{}' v{} ({} bytes)",
        template.name,
        template.version,
        html.len()
    );
    Ok(html)
}

fn with_bom(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + UTF8_BOM.len_utf8());
    out.push(UTF8_BOM);
    out.push_str(html);
    out
}

#[utoipa::path(
    post,
    path = "/api/generate-pdf",
    tag = "Invoices",
    request_body = InvoiceRequest,
    responses(
        (status = 200, description = "Invoice PDF", content_type = "application/pdf"),
        (status = 400, description = "Validation failed", body = crate::ErrorResponse),
        (status = 401, description = "Missing API key", body = crate::ErrorResponse),
        (status = 403, description = "Invalid API key", body = crate::ErrorResponse),
        (status = 404, description = "Template not found", body = crate::ErrorResponse),
        (status = 500, description = "Rendering failed", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn generate_pdf(
    state: web::Data<AppState>,
    body: web::Json<InvoiceRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    validate_invoice_request(&request)?;

    let request = merge_business_profile(&state, request).await;
    let invoice = state.normalizer.normalize(&request);
    log::info!(
        "Generating PDF for invoice {} with template '{}'",
        invoice.invoice_number,
        invoice.template_type
    );

    let html = render_invoice(&state, &invoice).await?;
    let pdf = export_pdf(&state, RenderSource::Invoice, &with_bom(&html), &PageOptions::a4()).await?;

    match state.save_invoice_record(&invoice).await {
        Ok(id) => log::info!("Invoice {} saved to history as #{}", invoice.invoice_number, id),
        Err(e) => log::error!(
            "Failed to save invoice {} to history: {}",
            invoice.invoice_number,
            e
        ),
    }

    let filename = format!(
        "invoice-{}.pdf",
        download_name(&invoice.invoice_number, "document")
    );
    Ok(pdf_response(pdf, &filename))
}

#[utoipa::path(
    post,
    path = "/api/preview",
    tag = "Invoices",
    request_body = InvoiceRequest,
    responses(
        (status = 200, description = "Rendered HTML", content_type = "text/html"),
        (status = 400, description = "Validation failed", body = crate::ErrorResponse),
        (status = 404, description = "Template not found", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn preview(
    state: web::Data<AppState>,
    body: web::Json<InvoiceRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    validate_preview_request(&request)?;

    let request = merge_business_profile(&state, request).await;
    let invoice = state.normalizer.normalize(&request);
    let html = render_invoice(&state, &invoice).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

fn debug_request() -> InvoiceRequest {
    InvoiceRequest {
        invoice_number: Some("DEBUG-001".to_string()),
        template_type: Some("receipt".to_string()),
        customer: Some(CustomerInput {
            name: Some("Debug Test".to_string()),
            email: Some("debug@test.com".to_string()),
            ..Default::default()
        }),
        business: Some(BusinessInput {
            name: Some("Debug Business".to_string()),
            phone: Some("123-456-7890".to_string()),
            ..Default::default()
        }),
        items: Some(vec![LineItem {
            description: Some("Debug Item".to_string()),
            quantity: Some(1.0),
            rate: Some(100.0),
            amount: Some(100.0),
        }]),
        subtotal: Some(100.0),
        total: Some(100.0),
        ..Default::default()
    }
}

#[utoipa::path(
    post,
    path = "/api/debug-pdf",
    tag = "Invoices",
    responses(
        (status = 200, description = "Sample receipt PDF", content_type = "application/pdf"),
        (status = 500, description = "Exporter produced something that is not a PDF", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn debug_pdf(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    log::info!("Generating debug PDF");
    let invoice = state.normalizer.normalize(&debug_request());
    let html = render_invoice(&state, &invoice).await?;
    let pdf = export_pdf(&state, RenderSource::Debug, &with_bom(&html), &PageOptions::a4()).await?;

    let head = &pdf[..pdf.len().min(20)];
    log::info!("Debug PDF: {} bytes, first bytes {:02x?}", pdf.len(), head);

    if !has_pdf_signature(&pdf) {
        let header = String::from_utf8_lossy(&pdf[..pdf.len().min(4)]).into_owned();
        return Err(PdfError::InvalidSignature {
            header,
            size: pdf.len(),
        }
        .into());
    }

    Ok(pdf_response(pdf, "debug-test.pdf"))
}

#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Invoices",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Invoice history, newest first", body = InvoiceHistoryResponse)
    ),
    security(("api_key" = []))
)]
pub async fn list_invoices(
    state: web::Data<AppState>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let (limit, offset) = (query.limit(), query.offset());
    let invoices = state.get_invoice_history(limit, offset).await?;
    Ok(HttpResponse::Ok().json(InvoiceHistoryResponse {
        success: true,
        invoices,
        limit,
        offset,
    }))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Invoices",
    params(
        ("id" = i64, Path, description = "Invoice history id")
    ),
    responses(
        (status = 200, description = "Invoice with its rendered data", body = InvoiceDetail),
        (status = 404, description = "Invoice not found", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn get_invoice(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    match state.get_invoice_by_id(id).await? {
        Some(invoice) => Ok(HttpResponse::Ok().json(invoice)),
        None => Err(AppError::NotFound(format!("Invoice {} not found", id))),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/generate-pdf").route(web::post().to(generate_pdf)))
        .service(web::resource("/preview").route(web::post().to(preview)))
        .service(web::resource("/debug-pdf").route(web::post().to(debug_pdf)))
        .service(web::resource("/invoices").route(web::get().to(list_invoices)))
        .service(web::resource("/invoices/{id}").route(web::get().to(get_invoice)));
}
