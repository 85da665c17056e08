use actix_cors::Cors;
use actix_web::middleware::{from_fn, Compress, Logger};
use actix_web::error::InternalError;
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod invoice;
pub mod logo;
pub mod metrics;
pub mod pdf;
pub mod render;
pub mod settings;
pub mod template;

pub use crate::db::AppState;

use crate::auth::{enforce_rate_limit, require_api_key};
use crate::config::AppConfig;
use crate::invoice::validation::ValidationError;

pub const SERVICE_NAME: &str = "מחולל חשבוניות PDF";
const JSON_LIMIT: usize = 50 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
    /// Per-field problems, present on validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationError>>,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            details: None,
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn with_details(mut self, details: Vec<ValidationError>) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
    pub timestamp: String,
    pub service: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        success: true,
        status: "תקין".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        service: SERVICE_NAME.to_string(),
    })
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::not_found("Endpoint not found"))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            log::warn!("Rejected JSON body: {}", err);
            let response = HttpResponse::BadRequest().json(ErrorResponse::bad_request(&err.to_string()));
            InternalError::from_response(err, response).into()
        })
}

/// Register every route. Shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::scope("/api")
                .wrap(from_fn(enforce_rate_limit))
                .route("/health", web::get().to(health))
                .service(
                    web::scope("")
                        .wrap(from_fn(require_api_key))
                        .configure(invoice::handlers::config)
                        .configure(pdf::handlers::config)
                        .configure(template::handlers::config)
                        .configure(logo::handlers::config)
                        .configure(settings::handlers::config),
                ),
        )
        .route("/metrics/pdf", web::get().to(metrics::pdf_metrics))
        .default_service(web::to(not_found));
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-api-key"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        crate::invoice::handlers::generate_pdf,
        crate::invoice::handlers::preview,
        crate::invoice::handlers::debug_pdf,
        crate::invoice::handlers::list_invoices,
        crate::invoice::handlers::get_invoice,
        crate::pdf::handlers::html_to_pdf,
        crate::template::handlers::list_templates,
        crate::template::handlers::get_template,
        crate::template::handlers::update_template,
        crate::logo::handlers::upload_logo,
        crate::logo::handlers::delete_logo,
        crate::settings::handlers::get_business_settings,
        crate::settings::handlers::update_business_settings,
        crate::settings::handlers::get_setting,
        crate::settings::handlers::update_setting
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            ValidationError,
            invoice::models::InvoiceRequest,
            invoice::models::BusinessInput,
            invoice::models::CustomerInput,
            invoice::models::LineItem,
            invoice::models::NormalizedInvoice,
            invoice::models::NormalizedBusiness,
            invoice::models::NormalizedCustomer,
            invoice::models::InvoiceRecord,
            invoice::models::InvoiceDetail,
            invoice::models::InvoiceHistoryResponse,
            pdf::handlers::HtmlToPdfRequest,
            pdf::page::PageOptionsRequest,
            pdf::page::MarginRequest,
            template::models::TemplateListResponse,
            template::models::TemplateResponse,
            template::models::UpdateTemplateRequest,
            template::models::TemplateUpdatedResponse,
            logo::models::LogoUploadForm,
            logo::models::LogoUploadResponse,
            logo::models::UploadedLogo,
            logo::models::LogoDeleteResponse,
            settings::models::BusinessSettings,
            settings::models::UpdateBusinessSettingsRequest,
            settings::models::AppSetting,
            settings::models::UpdateSettingRequest,
            settings::handlers::BusinessSettingsResponse,
            settings::handlers::SettingResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness probe."),
        (name = "Invoices", description = "Invoice rendering and history."),
        (name = "PDF", description = "Arbitrary HTML to PDF."),
        (name = "Templates", description = "Stored invoice templates."),
        (name = "Logos", description = "Business logo uploads."),
        (name = "Settings", description = "Business profile and application settings.")
    )
)]
pub struct ApiDoc;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    if config.api_key.is_none() {
        log::warn!("API_KEY is not set; every authenticated endpoint will answer 500");
    }
    std::fs::create_dir_all(&config.upload_dir)?;

    let (host, port) = (config.host.clone(), config.port);
    let upload_dir = config.upload_dir.clone();

    let app_state = match AppState::new(config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to open the database. Check DATABASE_PATH. Error: {}", e);
            return Err(e);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("invoice_pdf_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create Prometheus metrics middleware: {}", e))?;

    log::info!("Starting server at http://{}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::HeaderName::from_static("x-api-key"),
            ])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .service(actix_files::Files::new(
                logo::handlers::LOGO_URL_PREFIX,
                upload_dir.clone(),
            ))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
