use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use sanitize_filename::sanitize;
use uuid::Uuid;

use super::models::{LogoDeleteResponse, LogoUploadForm, LogoUploadResponse, UploadedLogo};
use super::multipart_parser::MultipartParser;
use crate::error::AppError;
use crate::AppState;

/// Public path prefix uploaded logos are served from.
pub const LOGO_URL_PREFIX: &str = "/uploads/logos";

#[utoipa::path(
    post,
    path = "/api/upload-logo",
    tag = "Logos",
    request_body(content = LogoUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Logo stored", body = LogoUploadResponse),
        (status = 400, description = "Missing file, wrong type or too large", body = crate::ErrorResponse),
        (status = 500, description = "Could not write the file", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn upload_logo(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let parsed = MultipartParser::parse_logo_multipart(payload, state.config.upload_max_size).await?;

    let upload_dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(upload_dir).await?;

    let filename = format!("logo-{}.{}", Uuid::new_v4(), parsed.extension);
    tokio::fs::write(upload_dir.join(&filename), &parsed.data).await?;
    log::info!(
        "Logo '{}' stored as {} ({} bytes)",
        parsed.original_name,
        filename,
        parsed.data.len()
    );

    let path = format!("{}/{}", LOGO_URL_PREFIX, filename);
    Ok(HttpResponse::Ok().json(LogoUploadResponse {
        success: true,
        message: "Logo uploaded successfully".to_string(),
        logo: UploadedLogo {
            url: format!("{}{}", state.config.public_base_url(), path),
            filename,
            original_name: parsed.original_name,
            size: parsed.data.len(),
            path,
        },
    }))
}

#[utoipa::path(
    delete,
    path = "/api/logo/{filename}",
    tag = "Logos",
    params(
        ("filename" = String, Path, description = "Stored logo file name")
    ),
    responses(
        (status = 200, description = "Logo deleted", body = LogoDeleteResponse),
        (status = 404, description = "Logo not found", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn delete_logo(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let filename = sanitize(path.into_inner());
    if filename.is_empty() {
        return Err(AppError::NotFound("Logo not found".to_string()));
    }

    let file_path = state.config.upload_dir.join(&filename);
    match tokio::fs::remove_file(&file_path).await {
        Ok(()) => {
            log::info!("Logo {} deleted", filename);
            Ok(HttpResponse::Ok().json(LogoDeleteResponse {
                success: true,
                message: "Logo deleted successfully".to_string(),
            }))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound("Logo not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/upload-logo").route(web::post().to(upload_logo)))
        .service(web::resource("/logo/{filename}").route(web::delete().to(delete_logo)));
}
