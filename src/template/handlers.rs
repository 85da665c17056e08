use actix_web::{web, HttpResponse};

use super::models::{
    TemplateListResponse, TemplateResponse, TemplateUpdatedResponse, UpdateTemplateRequest,
};
use crate::error::AppError;
use crate::invoice::validation::{validate_required, ValidationErrors};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Templates",
    responses(
        (status = 200, description = "Names of the available templates", body = TemplateListResponse)
    ),
    security(("api_key" = []))
)]
pub async fn list_templates(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let templates = state.list_template_names().await?;
    Ok(HttpResponse::Ok().json(TemplateListResponse {
        success: true,
        templates,
    }))
}

#[utoipa::path(
    get,
    path = "/api/templates/{name}",
    tag = "Templates",
    params(
        ("name" = String, Path, description = "Template name")
    ),
    responses(
        (status = 200, description = "Template source", body = TemplateResponse),
        (status = 404, description = "Template not found", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn get_template(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let name = path.into_inner();
    let template = state
        .get_template(&name)
        .await?
        .ok_or_else(|| AppError::TemplateNotFound(name.clone()))?;

    Ok(HttpResponse::Ok().json(TemplateResponse {
        success: true,
        name: template.name,
        content: template.content,
        version: template.version,
    }))
}

#[utoipa::path(
    put,
    path = "/api/templates/{name}",
    tag = "Templates",
    params(
        ("name" = String, Path, description = "Template name")
    ),
    request_body = UpdateTemplateRequest,
    responses(
        (status = 200, description = "Template updated", body = TemplateUpdatedResponse),
        (status = 400, description = "Missing or invalid content", body = crate::ErrorResponse),
        (status = 404, description = "Template not found", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn update_template(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateTemplateRequest>,
) -> Result<HttpResponse, AppError> {
    let name = path.into_inner();
    let content = body.into_inner().content.unwrap_or_default();

    let mut errors = ValidationErrors::new();
    validate_required(Some(&content), "content", "Template content", &mut errors);
    errors.into_result()?;

    if let Err(e) = state.renderer.check(&name, &content) {
        return Err(AppError::BadRequest(e.to_string()));
    }

    let template = state
        .update_template_content(&name, &content)
        .await?
        .ok_or_else(|| AppError::TemplateNotFound(name.clone()))?;

    log::info!("Template '{}' updated to version {}", name, template.version);
    Ok(HttpResponse::Ok().json(TemplateUpdatedResponse {
        success: true,
        message: "Template updated successfully".to_string(),
        version: template.version,
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/templates").route(web::get().to(list_templates)))
        .service(
            web::resource("/templates/{name}")
                .route(web::get().to(get_template))
                .route(web::put().to(update_template)),
        );
}
