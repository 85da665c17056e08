use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use super::models::{AppSetting, BusinessSettings, UpdateBusinessSettingsRequest, UpdateSettingRequest};
use crate::error::AppError;
use crate::invoice::validation::{validate_required, ValidationErrors};
use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct BusinessSettingsResponse {
    pub success: bool,
    pub settings: BusinessSettings,
}

#[derive(Serialize, ToSchema)]
pub struct SettingResponse {
    pub success: bool,
    pub setting: AppSetting,
}

#[utoipa::path(
    get,
    path = "/api/business-settings",
    tag = "Settings",
    responses(
        (status = 200, description = "Current business profile", body = BusinessSettingsResponse),
        (status = 404, description = "No profile stored", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn get_business_settings(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let settings = state
        .get_business_settings()
        .await?
        .ok_or_else(|| AppError::NotFound("Business settings not found".to_string()))?;
    Ok(HttpResponse::Ok().json(BusinessSettingsResponse {
        success: true,
        settings,
    }))
}

#[utoipa::path(
    put,
    path = "/api/business-settings",
    tag = "Settings",
    request_body = UpdateBusinessSettingsRequest,
    responses(
        (status = 200, description = "Profile saved", body = BusinessSettingsResponse),
        (status = 400, description = "Business name missing", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn update_business_settings(
    state: web::Data<AppState>,
    body: web::Json<UpdateBusinessSettingsRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();

    let mut errors = ValidationErrors::new();
    validate_required(Some(&request.name), "name", "Business name", &mut errors);
    errors.into_result()?;

    let settings = state.update_business_settings(&request).await?;
    log::info!("Business settings updated for '{}'", settings.name);
    Ok(HttpResponse::Ok().json(BusinessSettingsResponse {
        success: true,
        settings,
    }))
}

#[utoipa::path(
    get,
    path = "/api/settings/{key}",
    tag = "Settings",
    params(
        ("key" = String, Path, description = "Setting key")
    ),
    responses(
        (status = 200, description = "Setting value", body = SettingResponse),
        (status = 404, description = "Setting not found", body = crate::ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn get_setting(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let key = path.into_inner();
    match state.get_setting(&key).await? {
        Some(setting) => Ok(HttpResponse::Ok().json(SettingResponse {
            success: true,
            setting,
        })),
        None => Err(AppError::NotFound(format!("Setting '{}' not found", key))),
    }
}

#[utoipa::path(
    put,
    path = "/api/settings/{key}",
    tag = "Settings",
    params(
        ("key" = String, Path, description = "Setting key")
    ),
    request_body = UpdateSettingRequest,
    responses(
        (status = 200, description = "Setting stored", body = SettingResponse)
    ),
    security(("api_key" = []))
)]
pub async fn update_setting(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateSettingRequest>,
) -> Result<HttpResponse, AppError> {
    let key = path.into_inner();
    let request = body.into_inner();
    let setting = state
        .set_setting(&key, request.value.as_deref(), request.description.as_deref())
        .await?;
    log::info!("Setting '{}' updated", key);
    Ok(HttpResponse::Ok().json(SettingResponse {
        success: true,
        setting,
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/business-settings")
            .route(web::get().to(get_business_settings))
            .route(web::put().to(update_business_settings)),
    )
    .service(
        web::resource("/settings/{key}")
            .route(web::get().to(get_setting))
            .route(web::put().to(update_setting)),
    );
}
