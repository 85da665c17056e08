use std::collections::HashMap;

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, Error, HttpRequest, ResponseError};
use thiserror::Error;

use crate::error::AppError;
use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const API_KEY_QUERY: &str = "api_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("API key is required. Provide it via x-api-key header, Authorization: Bearer header, or api_key query parameter.")]
    Missing,
    #[error("The provided API key is not valid.")]
    Invalid,
    #[error("API authentication not properly configured")]
    NotConfigured,
}

/// Pull the caller's key from `x-api-key`, `Authorization` or the `api_key` query parameter.
pub fn extract_api_key(req: &HttpRequest) -> Option<String> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(key) = header(API_KEY_HEADER) {
        return Some(key.to_string());
    }
    if let Some(auth) = header("Authorization") {
        let key = auth.strip_prefix("Bearer ").unwrap_or(auth).trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }
    }
    web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.get(API_KEY_QUERY).cloned())
        .filter(|key| !key.is_empty())
}

/// Compare the presented key against the configured one.
pub fn authorize(presented: Option<&str>, expected: Option<&str>) -> Result<(), AuthError> {
    let expected = expected.ok_or(AuthError::NotConfigured)?;
    let presented = presented.ok_or(AuthError::Missing)?;
    if constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::Invalid)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn key_prefix(key: &str) -> String {
    key.chars().take(8).collect()
}

pub async fn require_api_key(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let expected = req
        .app_data::<web::Data<AppState>>()
        .and_then(|state| state.config.api_key.clone());
    let presented = extract_api_key(req.request());
    let peer = req
        .peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    match authorize(presented.as_deref(), expected.as_deref()) {
        Ok(()) => {
            log::debug!("API key authenticated from {}", peer);
            next.call(req).await.map(ServiceResponse::map_into_boxed_body)
        }
        Err(err) => {
            match err {
                AuthError::NotConfigured => {
                    log::error!("API_KEY environment variable not configured")
                }
                AuthError::Invalid => log::warn!(
                    "Invalid API key attempt from {}: {}...",
                    peer,
                    key_prefix(presented.as_deref().unwrap_or_default())
                ),
                AuthError::Missing => log::warn!("Request without API key from {}", peer),
            }
            let response = AppError::from(err).error_response();
            Ok(req.into_response(response))
        }
    }
}
