use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StoredTemplate {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub is_active: bool,
    pub version: i64,
    #[schema(value_type = String)]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String)]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateListResponse {
    pub success: bool,
    #[schema(example = json!(["exempt_business_receipt", "receipt", "tax_invoice"]))]
    pub templates: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateResponse {
    pub success: bool,
    pub name: String,
    pub content: String,
    pub version: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    pub content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateUpdatedResponse {
    pub success: bool,
    pub message: String,
    pub version: i64,
}
