use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::invoice::models::BusinessInput;

/// Stored business profile; its fields fill gaps in incoming invoices.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BusinessSettings {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub tax_id: Option<String>,
    pub logo_path: Option<String>,
    #[schema(value_type = String, example = "2026-01-15T10:00:00")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, example = "2026-01-15T10:00:00")]
    pub updated_at: NaiveDateTime,
}

impl BusinessSettings {
    pub fn to_profile(&self) -> BusinessInput {
        BusinessInput {
            name: Some(self.name.clone()),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            website: self.website.clone(),
            tax_id: self.tax_id.clone(),
            logo: self.logo_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateBusinessSettingsRequest {
    #[schema(example = "Acme Ltd")]
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    #[serde(alias = "abn")]
    pub tax_id: Option<String>,
    pub logo_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AppSetting {
    #[sqlx(rename = "setting_key")]
    pub key: String,
    #[sqlx(rename = "setting_value")]
    pub value: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = String, example = "2026-01-15T10:00:00")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateSettingRequest {
    pub value: Option<String>,
    pub description: Option<String>,
}
