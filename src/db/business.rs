use super::AppState;
use crate::settings::models::{BusinessSettings, UpdateBusinessSettingsRequest};

const BUSINESS_COLUMNS: &str = "id, name, address, city, state, postal_code, phone, email, \
     website, tax_id, logo_path, created_at, updated_at";

impl AppState {
    /// Latest business profile, if any.
    pub async fn get_business_settings(&self) -> Result<Option<BusinessSettings>, sqlx::Error> {
        sqlx::query_as::<_, BusinessSettings>(&format!(
            "SELECT {} FROM business_settings ORDER BY id DESC LIMIT 1",
            BUSINESS_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
    }

    pub(super) async fn insert_default_business_settings(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO business_settings (name, address, city, state, postal_code, phone, email, website, tax_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind("Your Business Name")
        .bind("123 Business Street")
        .bind("Business City")
        .bind("State")
        .bind("12345")
        .bind("+1 (555) 123-4567")
        .bind("info@yourbusiness.com")
        .bind("www.yourbusiness.com")
        .bind("")
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Overwrite the latest profile, inserting one when the table is empty.
    pub async fn update_business_settings(
        &self,
        settings: &UpdateBusinessSettingsRequest,
    ) -> Result<BusinessSettings, sqlx::Error> {
        let updated = sqlx::query(
            r#"
            UPDATE business_settings
            SET name = ?, address = ?, city = ?, state = ?, postal_code = ?,
                phone = ?, email = ?, website = ?, tax_id = ?, logo_path = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = (SELECT MAX(id) FROM business_settings)
            "#,
        )
        .bind(&settings.name)
        .bind(&settings.address)
        .bind(&settings.city)
        .bind(&settings.state)
        .bind(&settings.postal_code)
        .bind(&settings.phone)
        .bind(&settings.email)
        .bind(&settings.website)
        .bind(&settings.tax_id)
        .bind(&settings.logo_path)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO business_settings
                    (name, address, city, state, postal_code, phone, email, website, tax_id, logo_path)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&settings.name)
            .bind(&settings.address)
            .bind(&settings.city)
            .bind(&settings.state)
            .bind(&settings.postal_code)
            .bind(&settings.phone)
            .bind(&settings.email)
            .bind(&settings.website)
            .bind(&settings.tax_id)
            .bind(&settings.logo_path)
            .execute(&self.pool)
            .await?;
        }

        self.get_business_settings()
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }
}
