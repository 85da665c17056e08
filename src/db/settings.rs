use super::AppState;
use crate::settings::models::AppSetting;

impl AppState {
    pub async fn get_setting(&self, key: &str) -> Result<Option<AppSetting>, sqlx::Error> {
        sqlx::query_as::<_, AppSetting>(
            "SELECT setting_key, setting_value, description, updated_at FROM app_settings WHERE setting_key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert or replace a setting.
    pub async fn set_setting(
        &self,
        key: &str,
        value: Option<&str>,
        description: Option<&str>,
    ) -> Result<AppSetting, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO app_settings (setting_key, setting_value, description, updated_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(setting_key) DO UPDATE SET
                setting_value = excluded.setting_value,
                description = COALESCE(excluded.description, app_settings.description),
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .execute(&self.pool)
        .await?;

        self.get_setting(key).await?.ok_or(sqlx::Error::RowNotFound)
    }
}
