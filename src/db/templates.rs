use super::AppState;
use crate::template::models::StoredTemplate;

impl AppState {
    /// Names of the active templates, alphabetical.
    pub async fn list_template_names(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT name FROM templates WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_template(&self, name: &str) -> Result<Option<StoredTemplate>, sqlx::Error> {
        sqlx::query_as::<_, StoredTemplate>(
            r#"
            SELECT id, name, type, content, is_active, version, created_at, updated_at
            FROM templates
            WHERE name = ? AND is_active = 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
    }

    /// Replace a template body and bump its version. `None` when no such template exists.
    pub async fn update_template_content(
        &self,
        name: &str,
        content: &str,
    ) -> Result<Option<StoredTemplate>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE templates
            SET content = ?, version = version + 1, updated_at = CURRENT_TIMESTAMP
            WHERE name = ? AND is_active = 1
            "#,
        )
        .bind(content)
        .bind(name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_template(name).await
    }

    /// Insert a template unless one with the same name exists. Returns whether a row was added.
    pub async fn insert_template_if_missing(
        &self,
        name: &str,
        kind: &str,
        content: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO templates (name, type, content) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING",
        )
        .bind(name)
        .bind(kind)
        .bind(content)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
