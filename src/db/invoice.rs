use sqlx::FromRow;

use super::AppState;
use crate::invoice::models::{InvoiceDetail, InvoiceRecord, NormalizedInvoice};

const RECORD_COLUMNS: &str = "id, invoice_number, template_type, customer_name, customer_email, \
     total_amount, currency, status, created_at";

#[derive(FromRow)]
struct InvoiceRow {
    #[sqlx(flatten)]
    record: InvoiceRecord,
    data_json: Option<String>,
}

impl AppState {
    /// Append a generated invoice to the history. Returns the new row id.
    pub async fn save_invoice_record(&self, invoice: &NormalizedInvoice) -> Result<i64, sqlx::Error> {
        let data_json =
            serde_json::to_string(invoice).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO invoice_history
                (invoice_number, template_type, customer_name, customer_email, total_amount, currency, data_json)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&invoice.invoice_number)
        .bind(&invoice.template_type)
        .bind(&invoice.customer.name)
        .bind(&invoice.customer.email)
        .bind(invoice.total)
        .bind(&invoice.currency)
        .bind(data_json)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// One page of history, newest first.
    pub async fn get_invoice_history(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InvoiceRecord>, sqlx::Error> {
        sqlx::query_as::<_, InvoiceRecord>(&format!(
            "SELECT {} FROM invoice_history ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            RECORD_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_invoice_by_id(&self, id: i64) -> Result<Option<InvoiceDetail>, sqlx::Error> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {}, data_json FROM invoice_history WHERE id = ?",
            RECORD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let data = row.data_json.as_deref().and_then(|raw| {
                serde_json::from_str(raw)
                    .map_err(|e| log::warn!("Invoice {} has unreadable data_json: {}", id, e))
                    .ok()
            });
            InvoiceDetail {
                record: row.record,
                data,
            }
        }))
    }
}
