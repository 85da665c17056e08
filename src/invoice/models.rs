use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Decode a loosely typed JSON scalar into a number.
///
/// Numbers and numeric strings are accepted; everything else (including
/// non-finite values) is treated as missing.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_number))
}

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInput {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub postal_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub website: Option<String>,
    #[serde(default, alias = "abn", deserialize_with = "lenient_text")]
    pub tax_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[serde(default, deserialize_with = "lenient_text")]
    #[schema(example = "Israel Israeli")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub postal_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: Option<String>,
}

/// One invoice line. Numeric fields accept numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_text")]
    #[schema(example = "Consulting")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    #[schema(example = 1)]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    #[schema(example = 100.0)]
    pub rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    #[schema(example = 100.0)]
    pub amount: Option<f64>,
}

impl LineItem {
    pub fn placeholder() -> Self {
        Self {
            description: Some("Sample Item".to_string()),
            quantity: Some(1.0),
            rate: Some(100.0),
            amount: Some(100.0),
        }
    }
}

/// Untrusted invoice payload as posted by callers. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    #[schema(example = "INV-1001")]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    #[schema(example = "2026-01-15")]
    pub invoice_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub business: Option<BusinessInput>,
    #[serde(default)]
    pub customer: Option<CustomerInput>,
    #[serde(default)]
    pub items: Option<Vec<LineItem>>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub subtotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    #[schema(example = 17)]
    pub tax_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub tax_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub payment_terms: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    #[schema(example = "receipt")]
    pub template_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    #[schema(example = "₪")]
    pub currency: Option<String>,
}

impl InvoiceRequest {
    /// Fill business fields the caller left empty from a stored profile.
    ///
    /// Fields the caller supplied are never overwritten.
    pub fn with_business_profile(mut self, profile: &BusinessInput) -> Self {
        let business = self.business.get_or_insert_with(BusinessInput::default);
        fill(&mut business.name, &profile.name);
        fill(&mut business.address, &profile.address);
        fill(&mut business.city, &profile.city);
        fill(&mut business.state, &profile.state);
        fill(&mut business.postal_code, &profile.postal_code);
        fill(&mut business.phone, &profile.phone);
        fill(&mut business.email, &profile.email);
        fill(&mut business.website, &profile.website);
        fill(&mut business.tax_id, &profile.tax_id);
        fill(&mut business.logo, &profile.logo);
        self
    }
}

fn fill(target: &mut Option<String>, source: &Option<String>) {
    let missing = target.as_deref().map_or(true, str::is_empty);
    if missing {
        if let Some(value) = source.as_deref().filter(|v| !v.is_empty()) {
            *target = Some(value.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBusiness {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub tax_id: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCustomer {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub email: String,
    pub phone: String,
}

/// Fully defaulted render record handed to the template renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedInvoice {
    pub invoice_number: String,
    pub invoice_date: String,
    pub due_date: String,
    pub business: NormalizedBusiness,
    pub customer: NormalizedCustomer,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub payment_terms: String,
    pub payment_method: String,
    pub notes: String,
    pub template_type: String,
    pub currency: String,
    pub generated_date: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Page size, 1 to 200 (default 50).
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl HistoryQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Invoice history entry as listed by `GET /api/invoices`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InvoiceRecord {
    pub id: i64,
    pub invoice_number: String,
    pub template_type: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub status: String,
    #[schema(value_type = String)]
    pub created_at: NaiveDateTime,
}

/// History entry together with the rendered invoice record it was built from.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub record: InvoiceRecord,
    #[schema(value_type = Object)]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceHistoryResponse {
    pub success: bool,
    pub invoices: Vec<InvoiceRecord>,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_strings_are_decoded() {
        let item: LineItem =
            serde_json::from_value(json!({ "description": "x", "quantity": "2", "amount": "50.5" }))
                .unwrap();
        assert_eq!(item.quantity, Some(2.0));
        assert_eq!(item.amount, Some(50.5));
        assert_eq!(item.rate, None);
    }

    #[test]
    fn test_non_numeric_values_become_missing() {
        let item: LineItem =
            serde_json::from_value(json!({ "amount": "abc", "rate": null, "quantity": true }))
                .unwrap();
        assert_eq!(item.amount, None);
        assert_eq!(item.rate, None);
        assert_eq!(item.quantity, None);
    }

    #[test]
    fn test_abn_is_accepted_as_tax_id() {
        let business: BusinessInput =
            serde_json::from_value(json!({ "name": "Acme", "abn": "51 824 753 556" })).unwrap();
        assert_eq!(business.tax_id.as_deref(), Some("51 824 753 556"));
    }

    #[test]
    fn test_numeric_invoice_number_is_kept_as_text() {
        let request: InvoiceRequest =
            serde_json::from_value(json!({ "invoiceNumber": 1001 })).unwrap();
        assert_eq!(request.invoice_number.as_deref(), Some("1001"));
    }

    #[test]
    fn test_business_profile_only_fills_gaps() {
        let request: InvoiceRequest = serde_json::from_value(json!({
            "business": { "name": "Caller Ltd", "phone": "" }
        }))
        .unwrap();
        let profile = BusinessInput {
            name: Some("Stored Ltd".to_string()),
            phone: Some("+972-3-555-0000".to_string()),
            city: Some("Tel Aviv".to_string()),
            ..Default::default()
        };

        let merged = request.with_business_profile(&profile);
        let business = merged.business.unwrap();
        assert_eq!(business.name.as_deref(), Some("Caller Ltd"));
        assert_eq!(business.phone.as_deref(), Some("+972-3-555-0000"));
        assert_eq!(business.city.as_deref(), Some("Tel Aviv"));
        assert_eq!(business.email, None);
    }

    #[test]
    fn test_history_query_is_clamped() {
        let query = HistoryQuery { limit: Some(1000), offset: Some(-3) };
        assert_eq!(query.limit(), 200);
        assert_eq!(query.offset(), 0);

        let query = HistoryQuery { limit: None, offset: None };
        assert_eq!(query.limit(), 50);
    }
}
