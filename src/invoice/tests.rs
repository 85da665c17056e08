use chrono::{DateTime, FixedOffset};
use serde_json::json;

use super::models::{InvoiceRequest, NormalizedInvoice};
use super::normalizer::{derive_totals, normalize_at, InvoiceNormalizer};

fn at(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap()
}

fn request(value: serde_json::Value) -> InvoiceRequest {
    serde_json::from_value(value).unwrap()
}

fn renormalize(invoice: &NormalizedInvoice, now: DateTime<FixedOffset>) -> NormalizedInvoice {
    let as_request: InvoiceRequest =
        serde_json::from_value(serde_json::to_value(invoice).unwrap()).unwrap();
    normalize_at(&as_request, now)
}

#[test]
fn test_subtotal_sums_coerced_item_amounts() {
    let req = request(json!({
        "items": [{ "amount": 100 }, { "amount": "50" }, { "amount": null }]
    }));
    let (subtotal, tax, total) = derive_totals(&req);
    assert_eq!(subtotal, 150.0);
    assert_eq!(tax, 0.0);
    assert_eq!(total, 150.0);
}

#[test]
fn test_tax_derived_from_rate() {
    let req = request(json!({ "subtotal": 200, "taxRate": 10 }));
    assert_eq!(derive_totals(&req), (200.0, 20.0, 220.0));
}

#[test]
fn test_zero_subtotal_skips_tax() {
    let req = request(json!({ "subtotal": 0, "taxRate": 10 }));
    assert_eq!(derive_totals(&req), (0.0, 0.0, 0.0));
}

#[test]
fn test_given_total_is_never_overwritten() {
    let req = request(json!({ "subtotal": 100, "taxAmount": 17, "total": 999 }));
    let (subtotal, tax, total) = derive_totals(&req);
    assert_eq!(subtotal, 100.0);
    assert_eq!(tax, 17.0);
    assert_eq!(total, 999.0);
}

#[test]
fn test_given_tax_amount_wins_over_rate() {
    let req = request(json!({ "subtotal": 100, "taxRate": 50, "taxAmount": 5 }));
    assert_eq!(derive_totals(&req), (100.0, 5.0, 105.0));
}

#[test]
fn test_empty_request_gets_every_default() {
    let now = at("2026-03-01T09:30:00+02:00");
    let invoice = normalize_at(&InvoiceRequest::default(), now);

    assert_eq!(invoice.invoice_number, format!("INV-{}", now.timestamp_millis()));
    assert_eq!(invoice.invoice_date, "2026-03-01");
    assert_eq!(invoice.due_date, "2026-03-31");
    assert_eq!(invoice.business.name, "Your Business Name");
    assert_eq!(invoice.business.tax_id, "");
    assert_eq!(invoice.business.logo, None);
    assert_eq!(invoice.customer.name, "Customer Name");
    assert_eq!(invoice.customer.postal_code, "67890");
    assert_eq!(invoice.items.len(), 1);
    assert_eq!(invoice.items[0].description.as_deref(), Some("Sample Item"));
    assert_eq!(invoice.payment_terms, "30 days");
    assert_eq!(invoice.payment_method, "Bank Transfer");
    assert_eq!(invoice.notes, "");
    assert_eq!(invoice.template_type, "receipt");
    assert_eq!(invoice.currency, "₪");
    assert_eq!(invoice.generated_date, "2026-03-01 09:30:00");
    assert_eq!((invoice.subtotal, invoice.tax_amount, invoice.total), (0.0, 0.0, 0.0));
}

#[test]
fn test_partial_business_keeps_caller_fields() {
    let invoice = normalize_at(
        &request(json!({ "business": { "name": "Acme", "city": "" } })),
        at("2026-03-01T00:00:00Z"),
    );
    assert_eq!(invoice.business.name, "Acme");
    assert_eq!(invoice.business.city, "Business City");
    assert_eq!(invoice.business.email, "info@yourbusiness.com");
}

#[test]
fn test_empty_items_are_replaced_but_summed_as_zero() {
    let invoice = normalize_at(
        &request(json!({ "items": [], "taxRate": 17 })),
        at("2026-03-01T00:00:00Z"),
    );
    assert_eq!(invoice.items.len(), 1);
    assert_eq!(invoice.subtotal, 0.0);
    assert_eq!(invoice.tax_amount, 0.0);
}

#[test]
fn test_items_keep_their_order() {
    let invoice = normalize_at(
        &request(json!({
            "items": [
                { "description": "first", "amount": 1 },
                { "description": "second", "amount": 2 }
            ]
        })),
        at("2026-03-01T00:00:00Z"),
    );
    let names: Vec<_> = invoice
        .items
        .iter()
        .map(|item| item.description.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["first", "second"]);
    assert_eq!(invoice.subtotal, 3.0);
}

#[test]
fn test_normalize_is_deterministic_for_fixed_clock() {
    let now = at("2026-05-10T12:00:00Z");
    let req = request(json!({ "customer": { "name": "Dana" }, "subtotal": 10 }));
    let normalizer = InvoiceNormalizer::fixed(now);
    assert_eq!(normalizer.normalize(&req), normalizer.normalize(&req));
}

#[test]
fn test_renormalizing_only_changes_generated_date() {
    let first_clock = at("2026-05-10T12:00:00Z");
    let later_clock = at("2026-06-20T08:15:00Z");
    let req = request(json!({
        "customer": { "name": "Dana" },
        "business": { "abn": "12 345" },
        "items": [{ "description": "Design", "quantity": 2, "rate": 150, "amount": 300 }],
        "taxRate": 17
    }));

    let first = normalize_at(&req, first_clock);
    let mut second = renormalize(&first, later_clock);
    assert_ne!(first.generated_date, second.generated_date);

    second.generated_date = first.generated_date.clone();
    assert_eq!(first, second);
}

#[test]
fn test_placeholder_item_is_only_summed_on_renormalizing() {
    let now = at("2026-05-10T12:00:00Z");
    let first = normalize_at(&request(json!({})), now);
    assert_eq!(first.items.len(), 1);
    assert_eq!((first.subtotal, first.tax_amount, first.total), (0.0, 0.0, 0.0));

    let second = renormalize(&first, now);
    assert_eq!((second.subtotal, second.tax_amount, second.total), (100.0, 0.0, 100.0));
}

#[test]
fn test_input_is_not_mutated() {
    let req = request(json!({ "items": [{ "amount": 5 }] }));
    let before = serde_json::to_value(&req).unwrap();
    let _ = normalize_at(&req, at("2026-01-01T00:00:00Z"));
    assert_eq!(serde_json::to_value(&req).unwrap(), before);
}
