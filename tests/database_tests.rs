mod common;

use invoice_pdf_server::invoice::models::InvoiceRequest;
use invoice_pdf_server::settings::models::UpdateBusinessSettingsRequest;
use serde_json::json;

use common::{sample_invoice, test_state};

fn normalized(state: &invoice_pdf_server::AppState, number: &str) -> invoice_pdf_server::invoice::models::NormalizedInvoice {
    let mut value = sample_invoice();
    value["invoiceNumber"] = json!(number);
    let request: InvoiceRequest = serde_json::from_value(value).unwrap();
    state.normalizer.normalize(&request)
}

#[tokio::test]
async fn test_seeding_is_idempotent() {
    let state = test_state().await;
    state.init_schema().await.unwrap();

    let names = state.list_template_names().await.unwrap();
    assert_eq!(names, vec!["exempt_business_receipt", "receipt", "tax_invoice"]);

    let inserted = state
        .insert_template_if_missing("receipt", "receipt", "<p>other</p>")
        .await
        .unwrap();
    assert!(!inserted);
    let receipt = state.get_template("receipt").await.unwrap().unwrap();
    assert_eq!(receipt.version, 1);
    assert_ne!(receipt.content, "<p>other</p>");

    let business = state.get_business_settings().await.unwrap().unwrap();
    assert_eq!(business.name, "Your Business Name");
}

#[tokio::test]
async fn test_template_updates_bump_version() {
    let state = test_state().await;

    let updated = state
        .update_template_content("tax_invoice", "<p>{{ total }}</p>")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.kind, "invoice");

    let again = state
        .update_template_content("tax_invoice", "<p>{{ subtotal }}</p>")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.version, 3);
    assert_eq!(again.content, "<p>{{ subtotal }}</p>");

    assert!(state
        .update_template_content("unknown", "<p></p>")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_invoice_history_pages_newest_first() {
    let state = test_state().await;

    for number in ["A-1", "A-2", "A-3"] {
        state.save_invoice_record(&normalized(&state, number)).await.unwrap();
    }

    let page = state.get_invoice_history(2, 0).await.unwrap();
    let numbers: Vec<&str> = page.iter().map(|r| r.invoice_number.as_str()).collect();
    assert_eq!(numbers, vec!["A-3", "A-2"]);

    let rest = state.get_invoice_history(2, 2).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].invoice_number, "A-1");
    assert_eq!(rest[0].status, "generated");
    assert_eq!(rest[0].currency.as_deref(), Some("₪"));
}

#[tokio::test]
async fn test_invoice_detail_decodes_stored_record() {
    let state = test_state().await;
    let invoice = normalized(&state, "D-9");
    let id = state.save_invoice_record(&invoice).await.unwrap();

    let detail = state.get_invoice_by_id(id).await.unwrap().unwrap();
    assert_eq!(detail.record.id, id);
    assert_eq!(detail.record.total_amount, Some(220.0));
    let data = detail.data.unwrap();
    assert_eq!(data["invoiceNumber"], "D-9");
    assert_eq!(data["generatedDate"], invoice.generated_date.as_str());

    assert!(state.get_invoice_by_id(id + 100).await.unwrap().is_none());
}

#[tokio::test]
async fn test_business_settings_update_replaces_latest_row() {
    let state = test_state().await;

    let saved = state
        .update_business_settings(&UpdateBusinessSettingsRequest {
            name: "Studio Noa".to_string(),
            email: Some("noa@example.com".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(saved.name, "Studio Noa");
    assert_eq!(saved.address, None);

    let profile = state.get_business_settings().await.unwrap().unwrap().to_profile();
    assert_eq!(profile.name.as_deref(), Some("Studio Noa"));
    assert_eq!(profile.email.as_deref(), Some("noa@example.com"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM business_settings")
        .fetch_one(&state.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_settings_upsert_keeps_description() {
    let state = test_state().await;
    assert!(state.get_setting("footer").await.unwrap().is_none());

    state
        .set_setting("footer", Some("תודה!"), Some("Receipt footer"))
        .await
        .unwrap();
    let updated = state.set_setting("footer", Some("Thanks"), None).await.unwrap();
    assert_eq!(updated.value.as_deref(), Some("Thanks"));
    assert_eq!(updated.description.as_deref(), Some("Receipt footer"));
}
