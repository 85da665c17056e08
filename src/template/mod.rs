pub mod handlers;
pub mod models;

/// A template shipped with the binary and seeded into an empty store.
#[derive(Debug, Clone, Copy)]
pub struct BundledTemplate {
    pub name: &'static str,
    pub kind: &'static str,
    pub content: &'static str,
}

pub const BUNDLED_TEMPLATES: [BundledTemplate; 3] = [
    BundledTemplate {
        name: "receipt",
        kind: "receipt",
        content: include_str!("../../static/templates/receipt.html"),
    },
    BundledTemplate {
        name: "tax_invoice",
        kind: "invoice",
        content: include_str!("../../static/templates/tax_invoice.html"),
    },
    BundledTemplate {
        name: "exempt_business_receipt",
        kind: "receipt",
        content: include_str!("../../static/templates/exempt_business_receipt.html"),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::models::InvoiceRequest;
    use crate::invoice::normalizer::normalize_at;
    use crate::render::TemplateRenderer;
    use chrono::DateTime;

    #[test]
    fn test_bundled_templates_render_a_default_invoice() {
        let now = DateTime::parse_from_rfc3339("2026-02-01T10:00:00+02:00").unwrap();
        let invoice = normalize_at(&InvoiceRequest::default(), now);
        let renderer = TemplateRenderer::new();

        for template in BUNDLED_TEMPLATES {
            let html = renderer
                .render(template.name, template.content, &invoice)
                .unwrap_or_else(|e| panic!("{} failed: {}", template.name, e));
            assert!(html.contains("Customer Name"), "{}", template.name);
            assert!(html.contains("Sample Item"), "{}", template.name);
            assert!(html.contains(&invoice.invoice_number), "{}", template.name);
        }
    }

    #[test]
    fn test_whole_quantities_and_rates_render_without_fraction() {
        let now = DateTime::parse_from_rfc3339("2026-02-01T10:00:00+02:00").unwrap();
        let request: InvoiceRequest = serde_json::from_value(serde_json::json!({
            "items": [{ "description": "Design", "quantity": 2, "rate": 150, "amount": 300 }],
            "taxRate": 17
        }))
        .unwrap();
        let invoice = normalize_at(&request, now);
        let template = BUNDLED_TEMPLATES
            .iter()
            .find(|t| t.name == "tax_invoice")
            .unwrap();

        let html = TemplateRenderer::new()
            .render(template.name, template.content, &invoice)
            .unwrap();
        assert!(html.contains("(17%)"));
        assert!(html.contains("<td>2</td>"));
        assert!(!html.contains("17.0"));
    }
}
