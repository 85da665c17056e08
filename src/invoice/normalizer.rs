//! Template data normalization.
//!
//! Turns a possibly incomplete [`InvoiceRequest`] into a [`NormalizedInvoice`]:
//! every field defaulted, totals derived when the caller omitted them. The
//! only input besides the request is the clock, which makes the result
//! deterministic for a fixed [`Clock`].

use chrono::{DateTime, Duration, FixedOffset, Local};

use super::models::{
    BusinessInput, CustomerInput, InvoiceRequest, LineItem, NormalizedBusiness,
    NormalizedCustomer, NormalizedInvoice,
};

const DUE_IN_DAYS: i64 = 30;

/// Time source for the generated and default dates.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(DateTime<FixedOffset>),
}

impl Clock {
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            Clock::System => Local::now().fixed_offset(),
            Clock::Fixed(at) => *at,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InvoiceNormalizer {
    clock: Clock,
}

impl Default for InvoiceNormalizer {
    fn default() -> Self {
        Self::new(Clock::System)
    }
}

impl InvoiceNormalizer {
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }

    pub fn fixed(at: DateTime<FixedOffset>) -> Self {
        Self::new(Clock::Fixed(at))
    }

    pub fn normalize(&self, request: &InvoiceRequest) -> NormalizedInvoice {
        normalize_at(request, self.clock.now())
    }
}

/// Normalize `request` as of `now`. Never fails and never touches the input.
pub fn normalize_at(request: &InvoiceRequest, now: DateTime<FixedOffset>) -> NormalizedInvoice {
    let today = now.date_naive();

    let items = match &request.items {
        Some(items) if !items.is_empty() => items.clone(),
        _ => vec![LineItem::placeholder()],
    };

    let (subtotal, tax_amount, total) = derive_totals(request);

    NormalizedInvoice {
        invoice_number: text_or_else(&request.invoice_number, || {
            format!("INV-{}", now.timestamp_millis())
        }),
        invoice_date: text_or_else(&request.invoice_date, || {
            today.format("%Y-%m-%d").to_string()
        }),
        due_date: text_or_else(&request.due_date, || {
            (today + Duration::days(DUE_IN_DAYS))
                .format("%Y-%m-%d")
                .to_string()
        }),
        business: normalize_business(request.business.as_ref()),
        customer: normalize_customer(request.customer.as_ref()),
        items,
        subtotal,
        tax_rate: truthy(request.tax_rate).unwrap_or(0.0),
        tax_amount,
        total,
        payment_terms: text_or(&request.payment_terms, "30 days"),
        payment_method: text_or(&request.payment_method, "Bank Transfer"),
        notes: text_or(&request.notes, ""),
        template_type: text_or(&request.template_type, "receipt"),
        currency: text_or(&request.currency, "₪"),
        generated_date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// Derive `(subtotal, tax_amount, total)`.
///
/// Each step only runs when the caller's own value is absent or zero. The
/// tax step additionally requires a non-zero subtotal, so a zero subtotal
/// never produces a computed tax.
pub fn derive_totals(request: &InvoiceRequest) -> (f64, f64, f64) {
    let mut subtotal = truthy(request.subtotal).unwrap_or(0.0);
    let mut tax_amount = truthy(request.tax_amount).unwrap_or(0.0);
    let mut total = truthy(request.total).unwrap_or(0.0);

    if truthy(request.subtotal).is_none() {
        if let Some(items) = &request.items {
            subtotal = items.iter().map(|item| item.amount.unwrap_or(0.0)).sum();
        }
    }

    if truthy(request.tax_amount).is_none() && subtotal != 0.0 {
        if let Some(rate) = truthy(request.tax_rate) {
            tax_amount = subtotal * (rate / 100.0);
        }
    }

    if truthy(request.total).is_none() {
        total = subtotal + tax_amount;
    }

    (subtotal, tax_amount, total)
}

fn normalize_business(input: Option<&BusinessInput>) -> NormalizedBusiness {
    let empty = BusinessInput::default();
    let b = input.unwrap_or(&empty);
    NormalizedBusiness {
        name: text_or(&b.name, "Your Business Name"),
        address: text_or(&b.address, "123 Business Street"),
        city: text_or(&b.city, "Business City"),
        state: text_or(&b.state, "State"),
        postal_code: text_or(&b.postal_code, "12345"),
        phone: text_or(&b.phone, "+1 (555) 123-4567"),
        email: text_or(&b.email, "info@yourbusiness.com"),
        website: text_or(&b.website, "www.yourbusiness.com"),
        tax_id: text_or(&b.tax_id, ""),
        logo: b.logo.clone().filter(|logo| !logo.is_empty()),
    }
}

fn normalize_customer(input: Option<&CustomerInput>) -> NormalizedCustomer {
    let empty = CustomerInput::default();
    let c = input.unwrap_or(&empty);
    NormalizedCustomer {
        name: text_or(&c.name, "Customer Name"),
        address: text_or(&c.address, "456 Customer Street"),
        city: text_or(&c.city, "Customer City"),
        state: text_or(&c.state, "State"),
        postal_code: text_or(&c.postal_code, "67890"),
        email: text_or(&c.email, "customer@email.com"),
        phone: text_or(&c.phone, "+1 (555) 987-6543"),
    }
}

fn truthy(value: Option<f64>) -> Option<f64> {
    value.filter(|n| *n != 0.0 && !n.is_nan())
}

fn text_or(value: &Option<String>, default: &str) -> String {
    text_or_else(value, || default.to_string())
}

fn text_or_else(value: &Option<String>, default: impl FnOnce() -> String) -> String {
    match value.as_deref() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => default(),
    }
}
