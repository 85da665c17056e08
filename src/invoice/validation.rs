//! Request validation.
//!
//! Errors are collected rather than returned on the first failure so callers
//! get every problem with their payload in one response.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::models::InvoiceRequest;

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `items[0].rate`.
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} is required", label))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default, Clone)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn summary(&self) -> String {
        format!("Validation failed: {} error(s) found", self.errors.len())
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

pub fn validate_required(value: Option<&str>, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.map_or(true, |v| v.trim().is_empty()) {
        errors.add(ValidationError::empty_field(field, label));
    }
}

/// Only the template name is needed to render a preview.
pub fn validate_preview_request(request: &InvoiceRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    validate_required(
        request.template_type.as_deref(),
        "templateType",
        "Template type",
        &mut errors,
    );
    errors.into_result()
}

/// Rules applied before generating an invoice PDF.
pub fn validate_invoice_request(request: &InvoiceRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    validate_required(
        request.template_type.as_deref(),
        "templateType",
        "Template type",
        &mut errors,
    );
    validate_required(
        request.customer.as_ref().and_then(|c| c.name.as_deref()),
        "customer.name",
        "Customer name",
        &mut errors,
    );

    let items = request.items.as_deref().unwrap_or_default();
    if items.is_empty() {
        errors.add(
            ValidationError::new("items", "At least one item is required")
                .with_suggestion("Provide an items array with description, quantity and rate"),
        );
    }

    for (index, item) in items.iter().enumerate() {
        let position = index + 1;
        if item.description.as_deref().map_or(true, str::is_empty) {
            errors.add(ValidationError::new(
                format!("items[{}].description", index),
                format!("Item {}: description is required", position),
            ));
        }
        if !item.quantity.is_some_and(|q| q > 0.0) {
            errors.add(ValidationError::new(
                format!("items[{}].quantity", index),
                format!("Item {}: valid quantity is required", position),
            ));
        }
        if !item.rate.is_some_and(|r| r != 0.0 && r >= 0.0) {
            errors.add(
                ValidationError::new(
                    format!("items[{}].rate", index),
                    format!("Item {}: valid rate is required", position),
                )
                .with_suggestion("Rate must be a positive number"),
            );
        }
    }

    errors.into_result()
}
