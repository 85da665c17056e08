pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod validation;

pub use normalizer::{Clock, InvoiceNormalizer};

#[cfg(test)]
mod tests;
