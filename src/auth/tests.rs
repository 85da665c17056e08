use actix_web::test::TestRequest;

use super::api_key::{generate_api_key, generate_formatted_api_key};
use super::{authorize, extract_api_key, AuthError};

#[test]
fn test_unconfigured_key_wins_over_everything() {
    assert_eq!(authorize(None, None), Err(AuthError::NotConfigured));
    assert_eq!(authorize(Some("abc"), None), Err(AuthError::NotConfigured));
}

#[test]
fn test_missing_and_wrong_keys() {
    assert_eq!(authorize(None, Some("secret")), Err(AuthError::Missing));
    assert_eq!(authorize(Some("secreT"), Some("secret")), Err(AuthError::Invalid));
    assert_eq!(authorize(Some("secret-longer"), Some("secret")), Err(AuthError::Invalid));
    assert_eq!(authorize(Some("secret"), Some("secret")), Ok(()));
}

#[test]
fn test_key_from_header() {
    let req = TestRequest::default()
        .insert_header(("x-api-key", "from-header"))
        .insert_header(("Authorization", "Bearer from-bearer"))
        .to_http_request();
    assert_eq!(extract_api_key(&req).as_deref(), Some("from-header"));
}

#[test]
fn test_key_from_bearer() {
    let req = TestRequest::default()
        .insert_header(("Authorization", "Bearer from-bearer"))
        .to_http_request();
    assert_eq!(extract_api_key(&req).as_deref(), Some("from-bearer"));
}

#[test]
fn test_key_from_query() {
    let req = TestRequest::with_uri("/api/templates?api_key=from-query").to_http_request();
    assert_eq!(extract_api_key(&req).as_deref(), Some("from-query"));

    let req = TestRequest::with_uri("/api/templates").to_http_request();
    assert_eq!(extract_api_key(&req), None);
}

#[test]
fn test_generated_keys() {
    let key = generate_api_key(16);
    assert_eq!(key.len(), 32);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(generate_api_key(16), key);

    let formatted = generate_formatted_api_key("html2pdf", 32);
    assert!(formatted.starts_with("html2pdf_"));
    assert_eq!(formatted.len(), "html2pdf_".len() + 64);
}
