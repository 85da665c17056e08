use invoice_pdf_server::auth::api_key::{
    generate_formatted_api_key, DEFAULT_KEY_BYTES, DEFAULT_KEY_PREFIX,
};

fn main() {
    let prefix = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());
    let api_key = generate_formatted_api_key(&prefix, DEFAULT_KEY_BYTES);

    println!("Generated API key:");
    println!("{}", api_key);
    println!();
    println!("Add this to your environment:");
    println!("API_KEY={}", api_key);
    println!();
    println!("Keep this key secret and out of version control.");
}
