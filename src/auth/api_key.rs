use rand::RngCore;

pub const DEFAULT_KEY_PREFIX: &str = "html2pdf";
pub const DEFAULT_KEY_BYTES: usize = 32;

/// `length` random bytes, hex encoded.
pub fn generate_api_key(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn generate_formatted_api_key(prefix: &str, length: usize) -> String {
    format!("{}_{}", prefix, generate_api_key(length))
}
