use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Multipart form accepted by `POST /api/upload-logo`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct LogoUploadForm {
    /// JPEG, PNG or GIF image.
    #[schema(value_type = String, format = Binary)]
    pub logo: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedLogo {
    #[schema(example = "logo-4b6f0a9e-2d7c-4f0e-9a51-0c1d2e3f4a5b.png")]
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    #[schema(example = "http://localhost:3000/uploads/logos/logo-4b6f0a9e-2d7c-4f0e-9a51-0c1d2e3f4a5b.png")]
    pub url: String,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoUploadResponse {
    pub success: bool,
    pub message: String,
    pub logo: UploadedLogo,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoDeleteResponse {
    pub success: bool,
    pub message: String,
}
