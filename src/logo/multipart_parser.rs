use std::path::Path;

use actix_multipart::Multipart;
use futures_util::StreamExt;
use sanitize_filename::sanitize;

use crate::error::AppError;

pub const LOGO_FIELD: &str = "logo";
const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

/// An image pulled out of the upload form, not yet written anywhere.
#[derive(Debug)]
pub struct ParsedLogo {
    pub original_name: String,
    pub extension: String,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum MultipartParseError {
    #[error("Multipart field error: {0}")]
    FieldError(String),
    #[error("No file uploaded. Send an image in the '{}' field", LOGO_FIELD)]
    MissingFile,
    #[error("Only image files are allowed (JPEG, PNG, GIF)")]
    UnsupportedType,
    #[error("File exceeds the {0} byte upload limit")]
    TooLarge(usize),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<MultipartParseError> for AppError {
    fn from(error: MultipartParseError) -> Self {
        match error {
            MultipartParseError::IoError(_) => AppError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                error.to_string(),
            )),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

/// Extension and declared MIME type must both name an allowed image type.
pub fn is_allowed_image(filename: &str, mime: Option<&str>) -> Option<String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    let mime = mime?.to_ascii_lowercase();
    let subtype = mime.strip_prefix("image/")?;
    if ALLOWED_EXTENSIONS.contains(&subtype) {
        Some(extension)
    } else {
        None
    }
}

pub struct MultipartParser;

impl MultipartParser {
    /// Read the `logo` field, enforcing type and `max_size`. Other fields are ignored.
    pub async fn parse_logo_multipart(
        mut multipart: Multipart,
        max_size: usize,
    ) -> Result<ParsedLogo, MultipartParseError> {
        let mut logo: Option<ParsedLogo> = None;

        while let Some(item) = multipart.next().await {
            let mut field = item.map_err(|e| MultipartParseError::FieldError(e.to_string()))?;
            let content_disposition = field.content_disposition().ok_or_else(|| {
                MultipartParseError::FieldError("Content disposition not found".to_string())
            })?;
            let name = content_disposition
                .get_name()
                .ok_or_else(|| MultipartParseError::FieldError("Field name not found".to_string()))?;

            if name != LOGO_FIELD || logo.is_some() {
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| MultipartParseError::IoError(e.to_string()))?;
                }
                continue;
            }

            let original_name = content_disposition
                .get_filename()
                .map(|f| sanitize(f))
                .filter(|f| !f.is_empty())
                .ok_or(MultipartParseError::MissingFile)?;
            let mime = field.content_type().map(|m| m.essence_str().to_string());
            let extension = is_allowed_image(&original_name, mime.as_deref())
                .ok_or(MultipartParseError::UnsupportedType)?;

            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| MultipartParseError::IoError(e.to_string()))?;
                if data.len() + chunk.len() > max_size {
                    return Err(MultipartParseError::TooLarge(max_size));
                }
                data.extend_from_slice(&chunk);
            }

            logo = Some(ParsedLogo {
                original_name,
                extension,
                data,
            });
        }

        match logo {
            Some(logo) if !logo.data.is_empty() => Ok(logo),
            _ => Err(MultipartParseError::MissingFile),
        }
    }
}
