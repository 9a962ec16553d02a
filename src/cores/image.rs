use base64::Engine as _;
use bytes::Bytes;

use crate::configs::settings::UploadConfig;
use crate::cores::errors::AnalyzeError;

// An uploaded image, held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl ImagePayload {
    pub fn new(bytes: impl Into<Bytes>, declared_mime: Option<&str>, default_mime: &str) -> Self {
        let mime_type = declared_mime
            .map(str::trim)
            .filter(|mime| !mime.is_empty())
            .unwrap_or(default_mime)
            .to_string();
        ImagePayload { bytes: bytes.into(), mime_type }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64())
    }
}

// Size and type checks applied before anything is sent upstream.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_image_bytes: usize,
    pub allowed_mime_types: Vec<String>,
}

impl From<&UploadConfig> for UploadPolicy {
    fn from(config: &UploadConfig) -> Self {
        UploadPolicy {
            max_image_bytes: config.max_image_bytes,
            allowed_mime_types: config
                .allowed_mime_types
                .iter()
                .map(|mime| mime.to_ascii_lowercase())
                .collect(),
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, image: &ImagePayload) -> Result<(), AnalyzeError> {
        if image.is_empty() {
            return Err(AnalyzeError::InvalidImage("uploaded file is empty".into()));
        }
        if image.len() > self.max_image_bytes {
            return Err(AnalyzeError::ImageTooLarge {
                size: image.len(),
                limit: self.max_image_bytes,
            });
        }
        if !self.allowed_mime_types.is_empty() {
            // Compare the essence only, parameters like `; charset=` are ignored.
            let essence = image
                .mime_type
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase();
            if !self.allowed_mime_types.contains(&essence) {
                return Err(AnalyzeError::InvalidImage(format!(
                    "content type {} is not accepted",
                    image.mime_type
                )));
            }
        }
        Ok(())
    }
}
