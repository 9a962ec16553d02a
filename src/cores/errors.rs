use actix_web::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    // The only failure kind of the completion call, surfaced verbatim.
    #[error("{0}")]
    Upstream(String),

    #[error("Invalid request: the `image` field is required")]
    MissingImage,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image is {size} bytes, above the {limit} byte limit")]
    ImageTooLarge { size: usize, limit: usize },

    // The body overran the multipart limits before the image size was known.
    #[error("Image is above the {limit} byte limit")]
    UploadTooLarge { limit: usize },

    #[error("Invalid multipart body: {0}")]
    MalformedUpload(String),

    #[error("{0}")]
    Config(String),
}

impl AnalyzeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Upstream failures keep a 200 so the bundled frontend can read `error`.
            AnalyzeError::Upstream(_) => StatusCode::OK,
            AnalyzeError::MissingImage
            | AnalyzeError::InvalidImage(_)
            | AnalyzeError::MalformedUpload(_) => StatusCode::BAD_REQUEST,
            AnalyzeError::ImageTooLarge { .. } | AnalyzeError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AnalyzeError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AnalyzeError> for std::io::Error {
    fn from(err: AnalyzeError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}
