use actix_web::{get, post, web, Error, HttpRequest, HttpResponse, Responder};
use actix_web::error::PayloadError;
use actix_multipart::MultipartError;
use actix_multipart::form::{bytes::Bytes as FormBytes, MultipartForm, MultipartFormConfig};
use log::info;

use crate::apis::schemas::{AnalyzeResponse, AppState, ErrorResponse};
use crate::configs::settings::UploadConfig;
use crate::cores::errors::AnalyzeError;
use crate::cores::image::ImagePayload;
use crate::utils::log::record;

// Slack for multipart boundaries and headers around the image part.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
       .service(analyze);
}

// Buffers the upload in memory with limits derived from the image size cap.
// Extraction failures are turned into `{"error": ...}` responses by the handler.
pub fn multipart_config(upload: &UploadConfig) -> MultipartFormConfig {
    let limit = upload.max_image_bytes.saturating_add(MULTIPART_OVERHEAD);
    MultipartFormConfig::default()
        .total_limit(limit)
        .memory_limit(limit)
}

// Overflow can surface directly or wrapped in a field error.
fn is_overflow(err: &MultipartError) -> bool {
    match err {
        MultipartError::Payload(PayloadError::Overflow) => true,
        MultipartError::Field { source, .. } => {
            matches!(source.as_error::<PayloadError>(), Some(PayloadError::Overflow))
                || source.as_error::<MultipartError>().map_or(false, is_overflow)
        }
        _ => false,
    }
}

// Maps a failed multipart extraction onto 413 for oversized bodies and 400 otherwise.
pub fn upload_failure(err: &Error, max_image_bytes: usize) -> AnalyzeError {
    match err.as_error::<MultipartError>() {
        Some(multipart) if is_overflow(multipart) => AnalyzeError::UploadTooLarge { limit: max_image_bytes },
        Some(multipart) => AnalyzeError::MalformedUpload(multipart.to_string()),
        None => AnalyzeError::MalformedUpload(err.to_string()),
    }
}

#[derive(MultipartForm)]
pub struct AnalyzeForm {
    pub image: Option<FormBytes>,
}

#[get("/health")]
pub async fn health() -> impl Responder {
    "OK"
}

#[utoipa::path(
    post,
    path = "/analyze",
    request_body(content = crate::apis::schemas::AnalyzeUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Model answer, or `error` when the upstream call failed", body = AnalyzeResponse),
        (status = 400, body = ErrorResponse),
        (status = 413, body = ErrorResponse),
    )
)]

// post /analyze, multipart field `image`
#[post("/analyze")]
pub async fn analyze(
    req: HttpRequest,
    data: web::Data<AppState>,
    form: Result<MultipartForm<AnalyzeForm>, Error>,
) -> Result<impl Responder, Error> {
    // 1. Read the upload into an image payload
    let form = match form {
        Ok(MultipartForm(form)) => form,
        Err(err) => return Ok(error_response(&req, upload_failure(&err, data.upload_policy.max_image_bytes))),
    };
    let image = match form.image {
        Some(file) => {
            let declared = file.content_type.as_ref().map(|mime| mime.essence_str().to_string());
            ImagePayload::new(file.data, declared.as_deref(), &data.default_mime)
        }
        None => return Ok(error_response(&req, AnalyzeError::MissingImage)),
    };

    // 2. Enforce the upload policy before anything leaves the process
    if let Err(err) = data.upload_policy.check(&image) {
        return Ok(error_response(&req, err));
    }
    info!("analyzing {} byte {} image with {}", image.len(), image.mime_type, data.analyzer.model_name());

    // 3. Call the model and shape the response
    match data.analyzer.analyze(&image).await {
        Ok(analysis) => {
            record(&req, 200, None);
            Ok(HttpResponse::Ok().json(AnalyzeResponse {
                result: analysis.text,
                regions: analysis.regions,
            }))
        }
        Err(err) => Ok(error_response(&req, err)),
    }
}

fn error_response(req: &HttpRequest, err: AnalyzeError) -> HttpResponse {
    let status = err.status_code();
    let message = err.to_string();
    record(req, status.as_u16(), Some(&message));
    HttpResponse::build(status).json(ErrorResponse { error: message })
}
