use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::cores::analyzer::Analyzer;
use crate::cores::image::UploadPolicy;

// Shared, read-only state handed to every worker.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub upload_policy: UploadPolicy,
    pub default_mime: String,
    pub static_dir: String,
}

// ------------------------------------------ Analyze API ------------------------------------------
#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct AnalyzeResponse {
    pub result: String,                       // Free-text answer from the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<String>>,         // Most associated regions, most frequent first.
}

// Documents the multipart body of /analyze.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct AnalyzeUpload {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

// ------------------------------------------ General Error API ------------------------------------------
#[derive(Deserialize, Serialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
