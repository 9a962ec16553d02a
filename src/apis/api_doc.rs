use utoipa::OpenApi;

use crate::apis::analyze;
use crate::apis::schemas::{AnalyzeResponse, AnalyzeUpload, ErrorResponse};


#[derive(OpenApi)]
#[openapi(
    paths(
        analyze::analyze,
    ),
    components(
        schemas(AnalyzeResponse, AnalyzeUpload, ErrorResponse)
    )
)]

pub struct ApiDoc;
