use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use std::path::{Component, Path, PathBuf};

use crate::apis::schemas::{AppState, ErrorResponse};
use crate::utils::log::record;

// Registered last: it catches every GET the API routes did not.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(static_file);
}

// Maps a request path onto the static directory. Parent components and
// dot-files (`.env`, `.git`) are never served.
pub fn resolve_static_path(root: &str, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut resolved = PathBuf::from(root);
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                if part.to_string_lossy().starts_with('.') {
                    return None;
                }
                resolved.push(part);
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

// get /{path}, index.html for directories
#[get("/{path:.*}")]
pub async fn static_file(req: HttpRequest, path: web::Path<String>, data: web::Data<AppState>) -> impl Responder {
    let mut file_path = match resolve_static_path(&data.static_dir, &path) {
        Some(file_path) => file_path,
        None => return not_found(&req),
    };
    if file_path.is_dir() {
        file_path.push("index.html");
    }

    match tokio::fs::read(&file_path).await {
        Ok(contents) => {
            record(&req, 200, None);
            let content_type = mime_guess::from_path(&file_path).first_or_octet_stream();
            HttpResponse::Ok().content_type(content_type.as_ref()).body(contents)
        }
        Err(_) => not_found(&req),
    }
}

fn not_found(req: &HttpRequest) -> HttpResponse {
    record(req, 404, None);
    HttpResponse::NotFound().json(ErrorResponse {
        error: "Not Found".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_inside_root_only() {
        assert_eq!(resolve_static_path("web", "/app.js"), Some(PathBuf::from("web/app.js")));
        assert_eq!(resolve_static_path("web", "css/./main.css"), Some(PathBuf::from("web/css/main.css")));
        assert_eq!(resolve_static_path("web", ""), Some(PathBuf::from("web")));
        assert_eq!(resolve_static_path("web", "../secret"), None);
        assert_eq!(resolve_static_path("web", "a/../../b"), None);
    }

    #[test]
    fn hides_dot_files() {
        assert_eq!(resolve_static_path(".", ".env"), None);
        assert_eq!(resolve_static_path(".", "assets/.git/config"), None);
    }
}
