use actix_web::HttpRequest;
use chrono::Local;
use log::{error, info};

// One combined-log style line for the access or error log.
pub fn log_request(req: &HttpRequest, status_code: u16, error_message: Option<&str>) -> String {
    let referer = req.headers()
        .get("Referer")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let user_agent = req.headers()
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let client_ip = req.peer_addr().map(|addr| addr.ip().to_string()).unwrap_or_else(|| "unknown".to_string());
    let request_method = req.method().as_str().to_string();
    let request_uri = req.uri().to_string();
    let http_version = format!("{:?}", req.version());
    let time = Local::now().format("%d/%b/%Y:%H:%M:%S %z");

    match error_message {
        // Error log format
        Some(msg) => format!(
            "{client_ip} - - [{time}] \"{request_method} {request_uri} {http_version}\" {status_code} \"{referer}\" \"{user_agent}\" \"{msg}\""
        ),
        // Access log format
        None => format!(
            "{client_ip} - - [{time}] \"{request_method} {request_uri} {http_version}\" {status_code} \"{referer}\" \"{user_agent}\""
        ),
    }
}

// Writes the access line, plus an error line when the request failed.
pub fn record(req: &HttpRequest, status_code: u16, error_message: Option<&str>) {
    info!(target: "access", "{}", log_request(req, status_code, None));
    if let Some(msg) = error_message {
        error!(target: "error", "{}", log_request(req, status_code, Some(msg)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn access_line_has_request_and_status() {
        let req = TestRequest::post()
            .uri("/analyze")
            .insert_header(("User-Agent", "curl/8.0"))
            .peer_addr("10.0.0.7:5555".parse().unwrap())
            .to_http_request();

        let line = log_request(&req, 200, None);
        assert!(line.starts_with("10.0.0.7 - - ["));
        assert!(line.contains("\"POST /analyze HTTP/1.1\" 200 \"-\" \"curl/8.0\""));
    }

    #[test]
    fn error_line_appends_message() {
        let req = TestRequest::get().uri("/analyze").to_http_request();
        let line = log_request(&req, 413, Some("Image too large"));
        assert!(line.starts_with("unknown - - ["));
        assert!(line.ends_with("413 \"-\" \"unknown\" \"Image too large\""));
    }
}
