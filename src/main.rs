use actix_web::{web, App, HttpServer};
use actix_cors::Cors;
use std::{fs::File, io::{self, BufReader}, path::Path, sync::Arc};
use log::{info, warn, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod apis;
mod configs;
mod cores;
mod middleware;
mod utils;

use crate::apis::api_doc::ApiDoc;
use crate::apis::schemas::AppState;
use crate::configs::settings::{Config, TlsConfig};
use crate::cores::analyzer::Analyzer;
use crate::cores::errors::AnalyzeError;
use crate::cores::image::UploadPolicy;
use crate::cores::prompts::AnalysisPrompts;
use crate::cores::regions::matcher::RegionMatcher;
use crate::cores::regions::table::TraitTable;
use crate::cores::vision_models::openai::OpenAIVision;
use crate::middleware::rate_limit::RateLimitMiddleware;

#[cfg(test)]
mod test;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::load_config()?;
    init_logging(&config.log_config)?;

    let state = web::Data::new(build_state(&config)?);

    let rate_limiter = RateLimitMiddleware::from_config(&config.rate_limit);
    let upload = config.upload.clone();

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin() // cors
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec!["Content-Type"])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(rate_limiter.clone())
            .app_data(state.clone())
            .app_data(apis::analyze::multipart_config(&upload))
            .configure(apis::analyze::configure)
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
            .configure(apis::static_files::configure)
    });

    // Set the listening address
    let addr = (config.host.clone(), config.port);
    let server = match &config.tls {
        Some(tls) => {
            info!("Starting HTTPS server on {}:{}", addr.0, addr.1);
            server.bind_rustls_0_23(addr, load_tls_config(tls)?)?
        }
        None => {
            info!("Starting HTTP server on {}:{}", addr.0, addr.1);
            server.bind(addr)?
        }
    };
    server.run().await
}

// Wires the analyzer, trait table and upload policy from config.
pub fn build_state(config: &Config) -> Result<AppState, AnalyzeError> {
    let api_key = config.upstream.api_key();
    if api_key.is_empty() {
        warn!("{} is not set; upstream calls will be rejected", config.upstream.api_key_env);
    }
    let model = Arc::new(OpenAIVision::new(&config.upstream, api_key)?);

    let matcher = if config.analysis.match_regions {
        let table = match &config.analysis.trait_table_file {
            Some(path) => TraitTable::from_yaml_file(path)?,
            None => TraitTable::builtin()
                .map_err(|err| AnalyzeError::Config(format!("Failed to compile trait table: {}", err)))?,
        };
        if table.is_empty() {
            warn!("trait table is empty; only the default region can be returned");
        } else {
            info!("loaded {} trait phrases", table.len());
        }
        Some(RegionMatcher::from_config(Arc::new(table), &config.analysis))
    } else {
        None
    };

    let analyzer = Analyzer::new(
        model,
        AnalysisPrompts::from(&config.analysis.prompts),
        matcher,
        config.analysis.mode,
        config.upstream.detail.clone(),
    );

    Ok(AppState {
        analyzer: Arc::new(analyzer),
        upload_policy: UploadPolicy::from(&config.upload),
        default_mime: config.upload.default_mime.clone(),
        static_dir: config.static_dir.clone(),
    })
}

// log4rs from the YAML file when present, console otherwise.
fn init_logging(log_config: &str) -> io::Result<()> {
    if Path::new(log_config).exists() {
        match log4rs::init_file(log_config, Default::default()) {
            Ok(()) => return Ok(()),
            Err(err) => eprintln!("Failed to load {}: {}; logging to console", log_config, err),
        }
    }

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}")))
        .build();
    let log_config = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .map_err(|err| io::Error::new(io::ErrorKind::Other, format!("Invalid log config: {}", err)))?;
    log4rs::init_config(log_config)
        .map(|_| ())
        .map_err(|err| io::Error::new(io::ErrorKind::Other, format!("Logger setup failed: {}", err)))
}

fn load_tls_config(tls: &TlsConfig) -> io::Result<rustls::ServerConfig> {
    let mut certs_file = BufReader::new(File::open(&tls.cert_file)?);
    let mut key_file = BufReader::new(File::open(&tls.key_file)?);

    let tls_certs = rustls_pemfile::certs(&mut certs_file)
        .collect::<Result<Vec<_>, _>>()?;
    let tls_key = rustls_pemfile::private_key(&mut key_file)?
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("No private key in {}", tls.key_file)))?;

    // set up TLS config options
    rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(tls_certs, tls_key)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}
