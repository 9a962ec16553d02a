use serde::Deserialize;
use std::env;
use std::fs::{self, metadata};

use crate::cores::errors::AnalyzeError;

// ---------------------------------------------- Upload ----------------------------------------------
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UploadConfig {
    pub max_image_bytes: usize,
    pub default_mime: String,
    // Empty means any declared type is accepted.
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        UploadConfig {
            max_image_bytes: 20 * 1024 * 1024,
            default_mime: "image/jpeg".to_string(),
            allowed_mime_types: Vec::new(),
        }
    }
}

// ---------------------------------------------- Upstream ----------------------------------------------
// OpenAI-compatible chat completions endpoint
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub detail: String,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.7,
            max_tokens: 700,
            detail: "high".to_string(),
            timeout_secs: 60,
        }
    }
}

impl UpstreamConfig {
    pub fn api_key(&self) -> String {
        env::var(&self.api_key_env).unwrap_or_default()
    }
}

// ---------------------------------------------- Analysis ----------------------------------------------
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    Single,
    Chain,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PromptOverrides {
    pub system: Option<String>,
    pub user: Option<String>,
    pub trait_extraction: Option<String>,
    pub classification: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnalysisConfig {
    pub mode: PromptMode,
    pub match_regions: bool,
    pub top_n: usize,
    pub fuzzy_threshold: f64,
    pub default_region: Option<String>,
    // YAML file with `phrase: [region, ...]` entries; built-in table when unset.
    pub trait_table_file: Option<String>,
    pub prompts: PromptOverrides,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            mode: PromptMode::Single,
            match_regions: true,
            top_n: 3,
            fuzzy_threshold: 0.6,
            default_region: None,
            trait_table_file: None,
            prompts: PromptOverrides::default(),
        }
    }
}

// ---------------------------------------------- Rate limit ----------------------------------------------
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub tps: usize,
    pub bucket_capacity: usize,
    pub refill_interval: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            enabled: false,
            tps: 10,
            bucket_capacity: 20,
            refill_interval: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TlsConfig {
    pub cert_file: String,
    pub key_file: String,
}

// ---------------------------------------------- Config ----------------------------------------------
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub log_config: String,
    pub upload: UploadConfig,
    pub upstream: UpstreamConfig,
    pub analysis: AnalysisConfig,
    pub rate_limit: RateLimitConfig,
    pub tls: Option<TlsConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 8000,
            static_dir: "static".to_string(),
            log_config: "src/configs/log4rs.yaml".to_string(),
            upload: UploadConfig::default(),
            upstream: UpstreamConfig::default(),
            analysis: AnalysisConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tls: None,
        }
    }
}

impl Config {
    // Finds the first existing config file: $MORPHLENS_CONFIG, /etc, then the source tree.
    pub fn config_path() -> Option<String> {
        let mut candidates = Vec::new();
        if let Ok(path) = env::var("MORPHLENS_CONFIG") {
            candidates.push(path);
        }
        candidates.push("/etc/morphlens/configs.yaml".to_string());
        candidates.push("src/configs/configs.yaml".to_string());

        candidates.into_iter().find(|path| metadata(path).is_ok())
    }

    pub fn from_yaml(contents: &str) -> Result<Config, AnalyzeError> {
        serde_yaml::from_str(contents)
            .map_err(|err| AnalyzeError::Config(format!("Failed to parse config file: {}", err)))
    }

    pub fn load_config() -> Result<Config, AnalyzeError> {
        match Self::config_path() {
            Some(path) => {
                let contents = fs::read_to_string(&path)
                    .map_err(|err| AnalyzeError::Config(format!("Failed to read config file {}: {}", path, err)))?;
                Self::from_yaml(&contents)
            }
            None => Ok(Config::default()),
        }
    }
}
