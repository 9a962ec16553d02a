pub mod analyzer;
pub mod errors;
pub mod image;
pub mod prompts;
pub mod regions;
pub mod schemas;
pub mod vision_models;
