pub mod analyze;
pub mod api_doc;
pub mod schemas;
pub mod static_files;
