pub mod matcher;
pub mod similarity;
pub mod table;
