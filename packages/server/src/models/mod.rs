pub mod document;
pub mod file;
pub mod upload_link;
