pub mod document;
pub mod file_record;
pub mod upload_link;
pub mod user;

pub use file_record::OwnerKind;
