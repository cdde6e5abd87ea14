pub mod avatar;
pub mod certificate;
pub mod document;
pub mod file_record;
pub mod gateway;
pub mod owner;
pub mod upload;
pub mod upload_link;
