mod common;

mod document;
mod upload_link;
mod user;
