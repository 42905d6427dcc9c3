//! Confluence module providing the API trait, the HTTP client, and the data
//! models shared by both.

pub mod api;
pub mod client;
pub mod models;

pub use api::ConfluenceApi;
pub use client::ConfluenceClient;
pub use models::{
  Attachment, AttachmentsResponse, Page, PageAncestor, PageBody, PageSpace, PageVersion, StorageFormat, UploadFile,
};
