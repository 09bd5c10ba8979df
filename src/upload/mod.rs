//! Multipart upload of a text message plus one image
//!
//! [`UploadService`] turns an [`crate::models::UploadRequest`] into a two-part
//! multipart POST and reports exactly one [`crate::models::UploadOutcome`].
//! The HTTP side sits behind [`Transport`] so the service can be driven by
//! the real reqwest client or by [`MockTransport`].

pub mod client;
pub mod form;
pub mod mock;
pub mod service;

pub use client::HttpTransport;
pub use form::{FormPart, UploadForm};
pub use mock::MockTransport;
pub use service::UploadService;

use crate::Result;
use async_trait::async_trait;
use reqwest::Url;

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST the form and return the status of whatever response came back.
    async fn post_form(&self, url: &Url, form: UploadForm) -> Result<u16>;
}
