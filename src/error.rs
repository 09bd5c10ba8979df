//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror. Upload
//! failures never escape as errors to the caller of `submit`; they are folded
//! into [`crate::models::UploadOutcome::Failure`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid destination URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("{0}")]
    Transport(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No async runtime to run the upload on: {0}")]
    NoRuntime(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Render an error together with its `source()` chain.
///
/// reqwest's `Display` stops at the outermost layer ("error sending request
/// for url ..."), which hides the part a user can act on.
pub fn describe_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !description.contains(&cause_text) {
            description.push_str(": ");
            description.push_str(&cause_text);
        }
        source = cause.source();
    }
    description
}
