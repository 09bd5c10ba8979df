//! snapsend - send a text message and one image to an HTTP endpoint
//!
//! The library builds a two-part multipart POST (`text` then `image`), performs
//! it off the caller's control flow and reports a single terminal outcome to a
//! completion handler. Image staging and user notification live alongside as
//! the collaborators a front end wires together.

pub mod error;
pub mod models;
pub mod notify;
pub mod staging;
pub mod upload;

pub use error::{Error, Result};
