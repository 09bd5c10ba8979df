//! User-facing feedback for finished uploads

pub mod mock;

pub use mock::MockNotifier;

use crate::models::UploadOutcome;

pub trait Notifier: Send + Sync {
    fn notify(&self, outcome: &UploadOutcome);
}

pub fn notification_message(outcome: &UploadOutcome) -> String {
    match outcome {
        UploadOutcome::Success { .. } => "Upload successful!".to_string(),
        // Non-2xx responses already carry their "Server error: <code>" text.
        UploadOutcome::Failure { reason } if reason.starts_with("Server error") => reason.clone(),
        UploadOutcome::Failure { reason } => format!("Upload failed: {}", reason),
    }
}

/// Reports outcomes through the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, outcome: &UploadOutcome) {
        let message = notification_message(outcome);
        if outcome.is_success() {
            tracing::info!("{}", message);
        } else {
            tracing::error!("{}", message);
        }
    }
}
