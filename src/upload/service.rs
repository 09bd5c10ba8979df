use super::{HttpTransport, Transport, UploadForm};
use crate::error::describe_chain;
use crate::models::{Config, UploadOutcome, UploadRequest};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Performs one multipart upload per call and reports a single outcome.
///
/// Any 2xx response is a success. Other statuses become
/// `Failure { reason: "Server error: <code>" }`, and transport errors become a
/// failure carrying the error description. Nothing is retried.
#[derive(Clone)]
pub struct UploadService {
    transport: Arc<dyn Transport>,
    runtime: Option<Handle>,
}

impl UploadService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            runtime: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Spawn uploads on `handle` instead of the ambient runtime, so `submit`
    /// can be called from threads that are not inside tokio (a UI loop).
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Run the upload in place and return its outcome.
    pub async fn upload(&self, request: UploadRequest) -> UploadOutcome {
        let id = request.id();
        info!("Uploading {} to {}", id, request.destination());

        let outcome = match self.send(&request).await {
            Ok(status) if (200..300).contains(&status) => {
                UploadOutcome::Success { status_code: status }
            }
            Ok(status) => UploadOutcome::Failure {
                reason: format!("Server error: {}", status),
            },
            Err(e) => UploadOutcome::Failure {
                reason: failure_reason(&e),
            },
        };

        match &outcome {
            UploadOutcome::Success { status_code } => {
                info!("Upload {} completed with status {}", id, status_code)
            }
            UploadOutcome::Failure { reason } => warn!("Upload {} failed: {}", id, reason),
        }
        outcome
    }

    async fn send(&self, request: &UploadRequest) -> Result<u16> {
        let form = UploadForm::from_request(request).await?;
        self.transport.post_form(request.destination(), form).await
    }

    /// Start the upload without blocking and hand its outcome to `on_complete`.
    ///
    /// The upload runs on the runtime given to [`with_runtime`](Self::with_runtime),
    /// or on the caller's ambient tokio runtime. With neither available this
    /// returns [`Error::NoRuntime`] and `on_complete` is not called.
    ///
    /// Once spawned, the handler runs once, on the task that performed the
    /// upload. Dropping the returned handle does not cancel the upload.
    pub fn submit<F>(&self, request: UploadRequest, on_complete: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(UploadOutcome) + Send + 'static,
    {
        let handle = self.runtime_handle()?;
        let service = self.clone();
        Ok(handle.spawn(async move {
            let outcome = service.upload(request).await;
            on_complete(outcome);
        }))
    }

    /// Like [`submit`](Self::submit), but delivers the outcome over a channel
    /// for callers that must consume it on their own execution context.
    pub fn submit_channel(&self, request: UploadRequest) -> Result<oneshot::Receiver<UploadOutcome>> {
        let (tx, rx) = oneshot::channel();
        self.submit(request, move |outcome| {
            // Receiver dropped means the caller stopped caring about the outcome.
            let _ = tx.send(outcome);
        })?;
        Ok(rx)
    }

    fn runtime_handle(&self) -> Result<Handle> {
        match &self.runtime {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|e| Error::NoRuntime(e.to_string())),
        }
    }
}

fn failure_reason(err: &Error) -> String {
    match err {
        Error::Io(e) => format!("could not read image: {}", describe_chain(e)),
        Error::Http(e) => describe_chain(e),
        other => other.to_string(),
    }
}
