use super::{Transport, UploadForm};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Url;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub struct MockTransport {
    statuses: Arc<Mutex<Vec<u16>>>,
    failure: Arc<Mutex<Option<String>>>,
    delay: Option<Duration>,
    sent: Arc<Mutex<Vec<(Url, UploadForm)>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            statuses: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            delay: None,
            sent: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Queue a status; queued statuses are replayed in a cycle.
    pub fn with_status(self, status: u16) -> Self {
        self.statuses.lock().unwrap().push(status);
        self
    }

    pub fn with_failure(self, reason: impl Into<String>) -> Self {
        *self.failure.lock().unwrap() = Some(reason.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_sent(&self) -> Vec<(Url, UploadForm)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_form(&self, url: &Url, form: UploadForm) -> Result<u16> {
        let call = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.sent.lock().unwrap().push((url.clone(), form));

        if let Some(reason) = self.failure.lock().unwrap().clone() {
            return Err(Error::Transport(reason));
        }

        let statuses = self.statuses.lock().unwrap();
        if statuses.is_empty() {
            Ok(200)
        } else {
            Ok(statuses[(call - 1) % statuses.len()])
        }
    }
}
