use super::{notification_message, Notifier};
use crate::models::UploadOutcome;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for MockNotifier {
    fn notify(&self, outcome: &UploadOutcome) {
        self.messages
            .lock()
            .unwrap()
            .push(notification_message(outcome));
    }
}
