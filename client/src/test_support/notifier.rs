//! Notifier that remembers what it was asked to show.

use std::sync::Mutex;

use crate::domain::Notification;
use crate::domain::ports::Notifier;

#[derive(Debug, Default)]
pub struct RecordingNotifier(Mutex<Vec<Notification>>);

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.entries().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.entries().iter().map(|n| n.title.clone()).collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries().last().cloned()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        match self.0.lock() {
            Ok(entries) => entries,
            Err(_) => panic!("notifier mutex poisoned"),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.entries().push(notification);
    }
}
