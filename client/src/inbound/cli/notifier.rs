//! Notifier that writes toasts to a terminal stream.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::domain::Notification;
use crate::domain::ports::Notifier;

/// Writes one line per notification, `!` marking failures.
pub struct TerminalNotifier<W> {
    out: Mutex<W>,
}

impl TerminalNotifier<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Notifier for TerminalNotifier<W> {
    fn notify(&self, notification: Notification) {
        let marker = if notification.is_destructive() { '!' } else { '*' };
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(
            out,
            "{marker} {}: {}",
            notification.title, notification.description
        ) {
            warn!(error = %err, "failed to write notification");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for terminal output.

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn marks_failures_differently() {
        let notifier = TerminalNotifier::new(Vec::new());
        notifier.notify(Notification::info("Logged out", "Come back soon!"));
        notifier.notify(Notification::destructive("Login failed", "Try again"));

        let text = String::from_utf8(notifier.into_inner()).expect("utf8");
        assert_eq!(text, "* Logged out: Come back soon!\n! Login failed: Try again\n");
    }
}
