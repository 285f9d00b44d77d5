use crate::notify::{NotificationPort, ReminderRequest};
use std::time::Duration;

pub const DEFAULT_REMINDER_DELAY: Duration = Duration::from_secs(60);
pub const REMINDER_TITLE: &str = "Reminder!";

/// Best-effort reminder after a to-do is created.
///
/// Failures from the port are logged and dropped; callers never observe them.
pub struct ReminderScheduler {
    port: Box<dyn NotificationPort>,
    delay: Duration,
    enabled: bool,
}

impl ReminderScheduler {
    pub fn new(port: Box<dyn NotificationPort>, delay: Duration) -> Self {
        Self {
            port,
            delay,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            port: Box::new(crate::notify::NoopNotifier),
            delay: DEFAULT_REMINDER_DELAY,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn schedule_reminder(&self, text: &str) {
        self.schedule_reminder_after(text, self.delay);
    }

    pub fn schedule_reminder_after(&self, text: &str, delay: Duration) {
        if !self.enabled {
            return;
        }

        let request = request_after(text, delay);
        match self.port.schedule(&request) {
            Ok(()) => tracing::debug!(delay_seconds = request.delay_seconds(), "reminder requested"),
            Err(err) => tracing::warn!(error = %err, "reminder could not be scheduled"),
        }
    }
}

fn request_after(text: &str, delay: Duration) -> ReminderRequest {
    ReminderRequest {
        title: REMINDER_TITLE.to_string(),
        body: format!("You have a pending task: {text}"),
        delay,
    }
}
