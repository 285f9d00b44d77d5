use crate::error::AppError;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(windows)]
mod windows;

const DISABLE_ENV_VAR: &str = "AGENDA_DISABLE_NOTIFICATIONS";

/// Subcommand the executable exposes for delivering a deferred reminder.
pub const REMIND_COMMAND: &str = "remind";

/// One local notification to be shown after `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub title: String,
    pub body: String,
    pub delay: Duration,
}

impl ReminderRequest {
    pub fn delay_seconds(&self) -> u64 {
        self.delay.as_secs()
    }
}

/// Platform capability for scheduling local notifications.
pub trait NotificationPort: Send {
    fn schedule(&self, request: &ReminderRequest) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl NotificationPort for NoopNotifier {
    fn schedule(&self, _request: &ReminderRequest) -> Result<(), AppError> {
        Ok(())
    }
}

/// Keeps every request it receives. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    requests: Arc<Mutex<Vec<ReminderRequest>>>,
    failure: Option<AppError>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier that records the request and then reports `error`.
    pub fn failing(error: AppError) -> Self {
        Self {
            requests: Arc::default(),
            failure: Some(error),
        }
    }

    pub fn requests(&self) -> Vec<ReminderRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationPort for RecordingNotifier {
    fn schedule(&self, request: &ReminderRequest) -> Result<(), AppError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Hands the delayed delivery to a detached copy of the running executable,
/// so the reminder still fires after a one-shot command has exited.
#[derive(Debug, Clone)]
pub struct DeferredNotifier {
    exe: PathBuf,
}

impl DeferredNotifier {
    pub fn new<P: Into<PathBuf>>(exe: P) -> Self {
        Self { exe: exe.into() }
    }

    pub fn current() -> Result<Self, AppError> {
        let exe = std::env::current_exe().map_err(|err| AppError::io(err.to_string()))?;
        Ok(Self::new(exe))
    }

    fn spawn_helper(&self, request: &ReminderRequest) -> Result<Child, AppError> {
        Command::new(&self.exe)
            .args(helper_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| AppError::notification(err.to_string()))
    }
}

impl NotificationPort for DeferredNotifier {
    fn schedule(&self, request: &ReminderRequest) -> Result<(), AppError> {
        let child = self.spawn_helper(request)?;
        tracing::debug!(pid = child.id(), "spawned reminder helper");
        reap_in_background(child);
        Ok(())
    }
}

/// Waits on the helper from a background thread so a long-lived process
/// (the interactive prompt) does not collect zombies. A one-shot process
/// exits first and leaves the helper running on its own.
fn reap_in_background(mut child: Child) -> JoinHandle<Option<ExitStatus>> {
    std::thread::spawn(move || match child.wait() {
        Ok(status) => {
            tracing::debug!(%status, "reminder helper finished");
            Some(status)
        }
        Err(err) => {
            tracing::warn!(error = %err, "could not wait on reminder helper");
            None
        }
    })
}

/// Arguments that make the executable deliver `request` via [`REMIND_COMMAND`].
pub fn helper_args(request: &ReminderRequest) -> Vec<String> {
    vec![
        REMIND_COMMAND.to_string(),
        "--delay-seconds".to_string(),
        request.delay_seconds().to_string(),
        "--title".to_string(),
        request.title.clone(),
        "--body".to_string(),
        request.body.clone(),
    ]
}

/// Picks the notification port for this process.
///
/// Falls back to [`NoopNotifier`] when notifications are disabled through the
/// environment, unsupported on this platform, or the executable path is
/// unknown. Permission problems only show up later, inside the helper.
pub fn notifier_from_env() -> Box<dyn NotificationPort> {
    if std::env::var_os(DISABLE_ENV_VAR).is_some() {
        tracing::debug!("notifications disabled through {}", DISABLE_ENV_VAR);
        return Box::new(NoopNotifier);
    }

    if !platform_supported() {
        tracing::debug!("no notification facility on this platform");
        return Box::new(NoopNotifier);
    }

    match DeferredNotifier::current() {
        Ok(notifier) => Box::new(notifier),
        Err(err) => {
            tracing::warn!(error = %err, "reminders unavailable");
            Box::new(NoopNotifier)
        }
    }
}

pub fn platform_supported() -> bool {
    cfg!(any(target_os = "linux", windows))
}

/// Blocks for `request.delay`, then shows the notification.
pub fn deliver_after(request: &ReminderRequest) -> Result<(), AppError> {
    std::thread::sleep(request.delay);
    show_now(&request.title, &request.body)
}

#[cfg(target_os = "linux")]
pub fn show_now(title: &str, body: &str) -> Result<(), AppError> {
    linux::show(title, body)
}

#[cfg(windows)]
pub fn show_now(title: &str, body: &str) -> Result<(), AppError> {
    windows::show(title, body)
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn show_now(_title: &str, _body: &str) -> Result<(), AppError> {
    Err(AppError::notification(
        "notifications are not supported on this platform",
    ))
}
