use crate::error::AppError;
use notify_rust::Notification;

pub fn show(title: &str, body: &str) -> Result<(), AppError> {
    Notification::new()
        .appname("agenda")
        .summary(title)
        .body(body)
        .show()
        .map(|_| ())
        .map_err(|err| AppError::notification(err.to_string()))
}
