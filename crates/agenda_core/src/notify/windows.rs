use crate::error::AppError;
use tauri_winrt_notification::Toast;

pub fn show(title: &str, body: &str) -> Result<(), AppError> {
    Toast::new(Toast::POWERSHELL_APP_ID)
        .title(title)
        .text1(body)
        .show()
        .map_err(|err| AppError::notification(err.to_string()))
}
