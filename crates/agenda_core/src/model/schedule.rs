use crate::error::AppError;
use time::macros::format_description;
use time::{Date, Time};

/// Validated date/time pair attached to a to-do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    pub date: Option<String>,
    pub time: Option<String>,
}

impl Schedule {
    /// Validates raw user input. Blank values count as absent.
    ///
    /// With `required` set both halves must be present; otherwise they may be
    /// omitted together but never given alone.
    pub fn from_input(
        date: Option<&str>,
        time: Option<&str>,
        required: bool,
    ) -> Result<Self, AppError> {
        let date = date.map(str::trim).filter(|value| !value.is_empty());
        let time = time.map(str::trim).filter(|value| !value.is_empty());

        match (date, time) {
            (Some(date), Some(time)) => Ok(Self {
                date: Some(normalize_date(date)?),
                time: Some(normalize_time(time)?),
            }),
            (None, None) if !required => Ok(Self::default()),
            (None, None) => Err(AppError::invalid_input("date and time are required")),
            (Some(_), None) => Err(AppError::invalid_input("time is required")),
            (None, Some(_)) => Err(AppError::invalid_input("date is required")),
        }
    }
}

/// Normalizes a calendar date to `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Result<String, AppError> {
    let format = format_description!("[year]-[month]-[day]");
    let date = Date::parse(raw.trim(), &format)
        .map_err(|_| AppError::invalid_input("date must be YYYY-MM-DD"))?;
    date.format(&format)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Normalizes a time of day to `h:mm AM/PM`.
///
/// Accepts the 12-hour form in any letter case, with or without the space
/// before the period, as well as 24-hour `HH:MM`.
pub fn normalize_time(raw: &str) -> Result<String, AppError> {
    let twelve_hour = format_description!("[hour repr:12 padding:none]:[minute] [period]");
    let twenty_four_hour = format_description!("[hour padding:none]:[minute]");
    let mut candidate = raw.trim().to_ascii_uppercase();
    if (candidate.ends_with("AM") || candidate.ends_with("PM"))
        && !candidate.ends_with(" AM")
        && !candidate.ends_with(" PM")
    {
        candidate.insert(candidate.len() - 2, ' ');
    }

    let parsed = Time::parse(&candidate, &twelve_hour)
        .or_else(|_| Time::parse(&candidate, &twenty_four_hour))
        .map_err(|_| AppError::invalid_input("time must look like 5:00 PM or 17:00"))?;
    parsed
        .format(&twelve_hour)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}
