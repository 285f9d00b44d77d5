use agenda_core::config::ConfigOverrides;
use agenda_core::error::AppError;
use agenda_core::model::Filter;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "agenda", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new todo
    ///
    /// Example: agenda add "Buy milk" --date 2024-02-01 --time "5:00 PM"
    Add {
        text: Option<String>,
        /// Calendar date, YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
        /// Time of day, e.g. "5:00 PM" or 17:00
        #[arg(long)]
        time: Option<String>,
    },
    /// Edit a todo's text and optionally its date and time
    ///
    /// Example: agenda edit 1706800000000 "Buy oat milk"
    /// Example: agenda edit 1706800000000 "Buy oat milk" --time 6:00PM
    Edit {
        id: String,
        text: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        time: Option<String>,
    },
    /// Mark a todo as completed, or reopen it
    ///
    /// Example: agenda toggle 1706800000000
    Toggle { id: String },
    /// Delete a todo
    ///
    /// Example: agenda delete 1706800000000
    Delete { id: String },
    /// Show details of a todo
    ///
    /// Example: agenda show 1706800000000
    Show { id: String },
    /// List todos
    ///
    /// Example: agenda list
    /// Example: agenda list active
    List {
        #[arg(value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },
    /// Show dates that have todos, or the todos on one date
    ///
    /// Example: agenda calendar
    /// Example: agenda calendar --date 2024-02-01
    Calendar {
        #[arg(long)]
        date: Option<String>,
    },
    /// Deliver a reminder after a delay (used internally)
    #[command(hide = true)]
    Remind {
        #[arg(long)]
        delay_seconds: u64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterArg {
    #[default]
    All,
    Active,
    Completed,
}

impl From<FilterArg> for Filter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => Filter::All,
            FilterArg::Active => Filter::Active,
            FilterArg::Completed => Filter::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    RequireSchedule,
    RemindersEnabled,
    ReminderDelaySeconds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let key =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;
    let target = match key.as_str() {
        "require_schedule" => ConfigOverrideTarget::RequireSchedule,
        "reminders" | "reminders_enabled" => ConfigOverrideTarget::RemindersEnabled,
        "reminder_delay" | "reminder_delay_seconds" => ConfigOverrideTarget::ReminderDelaySeconds,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride {
        target,
        value: value_raw.trim().to_string(),
    })
}

/// Folds every `--config-override` flag into one set of overrides; later flags win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::RequireSchedule => {
                overrides.require_schedule = Some(parse_flag_value(&parsed.value)?);
            }
            ConfigOverrideTarget::RemindersEnabled => {
                overrides.reminders_enabled = Some(parse_flag_value(&parsed.value)?);
            }
            ConfigOverrideTarget::ReminderDelaySeconds => {
                let seconds = parsed
                    .value
                    .parse::<u64>()
                    .ok()
                    .filter(|seconds| *seconds > 0)
                    .ok_or_else(|| {
                        AppError::invalid_input("reminder delay must be a positive number of seconds")
                    })?;
                overrides.reminder_delay_seconds = Some(seconds);
            }
        }
    }

    Ok(overrides)
}

fn parse_flag_value(value: &str) -> Result<bool, AppError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(AppError::invalid_input(format!(
            "expected true or false, got '{value}'"
        ))),
    }
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
