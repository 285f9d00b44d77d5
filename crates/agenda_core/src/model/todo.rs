use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// One entry of the to-do collection, in its persisted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "active" | "pending" => Some(Self::Active),
            "completed" | "done" => Some(Self::Completed),
            _ => None,
        }
    }
}

pub fn normalize_text(text: &str) -> Result<String, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("text is required"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Filter, Todo, normalize_text};

    fn todo(id: &str, completed: bool) -> Todo {
        Todo {
            id: id.to_string(),
            text: "demo".to_string(),
            completed,
            date: None,
            time: None,
        }
    }

    #[test]
    fn filter_matches_completion_state() {
        let open = todo("1", false);
        let done = todo("2", true);

        assert!(Filter::All.matches(&open));
        assert!(Filter::All.matches(&done));
        assert!(Filter::Active.matches(&open));
        assert!(!Filter::Active.matches(&done));
        assert!(Filter::Completed.matches(&done));
        assert!(!Filter::Completed.matches(&open));
    }

    #[test]
    fn filter_parse_accepts_aliases() {
        assert_eq!(Filter::parse(" ALL "), Some(Filter::All));
        assert_eq!(Filter::parse("pending"), Some(Filter::Active));
        assert_eq!(Filter::parse("done"), Some(Filter::Completed));
        assert_eq!(Filter::parse("overdue"), None);
    }

    #[test]
    fn normalize_text_trims_and_rejects_blank() {
        assert_eq!(normalize_text("  Buy milk ").unwrap(), "Buy milk");
        assert_eq!(normalize_text(" \t").unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn serializes_without_absent_schedule_fields() {
        let json = serde_json::to_value(todo("1", false)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": "1", "text": "demo", "completed": false })
        );
    }

    #[test]
    fn deserializes_earliest_record_shape() {
        let parsed: Todo =
            serde_json::from_str(r#"{"id":"1706745600000","text":"walk","completed":true}"#)
                .unwrap();
        assert!(parsed.completed);
        assert_eq!(parsed.date, None);
        assert_eq!(parsed.time, None);
    }
}
