use crate::error::AppError;
use crate::model::Todo;
use crate::storage::TodoStorage;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "todos.json";
const STORE_ENV_VAR: &str = "AGENDA_STORE_PATH";

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("agenda").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("agenda")
            .join(STORE_FILE_NAME))
    }
}

/// The collection as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the location resolved by [`store_path`].
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| STORE_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Keeps the first record for each id so one bad entry cannot cost the rest.
fn drop_duplicate_ids(todos: Vec<Todo>, path: &Path) -> Vec<Todo> {
    let mut seen = HashSet::with_capacity(todos.len());
    todos
        .into_iter()
        .filter(|todo| {
            let fresh = seen.insert(todo.id.clone());
            if !fresh {
                tracing::warn!(
                    todo_id = %todo.id,
                    path = %path.display(),
                    "skipping todo with duplicate id"
                );
            }
            fresh
        })
        .collect()
}

impl TodoStorage for JsonFileStorage {
    fn load(&self) -> Result<Vec<Todo>, AppError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|err| AppError::io(format!("{}: {}", self.path.display(), err)))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let todos: Vec<Todo> = serde_json::from_str(&content).map_err(|err| {
            AppError::invalid_data(format!("invalid JSON in {}: {}", self.path.display(), err))
        })?;

        Ok(drop_duplicate_ids(todos, &self.path))
    }

    fn save(&self, todos: &[Todo]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
        }

        let content = serde_json::to_string_pretty(todos)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;

        let temp_path = self.temp_path();
        let mut file =
            std::fs::File::create(&temp_path).map_err(|err| AppError::io(err.to_string()))?;
        file.write_all(content.as_bytes())
            .map_err(|err| AppError::io(err.to_string()))?;
        file.sync_all().map_err(|err| AppError::io(err.to_string()))?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&temp_path, permissions)
                .map_err(|err| AppError::io(err.to_string()))?;
        }

        std::fs::rename(&temp_path, &self.path).map_err(|err| AppError::io(err.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::JsonFileStorage;
    use crate::model::Todo;
    use crate::storage::TodoStorage;
    use std::fs;
    use tempfile::TempDir;

    fn todo(id: &str, text: &str, completed: bool) -> Todo {
        Todo {
            id: id.to_string(),
            text: text.to_string(),
            completed,
            date: Some("2024-02-01".to_string()),
            time: Some("5:00 PM".to_string()),
        }
    }

    #[test]
    fn save_and_load_round_trip_keeps_order() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("todos.json"));
        let todos = vec![
            todo("1706800000002", "newest", false),
            todo("1706800000001", "older", true),
            Todo {
                id: "1706800000000".to_string(),
                text: "unscheduled".to_string(),
                completed: false,
                date: None,
                time: None,
            },
        ];

        storage.save(&todos).unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded, todos);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("absent.json"));

        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn blank_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        fs::write(&path, "  \n").unwrap();

        assert!(JsonFileStorage::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn writes_a_plain_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        JsonFileStorage::new(&path)
            .save(&[todo("1", "Buy milk", false)])
            .unwrap();

        let stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(
            stored,
            serde_json::json!([{
                "id": "1",
                "text": "Buy milk",
                "completed": false,
                "date": "2024-02-01",
                "time": "5:00 PM"
            }])
        );
        assert!(!dir.path().join("todos.json.tmp").exists());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("todos.json");

        JsonFileStorage::new(&path).save(&[]).unwrap();

        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        JsonFileStorage::new(&path).save(&[]).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStorage::new(&path).load().unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_non_boolean_completed_field() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        fs::write(
            &path,
            r#"[{"id":"1","text":"demo","completed":"yes","date":"2024-02-01","time":"5:00 PM"}]"#,
        )
        .unwrap();

        let err = JsonFileStorage::new(&path).load().unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn duplicate_ids_keep_first_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.json");
        let content = serde_json::to_string(&vec![
            todo("1", "a", false),
            todo("1", "b", true),
            todo("2", "c", false),
        ])
        .unwrap();
        fs::write(&path, content).unwrap();

        let loaded = JsonFileStorage::new(&path).load().unwrap();

        assert_eq!(loaded, vec![todo("1", "a", false), todo("2", "c", false)]);
    }
}
