use agenda_cli::cli::{Cli, Command, collect_config_overrides};
use agenda_core::config::{Config, load_config_with_fallback, merge_overrides};
use agenda_core::error::AppError;
use agenda_core::model::{Filter, Todo};
use agenda_core::notify::{ReminderRequest, deliver_after, notifier_from_env};
use agenda_core::storage::JsonFileStorage;
use agenda_core::store::{Durability, TodoStore};
use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use std::time::Duration;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "AGENDA_LOG";

#[derive(Tabled)]
struct TodoRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Text")]
    text: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Time")]
    time: String,
}

impl From<&Todo> for TodoRow {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id.clone(),
            text: todo.text.clone(),
            status: status_label(todo),
            date: todo.date.clone().unwrap_or_else(|| "-".to_string()),
            time: todo.time.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn status_label(todo: &Todo) -> &'static str {
    if todo.completed { "completed" } else { "active" }
}

fn durability_suffix(durability: &Durability) -> &'static str {
    match durability {
        Durability::Durable => "",
        Durability::MemoryOnly(_) => " (not saved)",
    }
}

fn todo_json(todo: &Todo) -> serde_json::Value {
    serde_json::json!({
        "id": todo.id,
        "text": todo.text,
        "completed": todo.completed,
        "date": todo.date,
        "time": todo.time,
    })
}

fn print_todo_json(todo: &Todo, durability: Option<&Durability>) {
    let mut json = todo_json(todo);
    if let Some(durability) = durability {
        json["durable"] = serde_json::Value::Bool(durability.is_durable());
    }
    println!("{}", json);
}

fn print_todos_json(todos: &[Todo]) {
    let payload: Vec<_> = todos.iter().map(todo_json).collect();
    println!("{}", serde_json::Value::Array(payload));
}

fn print_todos_table(todos: &[Todo]) {
    if todos.is_empty() {
        println!("No todos.");
        return;
    }

    let rows: Vec<TodoRow> = todos.iter().map(TodoRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::psql());
    println!("{table}");
}

fn print_todo_details(todo: &Todo) {
    println!("id: {}", todo.id);
    println!("text: {}", todo.text);
    println!("status: {}", status_label(todo));
    println!("date: {}", todo.date.as_deref().unwrap_or("-"));
    println!("time: {}", todo.time.as_deref().unwrap_or("-"));
}

fn not_found() -> AppError {
    AppError::not_found("todo not found")
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;
    let mut quoted_token = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            quoted_token = true;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() || quoted_token {
                args.push(std::mem::take(&mut current));
            }
            quoted_token = false;
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted_token {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn open_store(config: &Config) -> Result<TodoStore, AppError> {
    let storage = JsonFileStorage::from_env()?;
    tracing::debug!(path = %storage.path().display(), "opening todo store");
    Ok(TodoStore::open(config, Box::new(storage), notifier_from_env()))
}

fn load_config(overrides: &[String]) -> Result<Config, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        tracing::warn!(error = %err, "config not loaded, using defaults");
    }
    let overrides = collect_config_overrides(overrides)?;
    Ok(merge_overrides(&loaded.config, &overrides))
}

fn run_command(command: Command, store: &mut TodoStore, json: bool) -> Result<(), AppError> {
    match command {
        Command::Add { text, date, time } => {
            let outcome = store.create(
                text.as_deref().unwrap_or_default(),
                date.as_deref(),
                time.as_deref(),
            )?;
            let todo = &outcome.value;
            if json {
                print_todo_json(todo, Some(&outcome.durability));
            } else {
                println!(
                    "Added todo: {} ({}){}",
                    todo.text,
                    todo.id,
                    durability_suffix(&outcome.durability)
                );
            }
        }
        Command::Edit {
            id,
            text,
            date,
            time,
        } => {
            let outcome = store.update(&id, &text, date.as_deref(), time.as_deref())?;
            let todo = outcome.value.as_ref().ok_or_else(not_found)?;
            if json {
                print_todo_json(todo, Some(&outcome.durability));
            } else {
                println!(
                    "Updated todo: {} ({}){}",
                    todo.text,
                    todo.id,
                    durability_suffix(&outcome.durability)
                );
            }
        }
        Command::Toggle { id } => {
            let outcome = store.toggle_complete(&id);
            let todo = outcome.value.as_ref().ok_or_else(not_found)?;
            if json {
                print_todo_json(todo, Some(&outcome.durability));
            } else {
                let verb = if todo.completed { "Completed" } else { "Reopened" };
                println!(
                    "{} todo: {} ({}){}",
                    verb,
                    todo.text,
                    todo.id,
                    durability_suffix(&outcome.durability)
                );
            }
        }
        Command::Delete { id } => {
            let outcome = store.delete(&id);
            // Deleting an absent id is a no-op, not a failure.
            let Some(todo) = outcome.value.as_ref() else {
                if json {
                    println!("{}", serde_json::json!({ "id": id.trim(), "deleted": false }));
                } else {
                    println!("No todo with id {}; nothing deleted.", id.trim());
                }
                return Ok(());
            };
            if json {
                print_todo_json(todo, Some(&outcome.durability));
            } else {
                println!(
                    "Deleted todo: {} ({}){}",
                    todo.text,
                    todo.id,
                    durability_suffix(&outcome.durability)
                );
            }
        }
        Command::Show { id } => {
            let todo = store.get(&id).ok_or_else(not_found)?;
            if json {
                print_todo_json(todo, None);
            } else {
                print_todo_details(todo);
            }
        }
        Command::List { filter } => {
            let todos = store.filter(Filter::from(filter));
            if json {
                print_todos_json(&todos);
            } else {
                print_todos_table(&todos);
            }
        }
        Command::Calendar { date: Some(date) } => {
            let todos = store.on_date(&date)?;
            if json {
                print_todos_json(&todos);
            } else {
                print_todos_table(&todos);
            }
        }
        Command::Calendar { date: None } => {
            let marked = store.marked_dates();
            if json {
                println!("{}", serde_json::json!(marked));
            } else if marked.is_empty() {
                println!("No scheduled todos.");
            } else {
                for (date, count) in &marked {
                    println!("{date}  {count}");
                }
            }
        }
        Command::Remind { .. } => {
            return Err(AppError::invalid_input(
                "remind is only available as a standalone command",
            ));
        }
    }

    Ok(())
}

fn run_remind(delay_seconds: u64, title: String, body: String) -> Result<(), AppError> {
    let request = ReminderRequest {
        title,
        body,
        delay: Duration::from_secs(delay_seconds),
    };
    if let Err(err) = deliver_after(&request) {
        tracing::warn!(error = %err, "reminder was not delivered");
    }
    Ok(())
}

fn run_once(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Remind {
            delay_seconds,
            title,
            body,
        } => run_remind(delay_seconds, title, body),
        command => {
            let config = load_config(&cli.config_override)?;
            let mut store = open_store(&config)?;
            run_command(command, &mut store, cli.json)
        }
    }
}

fn run_interactive() -> Result<(), AppError> {
    let config = load_config(&[])?;
    let mut store = open_store(&config)?;

    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("agenda".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input("--config-override only applies to one-shot commands")
            );
            continue;
        }

        if let Err(err) = run_command(cli.command, &mut store, cli.json) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            use clap::error::ErrorKind;
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_once(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
