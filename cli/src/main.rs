mod table;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use todo_core::{
    expand_key, parse_args, parse_human_date, App, AppConfig, Backend, Priority, Task,
    TaskRepository, TASK_KEYS,
};
use tracing::warn;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "A small personal task tracker", long_about = None)]
struct Cli {
    /// Storage backend: file or sqlite (overrides TODO_BACKEND)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Directory holding the task store (overrides TODO_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Add a new task (usage: add Buy milk pri:high due:tomorrow)
    Add {
        /// Task text plus optional key:value metadata (due, priority, status)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List tasks
    List {
        /// all, active, completed, today, week, overdue
        #[arg(short, long, default_value = "all")]
        filter: String,
        /// date or priority
        #[arg(short, long, default_value = "date")]
        sort: String,
    },
    /// List tasks by due-date window and status
    Query {
        #[arg(long, default_value = "")]
        from: String,
        #[arg(long, default_value = "")]
        to: String,
        #[arg(long, default_value = "")]
        status: String,
        #[arg(long, default_value = "date")]
        order_by: String,
        #[arg(long)]
        asc: bool,
    },
    /// Show one task
    Show { id: String },
    /// Replace a task's title, body or due date
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        due: Option<String>,
        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
    },
    /// Set status: not_started, in_progress, done
    Status { id: String, status: String },
    /// Set priority by number (1-3) or name
    Priority { id: String, priority: String },
    /// Flip completion
    Toggle { id: String },
    /// Delete a task
    Delete { id: String },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = AppConfig::from_env();
    if let Some(backend) = &cli.backend {
        config.backend = Backend::parse(backend);
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    let app = App::new(config.open_repository()?);

    match cli.command.unwrap_or(Commands::List {
        filter: "all".to_string(),
        sort: "date".to_string(),
    }) {
        Commands::Add { args } => add(&app, &args, cli.json)?,
        Commands::List { filter, sort } => {
            let tasks: Vec<Task> = serde_json::from_str(&app.get_tasks(&filter, &sort)?)?;
            print_tasks(&tasks, cli.json)?;
        }
        Commands::Query { from, to, status, order_by, asc } => {
            let tasks = app.get_filtered_and_sorted_tasks(&from, &to, &status, &order_by, asc)?;
            print_tasks(&tasks, cli.json)?;
        }
        Commands::Show { id } => {
            let task = app.get_task(&resolve_id(&app, &id)?)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                print!("{}", table::render_detail(&task));
            }
        }
        Commands::Edit { id, title, body, due, clear_due } => {
            let mut task = app.get_task(&resolve_id(&app, &id)?)?;
            if let Some(title) = title {
                if title.trim().is_empty() {
                    bail!("title cannot be empty");
                }
                task.title = title;
            }
            if let Some(body) = body {
                task.body = body;
            }
            if let Some(due) = due {
                task.due = Some(parse_human_date(&due)?);
            }
            if clear_due {
                task.due = None;
            }
            app.update_task(&task)?;
            println!("Task updated: {}", task.title);
        }
        Commands::Status { id, status } => {
            let id = resolve_id(&app, &id)?;
            app.update_task_status(&id, &status)?;
            let task = app.get_task(&id)?;
            println!("{} -> {}", task.title, task.status.as_str());
        }
        Commands::Priority { id, priority } => {
            let id = resolve_id(&app, &id)?;
            let number = priority
                .trim()
                .parse::<i64>()
                .unwrap_or_else(|_| Priority::parse(&priority).as_number());
            app.update_task_priority(&id, number)?;
            let task = app.get_task(&id)?;
            println!("{} -> {}", task.title, task.priority.as_str());
        }
        Commands::Toggle { id } => {
            let id = resolve_id(&app, &id)?;
            app.toggle_task(&id)?;
            let task = app.get_task(&id)?;
            let state = if task.completed { "completed" } else { "reopened" };
            println!("Task {}: {}", state, task.title);
        }
        Commands::Delete { id } => {
            let id = resolve_id(&app, &id)?;
            app.delete_task(&id)?;
            println!("Task deleted: {}", table::short_id(&id));
        }
    }
    Ok(())
}

fn add<R: TaskRepository>(app: &App<R>, args: &[String], json: bool) -> Result<()> {
    let parsed = parse_args(args);
    if parsed.text.trim().is_empty() {
        bail!("task text is required");
    }

    let mut metadata = std::collections::HashMap::new();
    for (key, value) in parsed.metadata {
        match expand_key(&key, TASK_KEYS) {
            Ok(full_key) => {
                metadata.insert(full_key, value);
            }
            Err(e) => warn!("{}", e),
        }
    }

    let due_millis = match metadata.get("due") {
        Some(d) => match parse_human_date(d) {
            Ok(dt) => dt.timestamp_millis(),
            Err(e) => {
                warn!(value = %d, error = %e, "ignoring invalid due date");
                0
            }
        },
        None => 0,
    };
    let priority = metadata.get("priority").map(String::as_str).unwrap_or("low");

    let created: Task = serde_json::from_str(&app.add_task(&parsed.text, priority, due_millis)?)?;
    if let Some(status) = metadata.get("status") {
        app.update_task_status(&created.id, status)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&app.get_task(&created.id)?)?);
        return Ok(());
    }
    println!("Task added: {} (ID: {})", created.title, table::short_id(&created.id));
    if let Some(d) = created.due {
        println!("  Due: {}", d.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"));
    }
    println!("  Priority: {}", created.priority.as_str());
    Ok(())
}

fn print_tasks(tasks: &[Task], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tasks)?);
    } else if tasks.is_empty() {
        println!("No tasks found.");
    } else {
        println!("{}", table::render(tasks));
    }
    Ok(())
}

/// Accepts a full id or a unique prefix, like the short ids shown in tables.
fn resolve_id<R: TaskRepository>(app: &App<R>, input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        bail!("task id is required");
    }
    let tasks = app.service().get_all_tasks()?;
    if tasks.iter().any(|t| t.id == input) {
        return Ok(input.to_string());
    }
    let matches: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(input)).collect();
    match matches.as_slice() {
        [single] => Ok(single.id.clone()),
        [] => Err(anyhow!("no task matches id '{}'", input)),
        _ => Err(anyhow!("id '{}' is ambiguous ({} tasks)", input, matches.len())),
    }
}
