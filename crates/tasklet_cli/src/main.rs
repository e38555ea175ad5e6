//! `tasklet` command-line front end.
//!
//! # Responsibility
//! - Map subcommands onto `TaskService` calls over a pooled store.
//! - Keep output line-oriented and stable for scripting.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use tasklet_core::{
    connect, default_log_level, init_logging, LogTarget, SqliteTaskRepository, Task, TaskId,
    TaskListQuery, TaskRepository, TaskService,
};

const DEFAULT_DB_URL: &str = "jdbc:sqlite:./tasklet.db";

#[derive(Debug, Parser)]
#[command(name = "tasklet", about = "Pooled SQLite task store", version)]
struct Cli {
    /// Connection string, e.g. `jdbc:sqlite:./tasklet.db;POOL_MAX_SIZE=4`.
    #[arg(long, env = "TASKLET_DB", default_value = DEFAULT_DB_URL, global = true)]
    db: String,

    /// trace|debug|info|warn|error. Defaults by build mode.
    #[arg(long, env = "TASKLET_LOG", global = true)]
    log_level: Option<String>,

    /// Absolute directory for rotating log files. Logs go to stderr otherwise.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a task and print its id.
    Add { name: String },
    /// Rename an existing task.
    Rename { id: TaskId, name: String },
    /// List tasks ordered by id.
    List {
        /// Case-insensitive substring filter on the name.
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// Print one JSON array instead of text lines.
        #[arg(long)]
        json: bool,
    },
    /// Show one task.
    Get { id: TaskId },
    /// Delete one task.
    Remove { id: TaskId },
    /// Delete every task. Irreversible.
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Print the number of tasks.
    Count,
    /// Print the core version.
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let target = match &cli.log_dir {
        Some(dir) => LogTarget::Directory(dir.clone()),
        None => LogTarget::Stderr,
    };
    init_logging(&level, target).map_err(anyhow::Error::msg)?;

    // Version output must not create or open a store.
    if let Command::Version = cli.command {
        print_version();
        return Ok(());
    }
    ensure_confirmed(&cli.command)?;

    let provider = connect(&cli.db).with_context(|| format!("cannot open store `{}`", cli.db))?;
    let service = TaskService::new(SqliteTaskRepository::new(provider));
    run(&service, cli.command)
}

fn run<R: TaskRepository>(service: &TaskService<R>, command: Command) -> Result<()> {
    match command {
        Command::Add { name } => {
            let id = service.add_task(name)?;
            println!("{id}");
        }
        Command::Rename { id, name } => {
            service.rename_task(id, name)?;
            println!("renamed {id}");
        }
        Command::List {
            filter,
            limit,
            offset,
            json,
        } => {
            let tasks = service.list_tasks(&TaskListQuery {
                name_contains: filter,
                limit,
                offset,
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                for task in &tasks {
                    print_task(task);
                }
            }
        }
        Command::Get { id } => match service.get_task(id)? {
            Some(task) => print_task(&task),
            None => bail!("task not found: {id}"),
        },
        Command::Remove { id } => {
            service.remove_task(id)?;
            println!("removed {id}");
        }
        Command::Clear { .. } => {
            let removed = service.clear_tasks()?;
            info!("event=cli_clear module=cli status=ok count={removed}");
            println!("removed {removed}");
        }
        Command::Count => println!("{}", service.task_count()?),
        Command::Version => print_version(),
    }
    Ok(())
}

/// Rejects destructive commands that lack confirmation, before any store is
/// opened or created.
fn ensure_confirmed(command: &Command) -> Result<()> {
    if let Command::Clear { yes: false } = command {
        bail!("refusing to delete every task without --yes");
    }
    Ok(())
}

fn print_version() {
    println!("tasklet_core version={}", tasklet_core::core_version());
}

fn print_task(task: &Task) {
    match task.id {
        Some(id) => println!("{id}\t{}", task.name),
        None => println!("-\t{}", task.name),
    }
}
