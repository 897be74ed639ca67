//! A command-line front end for a task API server (or for a local task file)

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand};

use smart_task_scheduler::account;
use smart_task_scheduler::cache::LocalTaskService;
use smart_task_scheduler::client::Client;
use smart_task_scheduler::config::{Settings, API_URL_VAR, DEFAULT_API_URL, DEFAULT_TIMEOUT, TIMEOUT_VAR};
use smart_task_scheduler::format::print_projection;
use smart_task_scheduler::traits::{AuthService, TaskService};
use smart_task_scheduler::{Due, Priority, Session, TaskId, TaskList};

const DEFAULT_SESSION_FILE: &str = ".smart-tasks-session.json";

#[derive(Parser)]
#[command(name = "tasks")]
#[command(version)]
#[command(about = "Manage your to-do list")]
struct Cli {
    /// Base URL of the task API
    #[arg(long, env = API_URL_VAR, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout, in seconds
    #[arg(long, env = TIMEOUT_VAR)]
    timeout: Option<u64>,

    /// Use a local task file instead of a server
    #[arg(long)]
    local: Option<PathBuf>,

    /// Where the session is kept between invocations
    #[arg(long, env = "SMART_TASKS_SESSION", default_value = DEFAULT_SESSION_FILE)]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(long, env = "SMART_TASKS_PASSWORD")]
        password: String,
    },
    /// Log in, and remember the session
    Login {
        username: String,
        #[arg(long, env = "SMART_TASKS_PASSWORD")]
        password: String,
    },
    /// Forget the current session
    Logout,
    /// Show pending and completed tasks
    List,
    /// Add a task
    Add {
        description: String,
        /// Due date, as YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
        /// Due time, as HH:MM (needs a date)
        #[arg(long)]
        time: Option<String>,
        /// urgent, high, medium or low
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },
    /// Mark a task as completed
    Complete { id: String },
    /// Mark a task as not completed
    Undo { id: String },
}


#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run_cli(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> Result<(), Box<dyn Error>> {
    match &cli.local {
        Some(path) => {
            let service = LocalTaskService::open_or_create(path)
                .map_err(|err| format!("unable to read task file {:?}: {}", path, err))?;
            run(&service, &cli).await?;
            service.save_to_file()?;
            Ok(())
        },
        None => {
            let timeout = cli.timeout.map(std::time::Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT);
            let client = Client::new(Settings::new(&cli.api_url, timeout)?)?;
            run(&client, &cli).await
        },
    }
}

async fn run<S>(service: &S, cli: &Cli) -> Result<(), Box<dyn Error>>
where
    S: AuthService + TaskService + Sync,
{
    match &cli.command {
        Command::Register { username, email, password } => {
            account::register(service, username, email, password).await?;
            println!("User {} registered. You can now log in.", username);
        },
        Command::Login { username, password } => {
            let session = account::login(service, username, password).await?;
            session.save_to_file(&cli.session_file)?;
            println!("Logged in as {}", session.username());
        },
        Command::Logout => {
            if cli.session_file.exists() {
                std::fs::remove_file(&cli.session_file)?;
            }
            println!("Logged out");
        },
        Command::List => {
            let mut list = TaskList::new(service, load_session(&cli.session_file)?);
            let projection = list.refresh().await?;
            print_projection(projection, Local::now().naive_local());
            for issue in projection.malformed() {
                eprintln!("warning: {}", issue);
            }
        },
        Command::Add { description, date, time, priority } => {
            let due = Due::from_form(date.as_deref(), time.as_deref())?;
            let mut list = TaskList::new(service, load_session(&cli.session_file)?);
            let created = list.add_task(description, due, Some(*priority)).await?;
            println!("Task added successfully (id {})", created.id());
        },
        Command::Complete { id } => {
            toggle(service, cli, id, true).await?;
        },
        Command::Undo { id } => {
            toggle(service, cli, id, false).await?;
        },
    }
    Ok(())
}

async fn toggle<S>(service: &S, cli: &Cli, id: &str, completed: bool) -> Result<(), Box<dyn Error>>
where
    S: TaskService + Sync,
{
    let mut list = TaskList::new(service, load_session(&cli.session_file)?);
    let projection = list.toggle_completion(&TaskId::from(id), completed).await?;
    print_projection(projection, Local::now().naive_local());
    Ok(())
}

fn load_session(path: &Path) -> Result<Session, Box<dyn Error>> {
    let session = Session::from_file(path)
        .map_err(|err| format!("not logged in ({:?}: {}). Run `tasks login` first", path, err))?;
    Ok(session)
}
