use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use taskdeck::client::{ApiClient, ClientError, SessionStore};
use taskdeck::models::{Task, TaskInput, TaskUpdate};

#[derive(Parser)]
#[command(name = "taskdeck", version, about = "taskdeck CLI - personal task tracking")]
struct Cli {
    /// Server URL
    #[arg(long, env = "TASKDECK_URL", default_value = "http://localhost:8080")]
    server: String,

    /// Session file location
    #[arg(long, env = "TASKDECK_SESSION")]
    session: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account and log in.
    ///
    /// The password is taken from $TASKDECK_PASSWORD when set; otherwise it
    /// is prompted for on stdin with terminal echo (it will be visible as
    /// typed).
    Register {
        username: String,
        email: String,
    },
    /// Log in with an existing account.
    ///
    /// The password is taken from $TASKDECK_PASSWORD when set; otherwise it
    /// is prompted for on stdin with terminal echo (it will be visible as
    /// typed).
    Login {
        username: String,
    },
    /// Discard the local session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List all tasks
    List,
    /// Show one task
    Show {
        id: i64,
    },
    /// Add a task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        completed: bool,
    },
    /// Update fields of a task (omitted fields are left unchanged)
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Mark a task completed
    Done {
        id: i64,
    },
    /// Delete a task
    Rm {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let session_path = cli
        .session
        .unwrap_or_else(SessionStore::default_path);
    let mut session = SessionStore::open(session_path);

    // Session presence gates navigation: a transition to anonymous means the
    // server rejected our credential and the stored session is gone.
    session.on_change(|authenticated| {
        if !authenticated {
            eprintln!("Session ended; run `taskdeck-cli login <username>` to continue.");
        }
    });

    let mut client = ApiClient::new(cli.server, session);

    match cli.command {
        Commands::Register { username, email } => {
            require_anonymous(&client)?;
            let password = prompt_password()?;
            let profile = client.register(&username, &email, &password).await?;
            println!("Registered and logged in as {}", profile.username);
        }
        Commands::Login { username } => {
            require_anonymous(&client)?;
            let password = prompt_password()?;
            match client.login(&username, &password).await {
                Ok(profile) => println!("Logged in as {}", profile.username),
                Err(ClientError::Unauthorized(_)) | Err(ClientError::Api { status: 401, .. }) => {
                    bail!("Invalid username or password")
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Logout => {
            client.logout();
            println!("Logged out");
        }
        Commands::Whoami => match client.session().profile() {
            Some(profile) => println!("{} <{}> (id {})", profile.username, profile.email, profile.id),
            None => println!("Not logged in"),
        },
        Commands::List => {
            let tasks = protected(client.list_tasks().await)?;
            if tasks.is_empty() {
                println!("No tasks");
            }
            for task in tasks {
                print_task_line(&task);
            }
        }
        Commands::Show { id } => {
            let task = protected(client.get_task(id).await)?;
            print_task_detail(&task);
        }
        Commands::Add {
            title,
            description,
            completed,
        } => {
            let input = TaskInput {
                title,
                description,
                completed,
            };
            let task = protected(client.create_task(&input).await)?;
            println!("Created task {}", task.id);
            print_task_line(&task);
        }
        Commands::Update {
            id,
            title,
            description,
            completed,
        } => {
            let update = TaskUpdate {
                title,
                description,
                completed,
            };
            let task = protected(client.update_task(id, &update).await)?;
            print_task_line(&task);
        }
        Commands::Done { id } => {
            let update = TaskUpdate {
                completed: Some(true),
                ..TaskUpdate::default()
            };
            let task = protected(client.update_task(id, &update).await)?;
            print_task_line(&task);
        }
        Commands::Rm { id } => {
            protected(client.delete_task(id).await)?;
            println!("Deleted task {}", id);
        }
    }

    Ok(())
}

fn require_anonymous(client: &ApiClient) -> Result<()> {
    if let Some(profile) = client.session().profile() {
        bail!(
            "Already logged in as {}; run `taskdeck-cli logout` first",
            profile.username
        );
    }
    Ok(())
}

fn protected<T>(result: std::result::Result<T, ClientError>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(ClientError::Unauthorized(msg)) => bail!("{}", msg),
        Err(e) => Err(e.into()),
    }
}

/// Resolves the password from `$TASKDECK_PASSWORD`, falling back to a stdin
/// prompt. The prompt does not disable terminal echo, so the variable is the
/// path to use on a shared screen or a recorded terminal.
fn prompt_password() -> Result<String> {
    if let Some(password) = password_from_env() {
        return Ok(password);
    }

    eprint!("Password (will be echoed; set TASKDECK_PASSWORD to avoid): ");
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

fn password_from_env() -> Option<String> {
    std::env::var("TASKDECK_PASSWORD")
        .ok()
        .filter(|password| !password.is_empty())
}

fn print_task_line(task: &Task) {
    let mark = if task.completed { "x" } else { " " };
    println!("[{}] {:>4}  {}", mark, task.id, task.title);
}

fn print_task_detail(task: &Task) {
    print_task_line(task);
    if let Some(description) = &task.description {
        println!("      {}", description);
    }
    println!("      created {}  updated {}", task.created_at, task.updated_at);
}
