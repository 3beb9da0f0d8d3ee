use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use nexus_application::NexusApp;
use nexus_core::NexusError;
use nexus_core::opportunity::Stage;
use nexus_core::task::TaskStatus;
use nexus_infrastructure::NexusPaths;

mod commands;

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "NexusFlow CLI - CRM contacts, pipeline, tasks and calendar", long_about = None)]
struct Cli {
    /// Directory holding config.toml and credentials.toml
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Contacts
    Contacts {
        #[command(subcommand)]
        action: ContactsAction,
    },
    /// Tasks
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },
    /// Sales pipeline computed from the opportunities list
    Pipeline {
        /// Only list opportunities in this stage (e.g. closed_won)
        #[arg(long)]
        stage: Option<Stage>,
    },
    /// Move an opportunity to another stage
    Stage { id: String, stage: Stage },
    /// Dashboard and pipeline aggregates from the server
    Dashboard,
    /// Calendar events between two dates (inclusive)
    Events {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
}

#[derive(Subcommand)]
enum ContactsAction {
    /// List contacts, optionally filtered server-side
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// Filter the fetched contacts locally
    Search { term: String },
    /// Show one contact
    Show { id: String },
    /// Mark a contact as contacted now
    Touch { id: String },
}

#[derive(Subcommand)]
enum TasksAction {
    /// List tasks
    List {
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        overdue: bool,
    },
    /// Mark a task completed
    Complete { id: String },
    /// Mark a task in progress
    Start { id: String },
    /// Counts by status
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = NexusPaths::new(cli.config_dir.as_deref());
    let app = NexusApp::bootstrap(&paths)?;
    app.init().await?;

    let result = run(&app, cli.command).await;

    if let Err(e) = &result {
        if matches!(e.downcast_ref::<NexusError>(), Some(NexusError::SessionExpired)) {
            app.session().logout().await;
        }
    }
    app.dispose().await;

    result
}

async fn run(app: &NexusApp, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => commands::auth::login(app, email, password).await?,
        Commands::Logout => commands::auth::logout(app).await?,
        Commands::Whoami => commands::auth::whoami(app).await?,
        Commands::Contacts { action } => match action {
            ContactsAction::List { search, page } => {
                commands::contacts::list(app, search, page).await?
            }
            ContactsAction::Search { term } => commands::contacts::search(app, &term).await?,
            ContactsAction::Show { id } => commands::contacts::show(app, &id.into()).await?,
            ContactsAction::Touch { id } => commands::contacts::touch(app, &id.into()).await?,
        },
        Commands::Tasks { action } => match action {
            TasksAction::List { status, overdue } => {
                commands::tasks::list(app, status, overdue).await?
            }
            TasksAction::Complete { id } => commands::tasks::complete(app, &id.into()).await?,
            TasksAction::Start { id } => commands::tasks::start(app, &id.into()).await?,
            TasksAction::Stats => commands::tasks::stats(app).await?,
        },
        Commands::Pipeline { stage } => commands::pipeline::show(app, stage).await?,
        Commands::Stage { id, stage } => {
            commands::pipeline::move_stage(app, &id.into(), stage).await?
        }
        Commands::Dashboard => commands::pipeline::dashboard(app).await?,
        Commands::Events { from, to } => commands::events::between(app, &from, &to).await?,
    }

    Ok(())
}
