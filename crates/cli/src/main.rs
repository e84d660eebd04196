use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use pontoon_storage::{SqliteStorage, StorageGateway};

#[derive(Parser)]
#[command(name = "pontoon", about = "Pontoon — chat network bridge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the SQLite database. Defaults to the configured path.
    #[arg(long, global = true)]
    database: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storage schema migrations and exit.
    Migrate,
    /// Session management.
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List persisted sessions.
    List,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

async fn open_storage(database: Option<&str>) -> anyhow::Result<SqliteStorage> {
    let path = match database {
        Some(path) => path.to_string(),
        None => pontoon_config::discover_and_load().database.path,
    };
    SqliteStorage::open(&path).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    match &cli.command {
        Commands::Migrate => {
            let storage = open_storage(cli.database.as_deref()).await?;
            storage.upgrade().await?;
            info!("schema up to date");
            Ok(())
        },
        Commands::Sessions { action } => match action {
            SessionAction::List => {
                let storage = open_storage(cli.database.as_deref()).await?;
                storage.upgrade().await?;
                let sessions = storage.list_sessions().await?;
                if sessions.is_empty() {
                    println!("no sessions");
                    return Ok(());
                }
                for record in sessions {
                    println!("{}\t{}", record.session_id, record.account_id);
                }
                Ok(())
            },
        },
    }
}
