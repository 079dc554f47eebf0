use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use pizzashop::{
    api::{self, AppState},
    config::{database, settings},
    core::{
        catalog::{self, ImportOutcome},
        users,
    },
    errors::Result,
};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pizzashop", version, about = "Pizza shop order backend")]
struct Cli {
    /// Path to the TOML settings file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the REST API
    Serve,
    /// Create the tables and import the menu catalog if it is empty
    InitDb {
        /// CSV file to import instead of the configured one
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Create a user and print their API token
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can be set externally too
    dotenv().ok();

    let cli = Cli::parse();

    // 3. Load settings
    let app_config = settings::load_config_or_default(&cli.config)
        .inspect_err(|e| error!("Failed to load {}: {}", cli.config.display(), e))?;

    // 4. Initialize database
    let db = database::init_database()
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    match cli.command {
        Command::Serve => {
            info!(
                "Amount policy {:?}, line failure policy {:?}",
                app_config.orders.amount_policy, app_config.orders.line_failure_policy
            );
            let state = AppState::new(Arc::new(db), Arc::new(app_config));
            api::serve(state)
                .await
                .inspect_err(|e| error!("Server stopped with an error: {}", e))?;
        }
        Command::InitDb { csv } => {
            let path = csv.unwrap_or_else(|| app_config.catalog.csv_path.clone());
            match catalog::import_catalog(&db, &path)
                .await
                .inspect_err(|e| error!("Catalog import from {} failed: {}", path.display(), e))?
            {
                ImportOutcome::AlreadyPopulated { existing } => {
                    info!("Catalog already holds {} item(s), import skipped.", existing);
                }
                ImportOutcome::Imported(summary) => {
                    info!("Imported {} menu item(s).", summary.inserted);
                    for failure in &summary.failures {
                        warn!("Line {} skipped: {}", failure.line, failure.reason);
                    }
                }
            }
        }
        Command::CreateUser { username, email } => {
            let user = users::create_user(&db, &username, &email)
                .await
                .inspect_err(|e| error!("Failed to create user {}: {}", username, e))?;
            let token = users::get_or_create_token(&db, user.id).await?;
            info!("Created user {} (id {}).", user.username, user.id);
            println!("{}", token.key);
        }
    }

    Ok(())
}
