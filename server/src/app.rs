//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands, KeyCommands, OrgCommands, SystemCommands};
use crate::core::config::AppConfig;
use crate::core::constants::ENV_LOG;
use crate::core::secret::ApiKeySecret;
use crate::core::shutdown::ShutdownService;
use crate::core::storage::AppStorage;
use crate::data::{SqliteService, TransactionalRepository};
use crate::utils::api_key::{expiry_after_days, generate_api_key, hash_api_key, key_prefix};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub storage: AppStorage,
    pub database: Arc<SqliteService>,
    pub api_key_secret: Arc<ApiKeySecret>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();

        let (cli_config, command) = cli::parse();
        Self::init_logging(cli_config.debug);

        tracing::debug!("Application starting");
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::System {
                command: system_cmd,
            }) => Self::handle_system_command(system_cmd),
            Some(Commands::Orgs { command }) => Self::handle_org_command(command).await,
            Some(Commands::Keys { command }) => Self::handle_key_command(command).await,
            Some(Commands::Start) | None => {
                let app = Self::init(&cli_config).await?;
                Self::start_server(app).await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let storage = AppStorage::init().await?;
        let api_key_secret = Arc::new(ApiKeySecret::load_or_create(&storage)?);

        let database = Arc::new(
            SqliteService::init(&storage)
                .await
                .context("Failed to initialize database")?,
        );
        let shutdown = ShutdownService::new(database.clone());

        Ok(Self {
            shutdown,
            config,
            storage,
            database,
            api_key_secret,
        })
    }

    /// Open storage and database for one-shot management commands
    async fn open_database() -> Result<(AppStorage, SqliteService)> {
        let storage = AppStorage::init().await?;
        let database = SqliteService::init(&storage)
            .await
            .context("Failed to initialize database")?;
        Ok((storage, database))
    }

    fn handle_system_command(cmd: SystemCommands) -> Result<()> {
        match cmd {
            SystemCommands::Prune { yes } => Self::prune_data(yes),
        }
    }

    async fn handle_org_command(cmd: OrgCommands) -> Result<()> {
        match cmd {
            OrgCommands::Create { name, slug } => {
                let (_, database) = Self::open_database().await?;
                let database = Arc::new(database);
                let org = database
                    .create_organization(name.trim(), slug.trim())
                    .await
                    .context("Failed to create organization")?;
                database.close().await;

                println!("Created organization {} ({})", org.name, org.slug);
                println!("  id: {}", org.id);
                Ok(())
            }
        }
    }

    async fn handle_key_command(cmd: KeyCommands) -> Result<()> {
        match cmd {
            KeyCommands::Create {
                org,
                name,
                expires_in_days,
            } => {
                let (storage, database) = Self::open_database().await?;
                let database = Arc::new(database);
                let secret = ApiKeySecret::load_or_create(&storage)?;

                if database.get_organization(&org).await?.is_none() {
                    database.close().await;
                    anyhow::bail!("Organization not found: {}", org);
                }

                let key = generate_api_key();
                let row = database
                    .create_api_key(
                        &org,
                        name.trim(),
                        &hash_api_key(&key, secret.as_bytes()),
                        &key_prefix(&key),
                        expiry_after_days(chrono::Utc::now().timestamp(), expires_in_days),
                    )
                    .await
                    .context("Failed to create API key")?;
                database.close().await;

                println!("Created API key '{}' ({}) for organization {}", row.name, row.id, org);
                if let Some(expires) = row.expires_at.and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)) {
                    println!("Expires {}", expires.to_rfc3339());
                }
                println!();
                println!("  {}", key);
                println!();
                println!("Store it now. It cannot be shown again.");
                Ok(())
            }
        }
    }

    fn prune_data(skip_confirm: bool) -> Result<()> {
        let data_dir = AppStorage::resolve_data_dir();

        if !data_dir.exists() {
            println!(
                "Nothing to prune. Data directory does not exist: {}",
                data_dir.display()
            );
            return Ok(());
        }

        let data_dir = data_dir.canonicalize().unwrap_or(data_dir);

        println!("This will permanently delete the local data directory:");
        println!("  {}", data_dir.display());
        println!();
        println!(
            "Make sure the server is not running. \
             Deleting data while the server is running will cause data corruption."
        );

        if !skip_confirm {
            print!("\nContinue? [y/N] ");
            std::io::Write::flush(&mut std::io::stdout())?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
                println!("Aborted.");
                return Ok(());
            }
        }

        std::fs::remove_dir_all(&data_dir)
            .with_context(|| format!("Failed to delete data directory: {}", data_dir.display()))?;
        println!("Pruned: {}", data_dir.display());
        Ok(())
    }

    fn init_logging(debug: bool) {
        let level = if debug { "debug" } else { "info" };
        let default_filter = format!("info,{}={}", env!("CARGO_CRATE_NAME"), level);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        app.start_background_tasks().await;

        if app.config.debug {
            tracing::info!(
                server_side_aggregation = app.config.charts.server_side_aggregation,
                "Debug mode enabled"
            );
        }

        banner::print_banner(
            &app.config.server.host,
            app.config.server.port,
            app.config.auth.enabled,
            &app.storage.data_dir().display().to_string(),
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }

    pub async fn start_background_tasks(&self) {
        self.shutdown
            .register(
                self.database
                    .start_checkpoint_task(self.shutdown.subscribe()),
            )
            .await;

        tracing::debug!("Background tasks started");
    }
}
