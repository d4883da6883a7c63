use anyhow::Context;
use clap::{Parser, Subcommand};
use huddle_config::{load as load_config, AppConfig};
use huddle_runtime::{shutdown_signal, telemetry, BackendServices};
use huddle_server::{build_app, data};
use huddle_workspaces::FileStore;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "huddle-server")]
#[command(about = "Huddle team chat backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create a demo user, workspace, channels and messages
    SeedData,
    /// Print users, workspaces, members, channels and message counts
    DumpData,
    /// Delete all workspace data, keeping users
    ClearData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::SeedData => seed_data(config).await,
        Commands::DumpData => dump_data(config).await,
        Commands::ClearData => clear_data(config).await,
    }
}

async fn initialise(config: &AppConfig) -> anyhow::Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    info!("starting Huddle backend");

    let services = initialise(&config).await?;
    let app = build_app(&services, &config);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, public_url = %config.http.public_url, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn seed_data(config: AppConfig) -> anyhow::Result<()> {
    let services = initialise(&config).await?;

    match data::seed(&services).await? {
        Some(summary) => {
            println!("Database seeded with demo data:");
            println!("- sign in as {} / {}", data::DEMO_EMAIL, data::DEMO_PASSWORD);
            println!(
                "- workspace {} (join code {})",
                summary.workspace_id, summary.join_code
            );
            println!("- {} channels, {} messages", summary.channels, summary.messages);
            println!("Run 'dump-data' to see the inserted data");
        }
        None => println!("Demo data already present; run 'clear-data' to start over"),
    }
    Ok(())
}

async fn dump_data(config: AppConfig) -> anyhow::Result<()> {
    let services = initialise(&config).await?;
    data::dump(&services).await
}

async fn clear_data(config: AppConfig) -> anyhow::Result<()> {
    let services = initialise(&config).await?;
    let store = FileStore::new(&config.storage.root);

    let summary = data::clear(&services, &store).await?;
    println!("Database cleared:");
    println!("- {} workspaces deleted", summary.workspaces);
    println!("- {} messages deleted", summary.messages);
    println!("- {} files deleted", summary.files);
    Ok(())
}
