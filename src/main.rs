use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use torrust_e2e_env::compose::ServiceStatus;
use torrust_e2e_env::config::{self, Config};
use torrust_e2e_env::ops::E2eEnv;

#[derive(Parser)]
#[command(name = "torrust-e2e-env", version)]
#[command(about = "Build, start, stop and reset the Docker Compose environment for Torrust e2e testing")]
struct Cli {
    /// Compose file driving the environment
    #[arg(long, global = true, env = "TORRUST_COMPOSE_FILE")]
    compose_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the container images and start the environment
    Up {
        /// Skip the readiness wait after starting the containers
        #[arg(long)]
        no_wait: bool,
    },
    /// Stop and remove the containers
    Down,
    /// Tear down, wipe both test databases and bring the environment back up
    Reset {
        /// Skip the readiness wait after restarting the containers
        #[arg(long)]
        no_wait: bool,
    },
    /// Show the state of the environment's containers
    Status,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            process::exit(1);
        }
    };
    if let Some(compose_file) = cli.compose_file {
        cfg.compose_file = compose_file;
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        compose_file = %cfg.compose_file.display(),
        mysql_url = %config::redacted(&cfg.mysql_url),
        mysql_database = %cfg.idx_back_mysql_database,
        tracker_database_file = %cfg.tracker_database_file.display(),
        "loaded e2e environment configuration"
    );

    let env = E2eEnv::new(cfg);

    let result = match cli.command {
        Commands::Up { no_wait } => env.up(!no_wait).await,
        Commands::Down => env.down().await,
        Commands::Reset { no_wait } => env.reset(!no_wait).await,
        Commands::Status => env.status().await.map(|services| print_status(&services)),
    };

    if let Err(e) = result {
        error!("{e}");
        process::exit(1);
    }
}

fn print_status(services: &[ServiceStatus]) {
    if services.is_empty() {
        println!("no containers found; is the environment up?");
        return;
    }
    for s in services {
        let health = s.health.as_deref().filter(|h| !h.is_empty()).unwrap_or("-");
        println!("{:<40} {:<12} {health}", s.name, s.state);
    }
}
