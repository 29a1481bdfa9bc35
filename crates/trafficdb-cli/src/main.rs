mod check;
mod collect;
mod db;

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use trafficdb_core::AppConfig;

use crate::collect::resolve_periods;
use crate::db::DbCommands;

#[derive(Debug, Parser)]
#[command(name = "trafficdb")]
#[command(about = "Collect Yandex Metrika and Webmaster analytics into PostgreSQL")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect analytics for a date range, split into calendar months
    Collect {
        /// First day of the range (YYYY-MM-DD); defaults to the start of the current month
        #[arg(long)]
        from: Option<String>,
        /// Last day of the range (YYYY-MM-DD); defaults to the end of the current month
        #[arg(long)]
        to: Option<String>,
        /// Which API to collect from
        #[arg(long, value_enum, default_value_t = Source::All)]
        source: Source,
    },
    /// Database management commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Verify the OAuth token can reach both APIs
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    All,
    Metrika,
    Webmaster,
}

impl Source {
    fn includes_metrika(self) -> bool {
        matches!(self, Source::All | Source::Metrika)
    }

    fn includes_webmaster(self) -> bool {
        matches!(self, Source::All | Source::Webmaster)
    }
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

/// Full configuration for commands that call the Yandex APIs.
fn load_api_config() -> anyhow::Result<AppConfig> {
    let config = trafficdb_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let today = Local::now().date_naive();
    match cli.command {
        Some(Commands::Collect { from, to, source }) => {
            let config = load_api_config()?;
            let periods = resolve_periods(from.as_deref(), to.as_deref(), today)?;
            collect::run_collect(&config, &periods, source).await?;
        }
        Some(Commands::Db { command }) => {
            // Maintenance runs with only the Postgres settings present.
            let config = trafficdb_core::load_db_config()?;
            init_tracing(&config.log_level)?;
            db::run_db_command(&config.database, command).await?;
        }
        Some(Commands::Check) => {
            let config = load_api_config()?;
            check::run_check(&config).await?;
        }
        None => {
            let config = load_api_config()?;
            let periods = resolve_periods(None, None, today)?;
            collect::run_collect(&config, &periods, Source::All).await?;
        }
    }

    Ok(())
}
