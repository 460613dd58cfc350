//! zinspector - diagnostic data collector for Zabbix-style monitoring servers.
//!
//! Collects server diagnostics (runtime diaginfo, trapper statistics,
//! filtered config), system information and an optional database SQL task
//! batch into a single archive.

mod setup;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use zinspector_collect::{Diagnostic, DiagnosticOptions, DEFAULT_OUTPUT_DIR};

#[derive(Parser, Debug)]
#[command(
    name = "zinspector",
    version,
    about = "Diagnostic data collector for Zabbix-style monitoring servers"
)]
struct Cli {
    /// Output directory for collected artifacts
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR, env = "ZINSPECTOR_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Timeout for the trapper statistics exchange, in seconds
    #[arg(long, default_value_t = 60, env = "ZINSPECTOR_STATS_TIMEOUT")]
    stats_timeout: u64,

    /// Keep the temporary config created for the diaginfo run
    #[arg(long)]
    keep_temp_config: bool,

    /// Run the database SQL task batch
    #[arg(long)]
    db: bool,

    /// Directory with SQL task scripts (used with --db)
    #[arg(long, env = "ZINSPECTOR_SQL_DIR")]
    sql_dir: Option<PathBuf>,

    /// Interactively set up the database connection config and exit
    #[arg(long)]
    db_init: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if whoami::username() != "root" {
        tracing::warn!("Not running as root; some collectors may fail");
    }

    if cli.db_init {
        return setup::init_database_config().await;
    }

    let options = DiagnosticOptions::default()
        .with_output_dir(cli.output_dir)
        .with_stats_timeout(Duration::from_secs(cli.stats_timeout))
        .with_keep_temp_config(cli.keep_temp_config)
        .with_database(cli.db, cli.sql_dir);

    let report = Diagnostic::new(options).run().await?;
    report.print();
    Ok(())
}
