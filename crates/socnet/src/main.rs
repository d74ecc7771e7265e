mod config;
mod logging;
mod menu;

use std::io;

use anyhow::Context;
use tracing::info;

use config::Config;
use menu::Menu;
use socnet_db::Database;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env();
    let log_path = logging::init(&config.log_dir)?;
    info!("Logging to {}", log_path.display());

    // The schema is rebuilt on every start
    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path.display()))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(&db, stdin.lock(), stdout.lock()).run()?;

    info!("Exiting");
    Ok(())
}
