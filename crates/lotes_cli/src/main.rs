//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `lotes_core` linkage and that the configured store opens.
//! - Print deterministic `key=value` lines for quick local sanity checks.
//!
//! Usage: `lotes_cli [config.json]`. Without an argument the built-in
//! defaults are used (store file `lotes.db` in the working directory).

use lotes_core::db::migrations::latest_version;
use lotes_core::db::open_db;
use lotes_core::{AppConfig, LoteService, SqliteLoteRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("lotes_cli error={message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    println!("lotes_core ping={}", lotes_core::ping());
    println!("lotes_core version={}", lotes_core::core_version());

    let config = match std::env::args_os().nth(1) {
        Some(path) => AppConfig::load(&path).map_err(|err| err.to_string())?,
        None => AppConfig::default(),
    };
    let logging = lotes_core::init_logging_from_config(&config)?;
    println!("logging enabled={logging}");

    let conn = open_db(&config.database_path).map_err(|err| err.to_string())?;
    println!(
        "store path={} schema_version={}",
        config.database_path.display(),
        latest_version()
    );

    let repo = SqliteLoteRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let service = LoteService::new(repo, config.service_policy());
    let pending = service
        .list_pending_units()
        .map_err(|err| err.to_string())?;
    let report = service.get_report().map_err(|err| err.to_string())?;
    println!(
        "store pending_units={} report_rows={} firms={}",
        pending.len(),
        report.len(),
        config.firms.names().len()
    );
    Ok(())
}
