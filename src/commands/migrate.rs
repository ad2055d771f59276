//! Migrate command - schema management for users and the catalog.

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    // `serve` migrates on connect; here every step is explicit
    let db = Database::connect_without_migrations(&config).await?;

    match args.action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            tracing::info!("Schema is up to date");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            tracing::info!("Rolled back the latest migration");
        }
        MigrateAction::Status => print_status(&db).await?,
        MigrateAction::Fresh => {
            // Drops every table, including users
            if !config.is_development() {
                return Err(AppError::bad_request(format!(
                    "Refusing to reset the database in '{}'",
                    config.environment
                )));
            }
            tracing::warn!("Dropping all tables and re-running migrations");
            db.fresh_migrations().await?;
            tracing::info!("Database rebuilt");
        }
    }

    Ok(())
}

async fn print_status(db: &Database) -> AppResult<()> {
    let status = db.migration_status().await?;
    let pending = status.iter().filter(|(_, applied)| !applied).count();

    for (name, applied) in &status {
        println!("[{}] {}", if *applied { "x" } else { " " }, name);
    }
    println!("{} migration(s), {} pending", status.len(), pending);
    Ok(())
}
