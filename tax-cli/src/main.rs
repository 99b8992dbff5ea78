use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tax_core::db::DbConfig;
use tax_cli::{app, logging};
use tracing::debug;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Federal income tax calculator.
///
/// Computes a return from a TOML snapshot against a year's reference tables
/// and optionally keeps the return and its result in session storage.
#[derive(Debug, Parser)]
#[command(name = "tax-estimator", version)]
struct Cli {
    /// Storage backend to use.
    #[arg(long, global = true, default_value = "sqlite")]
    backend: String,

    /// Storage connection string, e.g. `returns.db` or `sqlite::memory:`.
    #[arg(long, global = true, default_value = "returns.db")]
    db: String,

    /// Log filter: a level (`debug`) or directives (`tax_core=trace`).
    /// Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Calculate a return and print the result.
    Calculate {
        /// Return snapshot (TOML).
        #[arg(value_name = "RETURN")]
        return_path: PathBuf,

        /// Reference tables (TOML). Defaults to the built-in 2025 tables.
        #[arg(long)]
        tables: Option<PathBuf>,

        /// Bracket schedules (CSV) replacing those in the tables.
        #[arg(long)]
        brackets: Option<PathBuf>,

        /// W-2 and 1099 rows (CSV) added to the return's income.
        #[arg(long)]
        income_csv: Option<PathBuf>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,

        /// Keep the return and its result in storage.
        #[arg(long)]
        save: bool,
    },

    /// List stored returns, newest first.
    List {
        /// Only returns for this tax year.
        #[arg(long)]
        year: Option<i32>,
    },

    /// Show the stored result for a return.
    Show {
        id: i64,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.backend.clone(),
            connection_string: self.db.clone(),
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let db_config = cli.db_config();
    let registry = app::build_registry();

    match cli.command {
        Command::Calculate {
            return_path,
            tables,
            brackets,
            income_csv,
            json,
            save,
        } => {
            let inputs = app::CalculateInputs {
                return_path,
                tables,
                brackets,
                income_csv,
            };
            let (tax_return, result) = app::calculate(&inputs)?;
            print!("{}", app::render(&result, json)?);

            if save {
                debug!("connecting to {} backend", db_config.backend);
                let repo = registry
                    .create(&db_config)
                    .await
                    .context("Failed to open storage")?;
                let id = app::save(repo.as_ref(), &tax_return, &result).await?;
                eprintln!("Saved as return {id}");
            }
        }
        Command::List { year } => {
            let repo = registry
                .create(&db_config)
                .await
                .context("Failed to open storage")?;
            print!("{}", app::list(repo.as_ref(), year).await?);
        }
        Command::Show { id, json } => {
            let repo = registry
                .create(&db_config)
                .await
                .context("Failed to open storage")?;
            print!("{}", app::show(repo.as_ref(), id, json).await?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn calculate_accepts_every_input_flag() {
        let cli = Cli::parse_from([
            "tax-estimator",
            "calculate",
            "return.toml",
            "--tables",
            "tables.toml",
            "--brackets",
            "brackets.csv",
            "--income-csv",
            "w2.csv",
            "--json",
            "--save",
        ]);

        let Command::Calculate {
            return_path,
            brackets,
            income_csv,
            json,
            save,
            ..
        } = cli.command
        else {
            panic!("expected calculate");
        };
        assert_eq!(return_path, PathBuf::from("return.toml"));
        assert_eq!(brackets, Some(PathBuf::from("brackets.csv")));
        assert_eq!(income_csv, Some(PathBuf::from("w2.csv")));
        assert!(json && save);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from([
            "tax-estimator",
            "list",
            "--year",
            "2025",
            "--db",
            "sqlite::memory:",
            "--log-level",
            "debug",
        ]);

        assert_eq!(cli.db_config(), DbConfig::default());
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::List { year: Some(2025) }));
    }
}
