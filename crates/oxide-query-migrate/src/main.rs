//! oxide-query-migrate CLI
//!
//! Command-line tool for generating and inspecting migrations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use oxide_query::{with_statement_timeout, Compiled};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_query_migrate::prelude::*;

/// Schema migrations for oxide-query tables.
#[derive(Parser)]
#[command(name = "oxide-query-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Migrations directory.
    #[arg(
        long,
        global = true,
        env = "OXIDE_MIGRATIONS_DIR",
        default_value = "migrations"
    )]
    migrations_dir: PathBuf,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show migration status.
    Show {
        /// Last applied migration (none applied if not specified).
        #[arg(short, long)]
        last: Option<String>,
    },

    /// Print the SQL of pending migrations.
    Sql {
        /// Last applied migration (all pending if not specified).
        #[arg(short, long)]
        last: Option<String>,

        /// Wrap each statement with a statement timeout, in milliseconds.
        #[arg(long)]
        statement_timeout: Option<u64>,
    },

    /// Generate a migration from declared tables.
    Make {
        /// JSON file declaring the tables.
        #[arg(short, long)]
        models: PathBuf,

        /// Last applied migration.
        #[arg(short, long)]
        last: Option<String>,

        /// Show the operations without writing a file.
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let migrator = Migrator::new(&cli.migrations_dir);

    match cli.command {
        Commands::Show { last } => {
            let status = migrator.status(last.as_deref())?;
            if status.is_empty() {
                info!("No migrations found in {}", cli.migrations_dir.display());
            } else {
                println!("\nMigrations:");
                println!("{:-<60}", "");
                for (name, applied) in &status {
                    let mark = if *applied { "X" } else { " " };
                    println!(" [{mark}] {name}");
                }
                println!();
            }
        }

        Commands::Sql {
            last,
            statement_timeout,
        } => {
            let mut printed = 0_usize;
            for step in migrator.migrate(last.as_deref())? {
                let (name, operations) = step?;
                println!("-- {name}");
                for sql in Migrator::sql_for(&operations) {
                    match statement_timeout {
                        Some(ms) => {
                            let statement = Compiled {
                                sql,
                                params: Vec::new(),
                            };
                            println!("{}", with_statement_timeout(statement, ms).sql);
                        }
                        None => println!("{sql};"),
                    }
                }
                printed += 1;
            }
            if printed == 0 {
                info!("No pending migrations.");
            }
        }

        Commands::Make {
            models,
            last,
            dry_run,
        } => {
            let tables = load_models(&models)?;
            info!(
                "Loaded {} table(s) from {}",
                tables.len(),
                models.display()
            );

            if dry_run {
                let operations = migrator.plan(last.as_deref(), &tables)?;
                if operations.is_empty() {
                    info!("No changes detected.");
                }
                for operation in &operations {
                    println!("-- {}", operation.summary());
                    println!("{};", operation.compile());
                }
            } else if let Some(path) = migrator.create_migrations(last.as_deref(), &tables)? {
                info!("Created migration: {}", path.display());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_migrations_dir_after_subcommand() {
        let cli = Cli::try_parse_from([
            "oxide-query-migrate",
            "make",
            "--migrations-dir",
            "db/migrations",
            "-m",
            "models.json",
        ])
        .unwrap();
        assert_eq!(cli.migrations_dir, PathBuf::from("db/migrations"));
        assert!(matches!(cli.command, Commands::Make { ref models, .. } if models == &PathBuf::from("models.json")));
    }
}
