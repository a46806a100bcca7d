// ABOUTME: CLI entry point for postgres-ext-manager
// ABOUTME: Parses parameters, runs the ensure command, prints a JSON result record

use anyhow::Context;
use clap::Parser;
use postgres_ext_manager::commands;
use postgres_ext_manager::config::RawParams;
use postgres_ext_manager::postgres::{DesiredState, IdentifierQuoter};
use postgres_ext_manager::report::{ExtensionReport, FailureReport};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "postgres-ext-manager")]
#[command(about = "Add, upgrade, or remove a PostgreSQL extension in one database", long_about = None)]
#[command(version)]
struct Cli {
    /// Name of the extension to add or remove
    #[arg(long, visible_alias = "ext")]
    name: Option<String>,
    /// Version to install or update to; omitted means latest, or leave as installed
    #[arg(long = "ext-version")]
    ext_version: Option<String>,
    /// Database to add the extension to or remove it from
    #[arg(long, env = "PGDATABASE")]
    db: Option<String>,
    /// Role to log in as (default: postgres)
    #[arg(long, env = "PGUSER")]
    login_user: Option<String>,
    /// Password for the login role
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    login_password: Option<String>,
    /// Host or Unix socket directory (default: local socket)
    #[arg(long, env = "PGHOST")]
    login_host: Option<String>,
    /// Server port (default: 5432)
    #[arg(long, env = "PGPORT")]
    port: Option<String>,
    /// Whether the extension should be present or absent (default: present)
    #[arg(long, value_enum)]
    state: Option<DesiredState>,
    /// Report what would change without executing any DDL
    #[arg(long)]
    check: bool,
    /// How extension names are quoted into DDL
    #[arg(long, value_enum, default_value_t = IdentifierQuoter::Native)]
    quoting: IdentifierQuoter,
    /// TOML or JSON file with the same keys as the options above
    #[arg(long)]
    params: Option<PathBuf>,
}

impl Cli {
    fn raw_params(&self) -> RawParams {
        RawParams {
            name: self.name.clone(),
            version: self.ext_version.clone(),
            db: self.db.clone(),
            login_user: self.login_user.clone(),
            login_password: self.login_password.clone(),
            login_host: self.login_host.clone(),
            port: self.port.clone(),
            state: self.state,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only the result record
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(report) => {
            print_json(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            print_json(&FailureReport::from_error(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<ExtensionReport> {
    let base = match &cli.params {
        Some(path) => RawParams::from_file(path)
            .with_context(|| format!("Failed to load parameters from {}", path.display()))?,
        None => RawParams::default(),
    };
    let params = base.overlay(cli.raw_params()).resolve()?;

    commands::ensure(&params, cli.quoting, cli.check).await
}

fn print_json<T: serde::Serialize>(record: &T) {
    match serde_json::to_string(record) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize result: {}", e),
    }
}
