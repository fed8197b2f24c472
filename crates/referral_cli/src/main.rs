//! Maintenance CLI over `referral_core`.
//!
//! # Responsibility
//! - Expose company resolution, membership, roster and sweep operations for
//!   local maintenance and scheduled jobs.
//! - Keep output deterministic `key=value` lines for scripting.

use clap::{Parser, Subcommand};
use log::error;
use referral_core::db::open_db;
use referral_core::{
    default_seed_companies, init_logging_from_config, CoreConfig, SqliteCompanyService,
};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "referral", version, about = "Company identity maintenance")]
struct Cli {
    /// JSON config file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Run the curated seed list before the command.
    #[arg(long, global = true)]
    seed: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core linkage information.
    Ping,
    /// Create missing companies from the curated seed list.
    Seed,
    /// Reconcile every profile company reference.
    Sync,
    /// List all companies.
    Companies,
    /// Print the roster of one company.
    Members { company_id: Uuid },
    /// Resolve a company id or name, creating the company when needed.
    Resolve { reference: String },
    /// Add a user to a company.
    Join {
        user_id: Uuid,
        company_id: Uuid,
        job_title: String,
        #[arg(long)]
        department: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_command module=cli status=error");
            eprintln!("error={message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if matches!(cli.command, Command::Ping) {
        println!("referral_core ping={}", referral_core::ping());
        println!("referral_core version={}", referral_core::core_version());
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    init_logging_from_config(&config).map_err(|err| err.to_string())?;

    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let service = SqliteCompanyService::try_from_conn(&conn).map_err(|err| err.to_string())?;

    if config.seed_on_startup && !matches!(cli.command, Command::Seed) {
        service
            .ensure_seed_companies(&config.call_context(), &default_seed_companies())
            .map_err(|err| err.to_string())?;
    }

    let ctx = config.call_context();
    match cli.command {
        Command::Ping => {}
        Command::Seed => {
            let report = service
                .ensure_seed_companies(&ctx, &default_seed_companies())
                .map_err(|err| err.to_string())?;
            println!(
                "created={} already_present={}",
                report.created, report.already_present
            );
        }
        Command::Sync => {
            let report = service.sync_all(&ctx).map_err(|err| err.to_string())?;
            println!(
                "scanned={} skipped_blank={} companies_created={} profiles_rewritten={} memberships_created={} failures={}",
                report.scanned,
                report.skipped_blank,
                report.companies_created,
                report.profiles_rewritten,
                report.memberships_created,
                report.failures.len()
            );
            for failure in &report.failures {
                println!(
                    "failure user_id={} kind={}",
                    failure.user_id,
                    failure.kind.as_str()
                );
            }
        }
        Command::Companies => {
            for company in service.get_all_companies(&ctx).map_err(|err| err.to_string())? {
                println!(
                    "id={} name={:?} sector={}",
                    company.id,
                    company.name,
                    company.sector.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Members { company_id } => {
            let members = service
                .get_company_members(&ctx, company_id)
                .map_err(|err| err.to_string())?;
            for member in members {
                println!(
                    "user_id={} job_title={:?} source={:?} healed={}",
                    member.user_id,
                    member.job_title.as_deref().unwrap_or(""),
                    member.source,
                    member.healed
                );
            }
        }
        Command::Resolve { reference } => {
            let id = service
                .resolve_or_create_company(&ctx, &reference)
                .map_err(|err| err.to_string())?;
            println!("company_id={id}");
        }
        Command::Join {
            user_id,
            company_id,
            job_title,
            department,
        } => {
            let membership = service
                .add_member(
                    &ctx,
                    user_id,
                    company_id,
                    &job_title,
                    department.as_deref(),
                )
                .map_err(|err| err.to_string())?;
            println!(
                "membership_id={} user_id={} company_id={}",
                membership.id, membership.user_id, membership.company_id
            );
        }
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<CoreConfig, String> {
    let mut config = match &cli.config {
        Some(path) => CoreConfig::load(path).map_err(|err| err.to_string())?,
        None => CoreConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path.clone_from(db);
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level.clone_from(level);
    }
    config.seed_on_startup |= cli.seed;
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}
