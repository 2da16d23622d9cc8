use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use netjournal::config::JournalConfig;
use netjournal::discovery::{SysfsEnumerator, find_interfaces};
use netjournal::effects::IpCommandHandler;
use netjournal::host::MemoryHost;
use netjournal::phases::{PhaseError, PlanOutcome, RunOutcome, plan_phase, run_deferred};

mod cli;

use cli::{Cli, Commands, FindArgs, PlanArgs, RunArgs};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netjournal=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Plan(args) => plan(args),
        Commands::Run(args) => run(args),
        Commands::Find(args) => find(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            let cancelled = e
                .downcast_ref::<PhaseError>()
                .is_some_and(PhaseError::is_user_cancelled);
            if cancelled {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn plan(args: PlanArgs) -> Result<()> {
    let mut host = MemoryHost::load(&args.session)
        .with_context(|| format!("loading session {}", args.session.display()))?;
    let config = match args.journal_dir {
        Some(dir) => JournalConfig::new(dir),
        None => JournalConfig::default(),
    };

    let outcome = plan_phase(&mut host, &config)?;

    host.save(&args.session)
        .with_context(|| format!("saving session {}", args.session.display()))?;

    match outcome {
        PlanOutcome::NothingToPlan => tracing::info!("no interface table, nothing planned"),
        PlanOutcome::Planned(journals) => {
            for journal in journals {
                println!("{}={}", journal.action, journal.token.display());
            }
        }
    }
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let mut handler = IpCommandHandler::new().with_program(args.ip);

    match run_deferred(&args.token, args.mode.into(), &mut handler)? {
        RunOutcome::Executed {
            report,
            commit_token,
            rollback_token,
        } => {
            tracing::info!(executed = report.executed, "journal executed");
            println!("commit={}", commit_token.display());
            println!("rollback={}", rollback_token.display());
        }
        RunOutcome::Finalized {
            action,
            entries,
            failures,
        } => {
            tracing::info!(%action, entries, failures, "cleanup finished");
        }
        RunOutcome::NothingToFinalize { action } => {
            tracing::info!(%action, "nothing to clean up");
        }
    }
    Ok(())
}

fn find(args: FindArgs) -> Result<()> {
    let mut host = MemoryHost::load(&args.session)
        .with_context(|| format!("loading session {}", args.session.display()))?;
    let config = JournalConfig::default().with_hardware_id(args.hardware_id);
    let enumerator = SysfsEnumerator::new(args.sysfs);

    let found = find_interfaces(
        &enumerator,
        &mut host,
        &config.hardware_id,
        &config.interfaces_property,
    )?;

    host.save(&args.session)
        .with_context(|| format!("saving session {}", args.session.display()))?;

    for iface in found {
        println!("{}\t{}", iface.id, iface.name);
    }
    Ok(())
}
