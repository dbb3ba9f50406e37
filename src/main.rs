use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use roster_sync::{
    open_database, renormalize_table, run_sync, run_verify, CsvFeed, LiquipediaProfiles, Mode,
    RosterSource, Settings, SpreadsheetFeed, SyncOptions, WebhookNotifier,
};

#[derive(Parser)]
#[command(name = "roster-sync")]
#[command(about = "Sync the stored roster with the published feed and announce changes", long_about = None)]
struct Cli {
    /// Use the test table and test webhook
    #[arg(long, conflicts_with_all = ["verify", "normalize"])]
    test: bool,

    /// Copy the live table into the test table, then sync the copy
    #[arg(long, conflicts_with = "normalize")]
    verify: bool,

    /// Rewrite the live table with normalized names (keeps a `<table>_old` backup)
    #[arg(long)]
    normalize: bool,

    /// Read the roster from a headerless CSV file instead of the spreadsheet
    #[arg(long, value_name = "PATH")]
    feed_csv: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env()?;
    let conn = open_database(&settings.database_path)?;

    if cli.normalize {
        let written = renormalize_table(&conn, &settings.table_name)?;
        info!(written, "normalize finished");
        return Ok(());
    }

    let mode = if cli.verify {
        Mode::Verify
    } else if cli.test {
        Mode::Test
    } else {
        Mode::Live
    };
    let target = mode.target(&settings)?;
    info!(?mode, table = %target.table, "starting sync");

    let source: Box<dyn RosterSource> = match &cli.feed_csv {
        Some(path) => Box::new(CsvFeed::new(path)),
        None => Box::new(SpreadsheetFeed::new(settings.target_url.clone())?),
    };
    let profiles = LiquipediaProfiles::new()?;
    let notifier = WebhookNotifier::new(target.webhook_url.clone())?;

    let outcome = match mode {
        Mode::Verify => run_verify(&conn, &settings, source.as_ref(), &profiles, &notifier)?,
        Mode::Live | Mode::Test => run_sync(
            &conn,
            &target.table,
            source.as_ref(),
            &profiles,
            &notifier,
            SyncOptions::from(&settings),
        )?,
    };

    info!(
        fetched = outcome.fetched,
        persisted = outcome.persisted,
        updated = outcome.written.updated,
        inserted = outcome.written.inserted,
        deleted = outcome.written.deleted,
        delivered = outcome.delivered,
        "done"
    );
    Ok(())
}
