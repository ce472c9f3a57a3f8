mod args;
mod build_api;

use args::{Command, RootArgs};
use build_api::{build_orchestrator, config_dir};
use clap::Parser;
use color_eyre::eyre::Result;
use spotify2tidal::report::write_report;
use tracing::{Level, debug, info};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = RootArgs::parse();

    // other crates stay silent whatever the level
    let level: Level = args.logging.clone().into();
    let filter = Targets::new().with_target("spotify2tidal", Level::TRACE);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .finish()
        .with(filter)
        .init();
    debug!("Logging level: {}", level);

    let config_dir = config_dir(&args)?;
    debug!("using config directory {}", config_dir.display());

    info!("Starting spotify2tidal ...");
    let orchestrator = build_orchestrator(&args, &config_dir).await?;

    let report = match &args.command {
        Command::Playlists => orchestrator.copy_all_playlists().await?,
        Command::DiscoverWeekly { name } => orchestrator.copy_weekly_discovery(Some(name.as_str())).await?,
        Command::ArchiveDiscoverWeekly => {
            let today = chrono::Local::now().date_naive();
            orchestrator.archive_weekly_discovery(today).await?
        }
        Command::Albums => orchestrator.copy_all_saved_albums().await?,
        Command::Artists => orchestrator.copy_all_saved_artists().await?,
        Command::Tracks => orchestrator.copy_all_saved_tracks().await?,
        Command::All => orchestrator.copy_all().await?,
    };

    report.log_summary();
    if let Some(path) = &args.report {
        write_report(&report, path, args.minify)?;
    }

    Ok(())
}
