use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use spotify2tidal::ConfigArgs;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub spotify: SpotifyArgs,

    #[command(flatten)]
    pub tidal: TidalArgs,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Directory holding the cached OAuth tokens
    #[arg(long, env = "SPOTIFY2TIDAL_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Ignore cached OAuth tokens and authorize again
    #[arg(long)]
    pub clear_cache: bool,

    /// Write a JSON report of the run to this file
    ///
    ///
    /// This includes:
    /// - conversion rate for each playlist and saved collection
    /// - items that couldn't be found on Tidal
    /// - items that failed to be written
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write the report without indentation
    #[arg(long, requires = "report")]
    pub minify: bool,

    #[arg(short, long, default_value = "info")]
    pub logging: LoggingLevel,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Copy every playlist you own, replacing Tidal playlists of the same name
    Playlists,
    /// Copy the "Discover Weekly" playlist
    DiscoverWeekly {
        /// Name of the playlist on Tidal
        #[arg(long, default_value = "Discover Weekly")]
        name: String,
    },
    /// Copy the "Discover Weekly" playlist as "Discover Weekly: <year> - <week>"
    ArchiveDiscoverWeekly,
    /// Add saved albums to Tidal favorites
    Albums,
    /// Add followed artists to Tidal favorites
    Artists,
    /// Add saved tracks to Tidal favorites
    Tracks,
    /// Playlists, albums, artists and tracks
    All,
}

#[derive(Args, Debug)]
pub struct SpotifyArgs {
    /// The client ID for the Spotify API application
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    pub spotify_client_id: Option<String>,
    /// The client secret for the Spotify API application
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET")]
    pub spotify_client_secret: Option<String>,
    /// Redirect URI whitelisted for the application, a local listener is
    /// opened on its host and port
    #[arg(
        long,
        env = "SPOTIFY_REDIRECT_URI",
        default_value = "http://localhost:8888/callback"
    )]
    pub spotify_redirect_uri: String,
    /// ID or share link of your "Discover Weekly" playlist
    #[arg(long, env = "SPOTIFY_DISCOVER_WEEKLY_ID")]
    pub spotify_discover_weekly_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct TidalArgs {
    /// Tidal username, for the username/password login
    #[arg(long, env = "TIDAL_USERNAME")]
    pub tidal_username: Option<String>,
    /// Tidal password, for the username/password login
    #[arg(long, env = "TIDAL_PASSWORD")]
    pub tidal_password: Option<String>,
    /// API token of the Tidal client application, for the username/password login
    #[arg(long, env = "TIDAL_TOKEN")]
    pub tidal_token: Option<String>,
    /// Log in by confirming a device code in the browser instead of a password
    #[arg(long)]
    pub tidal_device_login: bool,
    /// Client ID used for the device login
    #[arg(long, env = "TIDAL_CLIENT_ID")]
    pub tidal_client_id: Option<String>,
    /// Client secret used for the device login
    #[arg(long, env = "TIDAL_CLIENT_SECRET")]
    pub tidal_client_secret: Option<String>,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum LoggingLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LoggingLevel> for Level {
    fn from(level: LoggingLevel) -> Self {
        match level {
            LoggingLevel::Trace => Level::TRACE,
            LoggingLevel::Debug => Level::DEBUG,
            LoggingLevel::Info => Level::INFO,
            LoggingLevel::Warn => Level::WARN,
            LoggingLevel::Error => Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_weekly_default_name() {
        let args = RootArgs::try_parse_from(["spotify2tidal", "discover-weekly"]).unwrap();
        let Command::DiscoverWeekly { name } = args.command else {
            panic!("unexpected command: {:?}", args.command);
        };
        assert_eq!(name, "Discover Weekly");
    }

    #[test]
    fn test_global_flags() {
        let args = RootArgs::try_parse_from([
            "spotify2tidal",
            "--report",
            "report.json",
            "--minify",
            "--logging",
            "debug",
            "--tidal-device-login",
            "all",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::All));
        assert!(args.minify);
        assert!(args.tidal.tidal_device_login);
        assert_eq!(args.report, Some(PathBuf::from("report.json")));
    }

    #[test]
    fn test_minify_requires_report() {
        assert!(RootArgs::try_parse_from(["spotify2tidal", "--minify", "albums"]).is_err());
    }
}
