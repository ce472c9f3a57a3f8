use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, eyre};
use spotify2tidal::destination::DestinationLibrary;
use spotify2tidal::error::SyncError;
use spotify2tidal::spotify::{SpotifyApi, SpotifyConfig};
use spotify2tidal::sync::SyncOrchestrator;
use spotify2tidal::tidal::{TidalApi, TidalLogin};

use crate::args::{Command, RootArgs, SpotifyArgs, TidalArgs};

pub fn config_dir(args: &RootArgs) -> Result<PathBuf> {
    let dir = match &args.config_dir {
        Some(dir) => dir.clone(),
        None => dirs::config_dir()
            .ok_or_else(|| eyre!("Could not find a config directory, use --config-dir"))?
            .join("spotify2tidal"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn spotify_config(args: &SpotifyArgs) -> Result<SpotifyConfig, SyncError> {
    let Some(client_id) = &args.spotify_client_id else {
        return Err(SyncError::Configuration("missing Spotify client id".to_string()));
    };
    let Some(client_secret) = &args.spotify_client_secret else {
        return Err(SyncError::Configuration(
            "missing Spotify client secret".to_string(),
        ));
    };
    Ok(SpotifyConfig {
        client_id: client_id.clone(),
        client_secret: client_secret.clone(),
        redirect_uri: args.spotify_redirect_uri.clone(),
        discover_weekly_id: args.spotify_discover_weekly_id.clone(),
    })
}

pub fn tidal_login(args: &TidalArgs) -> Result<TidalLogin, SyncError> {
    if args.tidal_device_login {
        let Some(client_id) = &args.tidal_client_id else {
            return Err(SyncError::Configuration(
                "missing Tidal client id for the device login".to_string(),
            ));
        };
        return Ok(TidalLogin::Device {
            client_id: client_id.clone(),
            client_secret: args.tidal_client_secret.clone(),
        });
    }
    match (&args.tidal_username, &args.tidal_password, &args.tidal_token) {
        (Some(username), Some(password), Some(token)) => Ok(TidalLogin::Password {
            username: username.clone(),
            password: password.clone(),
            token: token.clone(),
        }),
        _ => Err(SyncError::Configuration(
            "missing Tidal username, password or token (or use --tidal-device-login)"
                .to_string(),
        )),
    }
}

/// Settings only some commands need, checked before any login
pub fn check_command(command: &Command, settings: &SpotifyConfig) -> Result<(), SyncError> {
    match command {
        Command::DiscoverWeekly { .. } | Command::ArchiveDiscoverWeekly => {
            settings.discover_weekly_id()?;
        }
        _ => {}
    }
    Ok(())
}

pub async fn build_orchestrator(args: &RootArgs, config_dir: &Path) -> Result<SyncOrchestrator> {
    // check both configurations before starting any interactive login
    let settings = spotify_config(&args.spotify)?;
    let login = tidal_login(&args.tidal)?;
    check_command(&args.command, &settings)?;

    let spotify = SpotifyApi::new(
        settings,
        config_dir.join("spotify_oauth.json"),
        args.clear_cache,
        args.config.clone(),
    )
    .await?;
    let tidal = TidalApi::new(
        login,
        config_dir.join("tidal_oauth.json"),
        args.clear_cache,
        args.config.clone(),
    )
    .await?;

    Ok(SyncOrchestrator::new(
        Box::new(spotify),
        DestinationLibrary::new(Box::new(tidal)),
    ))
}
