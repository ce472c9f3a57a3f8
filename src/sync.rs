use chrono::NaiveDate;
use color_eyre::eyre::Result;
use tracing::{error, info};

use crate::destination::DestinationLibrary;
use crate::music_api::{DynSourceLibrary, ItemKind, Outcome, Playlist, PlaylistRef};
use crate::report::{CollectionReport, SyncReport};
use crate::utils::{DISCOVER_WEEKLY_NAME, weekly_archive_name};

/// Drives one-way copies from the source library to the destination.
///
/// Every operation is a single forward pass. Playlists are fully replaced,
/// saved items are resolved one by one and a miss or a failed write only
/// shows up in the returned report.
pub struct SyncOrchestrator {
    source: DynSourceLibrary,
    destination: DestinationLibrary,
}

impl SyncOrchestrator {
    pub fn new(source: DynSourceLibrary, destination: DestinationLibrary) -> Self {
        Self {
            source,
            destination,
        }
    }

    pub async fn copy_all_playlists(&self) -> Result<SyncReport> {
        let playlists = self.source.list_own_playlists().await?;
        info!("found {} playlists on the source", playlists.len());

        let mut report = SyncReport::default();
        for playlist in playlists.iter() {
            report.push(self.copy_playlist(playlist, &playlist.name).await?);
        }
        Ok(report)
    }

    /// Copy the discovery playlist under `target_name`, "Discover Weekly" by default
    pub async fn copy_weekly_discovery(&self, target_name: Option<&str>) -> Result<SyncReport> {
        let playlist = self.source.get_weekly_discovery_playlist().await?;
        let target_name = target_name.unwrap_or(DISCOVER_WEEKLY_NAME);

        let mut report = SyncReport::default();
        report.push(self.copy_playlist(&playlist, target_name).await?);
        Ok(report)
    }

    /// Keep a dated copy of this week's discovery playlist
    pub async fn archive_weekly_discovery(&self, today: NaiveDate) -> Result<SyncReport> {
        let name = weekly_archive_name(today);
        self.copy_weekly_discovery(Some(&name)).await
    }

    pub async fn copy_all_saved_albums(&self) -> Result<SyncReport> {
        let albums = self.source.list_saved_albums().await?;
        info!("copying {} saved albums ...", albums.len());

        let mut collection = CollectionReport::new("saved albums");
        for album in albums.iter() {
            let res = self
                .destination
                .save_album(&album.name, &album.artist_name)
                .await;
            record_outcome(
                &mut collection,
                ItemKind::Album,
                &album.name,
                Some(&album.artist_name),
                res,
            );
        }
        Ok(single(collection))
    }

    pub async fn copy_all_saved_artists(&self) -> Result<SyncReport> {
        let artists = self.source.list_saved_artists().await?;
        info!("copying {} saved artists ...", artists.len());

        let mut collection = CollectionReport::new("saved artists");
        for artist in artists.iter() {
            let res = self.destination.save_artist(&artist.name).await;
            record_outcome(&mut collection, ItemKind::Artist, &artist.name, None, res);
        }
        Ok(single(collection))
    }

    /// Saved tracks come newest first from the source, they are favorited
    /// oldest first so the destination keeps the same recency order.
    pub async fn copy_all_saved_tracks(&self) -> Result<SyncReport> {
        let tracks = self.source.list_saved_tracks().await?;
        info!("copying {} saved tracks ...", tracks.len());

        let mut collection = CollectionReport::new("saved tracks");
        for track in tracks.iter().rev() {
            let res = self
                .destination
                .save_track(&track.name, &track.artist_name)
                .await;
            record_outcome(
                &mut collection,
                ItemKind::Track,
                &track.name,
                Some(&track.artist_name),
                res,
            );
        }
        Ok(single(collection))
    }

    /// Playlists, then saved albums, artists and tracks
    pub async fn copy_all(&self) -> Result<SyncReport> {
        let mut report = self.copy_all_playlists().await?;
        report.extend(self.copy_all_saved_albums().await?);
        report.extend(self.copy_all_saved_artists().await?);
        report.extend(self.copy_all_saved_tracks().await?);
        Ok(report)
    }

    async fn copy_playlist(&self, source: &PlaylistRef, target_name: &str) -> Result<CollectionReport> {
        // read before touching the destination so a failed read never deletes anything
        let tracks = self.source.list_tracks(source).await?;
        let playlist = Playlist {
            name: target_name.to_string(),
            tracks,
        };
        self.write_playlist(&playlist).await
    }

    /// Replace the destination playlist named like `playlist` with its found tracks
    pub async fn write_playlist(&self, playlist: &Playlist) -> Result<CollectionReport> {
        info!(
            "synchronizing playlist \"{}\" ({} tracks) ...",
            playlist.name,
            playlist.tracks.len()
        );
        let playlist_id = self.destination.create_playlist(&playlist.name, true).await?;

        let mut collection = CollectionReport::new(&playlist.name);
        let mut missing = vec![];
        // every track goes to the head of the playlist: walk backwards to keep source order
        for track in playlist.tracks.iter().rev() {
            let outcome = self
                .destination
                .add_track_to_playlist(&playlist_id, &track.name, &track.artist_name)
                .await?;
            match outcome {
                Outcome::Added => collection.added += 1,
                Outcome::NotFound => missing.push(track),
            }
        }
        for track in missing.into_iter().rev() {
            collection.record_missing(ItemKind::Track, &track.name, Some(&track.artist_name));
        }
        Ok(collection)
    }
}

fn single(collection: CollectionReport) -> SyncReport {
    let mut report = SyncReport::default();
    report.push(collection);
    report
}

fn record_outcome(
    collection: &mut CollectionReport,
    kind: ItemKind,
    name: &str,
    artist: Option<&str>,
    res: Result<Outcome>,
) {
    match res {
        Ok(Outcome::Added) => collection.added += 1,
        Ok(Outcome::NotFound) => collection.record_missing(kind, name, artist),
        Err(e) => {
            error!("failed to save {} \"{}\": {}", kind, name, e);
            collection.record_failed(kind, name, artist, e.to_string());
        }
    }
}
