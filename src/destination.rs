use color_eyre::eyre::Result;
use tracing::{debug, info, warn};

use crate::music_api::{CatalogEntry, DynDestinationCatalog, ItemKind, Outcome};
use crate::utils::names_match;

/// Tracks are always inserted at the head of the destination playlist
const HEAD_INDEX: usize = 0;

/// Search-based writes on top of a [`DestinationCatalog`](crate::music_api::DestinationCatalog).
///
/// Lookups scan the search results in the order the service returns them and
/// keep the first entry whose artist (or name, for artists) matches
/// case-insensitively. A miss is never an error.
pub struct DestinationLibrary {
    catalog: DynDestinationCatalog,
}

impl DestinationLibrary {
    pub fn new(catalog: DynDestinationCatalog) -> Self {
        Self { catalog }
    }

    pub async fn find_track(&self, name: &str, artist: &str) -> Result<Option<CatalogEntry>> {
        self.find_with_artist(ItemKind::Track, name, artist).await
    }

    pub async fn find_album(&self, name: &str, artist: &str) -> Result<Option<CatalogEntry>> {
        self.find_with_artist(ItemKind::Album, name, artist).await
    }

    pub async fn find_artist(&self, name: &str) -> Result<Option<CatalogEntry>> {
        let results = self.catalog.search(ItemKind::Artist, name).await?;
        Ok(results.into_iter().find(|a| names_match(&a.name, name)))
    }

    async fn find_with_artist(
        &self,
        kind: ItemKind,
        name: &str,
        artist: &str,
    ) -> Result<Option<CatalogEntry>> {
        let results = self.catalog.search(kind, name).await?;
        debug!("{} search for \"{}\" returned {} results", kind, name, results.len());
        Ok(results.into_iter().find(|e| {
            e.artist_name
                .as_deref()
                .is_some_and(|a| names_match(a, artist))
        }))
    }

    /// Create an empty playlist and return its id.
    ///
    /// With `delete_existing`, every playlist named exactly `name` is removed
    /// first.
    pub async fn create_playlist(&self, name: &str, delete_existing: bool) -> Result<String> {
        if delete_existing {
            self.delete_existing_playlist(name).await?;
        }
        let id = self.catalog.create_playlist(name).await?;
        debug!("created playlist \"{}\" ({})", name, id);
        Ok(id)
    }

    async fn delete_existing_playlist(&self, name: &str) -> Result<()> {
        for playlist in self.catalog.own_playlists().await? {
            if playlist.name == name {
                info!("deleting existing playlist \"{}\"", name);
                self.catalog.delete_playlist(&playlist.id).await?;
            }
        }
        Ok(())
    }

    pub async fn add_track_to_playlist(
        &self,
        playlist_id: &str,
        name: &str,
        artist: &str,
    ) -> Result<Outcome> {
        let Some(track) = self.find_track(name, artist).await? else {
            warn!("could not find track: {} - {}", artist, name);
            return Ok(Outcome::NotFound);
        };
        self.catalog
            .insert_track(playlist_id, &track.id, HEAD_INDEX)
            .await?;
        info!("added: {} - {}", artist, name);
        Ok(Outcome::Added)
    }

    pub async fn save_album(&self, name: &str, artist: &str) -> Result<Outcome> {
        let Some(album) = self.find_album(name, artist).await? else {
            warn!("could not find album: {} from {}", name, artist);
            return Ok(Outcome::NotFound);
        };
        self.catalog.add_favorite(ItemKind::Album, &album.id).await?;
        info!("added album: {} from {}", name, artist);
        Ok(Outcome::Added)
    }

    pub async fn save_artist(&self, name: &str) -> Result<Outcome> {
        let Some(artist) = self.find_artist(name).await? else {
            warn!("could not find artist: {}", name);
            return Ok(Outcome::NotFound);
        };
        self.catalog
            .add_favorite(ItemKind::Artist, &artist.id)
            .await?;
        info!("added artist: {}", name);
        Ok(Outcome::Added)
    }

    pub async fn save_track(&self, name: &str, artist: &str) -> Result<Outcome> {
        let Some(track) = self.find_track(name, artist).await? else {
            warn!("could not find track: {} from {}", name, artist);
            return Ok(Outcome::NotFound);
        };
        self.catalog.add_favorite(ItemKind::Track, &track.id).await?;
        info!("added track: {} from {}", name, artist);
        Ok(Outcome::Added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeCatalog;

    fn library(catalog: &FakeCatalog) -> DestinationLibrary {
        DestinationLibrary::new(Box::new(catalog.clone()))
    }

    #[tokio::test]
    async fn test_find_track_ignores_artist_case() {
        let catalog = FakeCatalog::new();
        catalog.add_track("Let It Be", "The Beatles");

        let found = library(&catalog)
            .find_track("Let It Be", "the beatles")
            .await
            .unwrap();
        assert_eq!(found.unwrap().artist_name.as_deref(), Some("The Beatles"));
    }

    #[tokio::test]
    async fn test_find_track_returns_first_artist_match() {
        let catalog = FakeCatalog::new();
        let cover = catalog.add_track("Hurt", "Johnny Cash");
        let first = catalog.add_track("Hurt", "Nine Inch Nails");
        let second = catalog.add_track("Hurt", "nine inch nails");

        let found = library(&catalog)
            .find_track("Hurt", "Nine Inch Nails")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first);
        assert_ne!(found.id, second);
        assert_ne!(found.id, cover);
    }

    #[tokio::test]
    async fn test_find_track_wrong_artist() {
        let catalog = FakeCatalog::new();
        catalog.add_track("Song A", "Artist X");

        let found = library(&catalog)
            .find_track("Song A", "Artist Y")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_artist_by_name() {
        let catalog = FakeCatalog::new();
        catalog.add_artist("Radiohead");

        let lib = library(&catalog);
        assert!(lib.find_artist("radiohead").await.unwrap().is_some());
        assert!(lib.find_artist("Radio").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_playlist_replaces_existing() {
        let catalog = FakeCatalog::new();
        let old = catalog.add_playlist("Road Trip");
        catalog.add_playlist("road trip");
        let track = catalog.add_track("Song A", "Artist X");
        catalog.playlist_tracks_mut(&old, |tracks| tracks.push("stale".to_string()));

        let lib = library(&catalog);
        let id = lib.create_playlist("Road Trip", true).await.unwrap();
        lib.add_track_to_playlist(&id, "Song A", "Artist X")
            .await
            .unwrap();

        let named: Vec<_> = catalog
            .playlists()
            .into_iter()
            .filter(|p| p.name == "Road Trip")
            .collect();
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].id, id);
        assert_eq!(catalog.tracks_of(&id), vec![track]);
        // the case-insensitive namesake is not touched
        assert!(catalog.playlists().iter().any(|p| p.name == "road trip"));
    }

    #[tokio::test]
    async fn test_create_playlist_keeps_existing() {
        let catalog = FakeCatalog::new();
        catalog.add_playlist("Road Trip");

        library(&catalog)
            .create_playlist("Road Trip", false)
            .await
            .unwrap();

        let count = catalog
            .playlists()
            .iter()
            .filter(|p| p.name == "Road Trip")
            .count();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_add_missing_track_leaves_playlist_unchanged() {
        let catalog = FakeCatalog::new();
        let existing = catalog.add_track("Song A", "Artist X");
        let lib = library(&catalog);
        let id = lib.create_playlist("Mix", false).await.unwrap();
        lib.add_track_to_playlist(&id, "Song A", "Artist X")
            .await
            .unwrap();

        let outcome = lib
            .add_track_to_playlist(&id, "Song B", "Artist Y")
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::NotFound);
        assert_eq!(catalog.tracks_of(&id), vec![existing]);
    }

    #[tokio::test]
    async fn test_add_track_inserts_at_head() {
        let catalog = FakeCatalog::new();
        let a = catalog.add_track("Song A", "Artist X");
        let b = catalog.add_track("Song B", "Artist Y");
        let lib = library(&catalog);
        let id = lib.create_playlist("Mix", false).await.unwrap();

        lib.add_track_to_playlist(&id, "Song A", "Artist X")
            .await
            .unwrap();
        lib.add_track_to_playlist(&id, "Song B", "Artist Y")
            .await
            .unwrap();
        assert_eq!(catalog.tracks_of(&id), vec![b, a]);
    }

    #[tokio::test]
    async fn test_save_favorites() {
        let catalog = FakeCatalog::new();
        let album = catalog.add_album("OK Computer", "Radiohead");
        let artist = catalog.add_artist("Radiohead");
        let track = catalog.add_track("Airbag", "Radiohead");
        let lib = library(&catalog);

        assert_eq!(
            lib.save_album("OK Computer", "radiohead").await.unwrap(),
            Outcome::Added
        );
        assert_eq!(lib.save_artist("Radiohead").await.unwrap(), Outcome::Added);
        assert_eq!(
            lib.save_track("Airbag", "Radiohead").await.unwrap(),
            Outcome::Added
        );
        assert_eq!(
            lib.save_track("Lucky", "Radiohead").await.unwrap(),
            Outcome::NotFound
        );

        assert_eq!(
            catalog.favorites(),
            vec![
                (ItemKind::Album, album),
                (ItemKind::Artist, artist),
                (ItemKind::Track, track),
            ]
        );
    }
}
