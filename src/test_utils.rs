use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use color_eyre::eyre::{Result, eyre};

use crate::music_api::{CatalogEntry, DestinationCatalog, ItemKind, PlaylistRef};

#[derive(Default)]
struct CatalogState {
    next_id: usize,
    entries: Vec<(ItemKind, CatalogEntry)>,
    playlists: Vec<(PlaylistRef, Vec<String>)>,
    favorites: Vec<(ItemKind, String)>,
    calls: usize,
    fail_favorites: bool,
}

impl CatalogState {
    fn new_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// In-memory destination service. Clones share the same state so a test can
/// hand one to the code under test and inspect the other.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_entry(&self, kind: ItemKind, name: &str, artist_name: Option<&str>) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.new_id(&kind.to_string());
        state.entries.push((
            kind,
            CatalogEntry {
                id: id.clone(),
                name: name.to_string(),
                artist_name: artist_name.map(str::to_string),
            },
        ));
        id
    }

    pub fn add_track(&self, name: &str, artist: &str) -> String {
        self.add_entry(ItemKind::Track, name, Some(artist))
    }

    pub fn add_album(&self, name: &str, artist: &str) -> String {
        self.add_entry(ItemKind::Album, name, Some(artist))
    }

    pub fn add_artist(&self, name: &str) -> String {
        self.add_entry(ItemKind::Artist, name, None)
    }

    pub fn add_playlist(&self, name: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.new_id("playlist");
        state.playlists.push((
            PlaylistRef {
                id: id.clone(),
                name: name.to_string(),
            },
            vec![],
        ));
        id
    }

    pub fn playlist_tracks_mut(&self, playlist_id: &str, f: impl FnOnce(&mut Vec<String>)) {
        let mut state = self.state.lock().unwrap();
        let (_, tracks) = state
            .playlists
            .iter_mut()
            .find(|(p, _)| p.id == playlist_id)
            .expect("unknown playlist");
        f(tracks);
    }

    pub fn fail_favorites(&self) {
        self.state.lock().unwrap().fail_favorites = true;
    }

    pub fn playlists(&self) -> Vec<PlaylistRef> {
        let state = self.state.lock().unwrap();
        state.playlists.iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn playlist_named(&self, name: &str) -> Option<PlaylistRef> {
        self.playlists().into_iter().find(|p| p.name == name)
    }

    pub fn tracks_of(&self, playlist_id: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .playlists
            .iter()
            .find(|(p, _)| p.id == playlist_id)
            .map(|(_, t)| t.clone())
            .unwrap_or_default()
    }

    pub fn favorites(&self) -> Vec<(ItemKind, String)> {
        self.state.lock().unwrap().favorites.clone()
    }

    /// Number of catalog calls made so far
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    fn record_call(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state
    }
}

#[async_trait]
impl DestinationCatalog for FakeCatalog {
    async fn search(&self, kind: ItemKind, query: &str) -> Result<Vec<CatalogEntry>> {
        let state = self.record_call();
        let query = query.to_lowercase();
        Ok(state
            .entries
            .iter()
            .filter(|(k, e)| *k == kind && e.name.to_lowercase().contains(&query))
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn own_playlists(&self) -> Result<Vec<PlaylistRef>> {
        let state = self.record_call();
        Ok(state.playlists.iter().map(|(p, _)| p.clone()).collect())
    }

    async fn create_playlist(&self, name: &str) -> Result<String> {
        let mut state = self.record_call();
        let id = state.new_id("playlist");
        state.playlists.push((
            PlaylistRef {
                id: id.clone(),
                name: name.to_string(),
            },
            vec![],
        ));
        Ok(id)
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        let mut state = self.record_call();
        let before = state.playlists.len();
        state.playlists.retain(|(p, _)| p.id != playlist_id);
        if state.playlists.len() == before {
            return Err(eyre!("404: no playlist {}", playlist_id));
        }
        Ok(())
    }

    async fn insert_track(&self, playlist_id: &str, track_id: &str, index: usize) -> Result<()> {
        let mut state = self.record_call();
        let (_, tracks) = state
            .playlists
            .iter_mut()
            .find(|(p, _)| p.id == playlist_id)
            .ok_or_else(|| eyre!("404: no playlist {}", playlist_id))?;
        let index = index.min(tracks.len());
        tracks.insert(index, track_id.to_string());
        Ok(())
    }

    async fn add_favorite(&self, kind: ItemKind, id: &str) -> Result<()> {
        let mut state = self.record_call();
        if state.fail_favorites {
            return Err(eyre!("500: favorites unavailable"));
        }
        state.favorites.push((kind, id.to_string()));
        Ok(())
    }
}
