use std::fmt;

use async_trait::async_trait;
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};

pub type DynSourceLibrary = Box<dyn SourceLibrary + Send + Sync>;
pub type DynDestinationCatalog = Box<dyn DestinationCatalog + Send + Sync>;

/// Read side of the sync: the library we copy from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceLibrary {
    /// Playlists owned by the user, service-curated ones excluded
    async fn list_own_playlists(&self) -> Result<Vec<PlaylistRef>>;
    async fn list_saved_albums(&self) -> Result<Vec<Album>>;
    async fn list_saved_artists(&self) -> Result<Vec<Artist>>;
    async fn list_saved_tracks(&self) -> Result<Vec<Track>>;
    async fn get_weekly_discovery_playlist(&self) -> Result<PlaylistRef>;
    async fn list_tracks(&self, playlist: &PlaylistRef) -> Result<Vec<Track>>;
}

/// Raw write side of the sync: what the destination service lets us do.
///
/// Matching and not-found handling live in
/// [`DestinationLibrary`](crate::destination::DestinationLibrary), on top of
/// these calls.
#[async_trait]
pub trait DestinationCatalog {
    async fn search(&self, kind: ItemKind, query: &str) -> Result<Vec<CatalogEntry>>;
    async fn own_playlists(&self) -> Result<Vec<PlaylistRef>>;
    async fn create_playlist(&self, name: &str) -> Result<String>;
    async fn delete_playlist(&self, playlist_id: &str) -> Result<()>;
    async fn insert_track(&self, playlist_id: &str, track_id: &str, index: usize) -> Result<()>;
    async fn add_favorite(&self, kind: ItemKind, id: &str) -> Result<()>;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Track,
    Album,
    Artist,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Artist => "artist",
        };
        write!(f, "{}", s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef {
    pub id: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<Track>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub name: String,
    pub artist_name: String,
}

impl Track {
    pub fn new(name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist_name: artist_name.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub name: String,
    pub artist_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    pub name: String,
}

/// A search hit on the destination service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    /// Main artist, `None` for artist entries
    pub artist_name: Option<String>,
}

/// Result of a resolve-then-write call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Added,
    NotFound,
}
