use color_eyre::eyre::{Error, Result, eyre};
use tracing::error;

use super::model::{
    TidalAlbumResponse, TidalArtistResponse, TidalPageResponse, TidalPlaylistResponse,
    TidalSearchResponse, TidalTrackResponse,
};
use crate::music_api::{CatalogEntry, ItemKind, PlaylistRef};

// multiples

impl TidalSearchResponse {
    /// Search hits of one kind, in the order the service ranked them
    pub fn into_entries(self, kind: ItemKind) -> Vec<CatalogEntry> {
        match kind {
            ItemKind::Track => convert_items(self.tracks),
            ItemKind::Album => convert_items(self.albums),
            ItemKind::Artist => convert_items(self.artists),
        }
    }
}

fn convert_items<T>(page: Option<TidalPageResponse<T>>) -> Vec<CatalogEntry>
where
    T: TryInto<CatalogEntry, Error = Error>,
{
    let Some(page) = page else {
        return vec![];
    };
    let mut res = vec![];
    for item in page.items {
        match item.try_into() {
            Ok(e) => res.push(e),
            Err(e) => error!("failed to parse search result, skipping it: {}", e),
        }
    }
    res
}

// singles

impl TryInto<PlaylistRef> for TidalPlaylistResponse {
    type Error = Error;

    fn try_into(self) -> Result<PlaylistRef, Self::Error> {
        Ok(PlaylistRef {
            id: self.uuid,
            name: self.title,
        })
    }
}

fn main_artist(
    artist: Option<TidalArtistResponse>,
    artists: Vec<TidalArtistResponse>,
) -> Option<TidalArtistResponse> {
    artist.or_else(|| artists.into_iter().next())
}

impl TryInto<CatalogEntry> for TidalTrackResponse {
    type Error = Error;

    fn try_into(self) -> Result<CatalogEntry, Self::Error> {
        let artist = main_artist(self.artist, self.artists)
            .ok_or_else(|| eyre!("{}: missing track artist", self.title))?;
        Ok(CatalogEntry {
            id: self.id.to_string(),
            name: self.title,
            artist_name: Some(artist.name),
        })
    }
}

impl TryInto<CatalogEntry> for TidalAlbumResponse {
    type Error = Error;

    fn try_into(self) -> Result<CatalogEntry, Self::Error> {
        let artist = main_artist(self.artist, self.artists)
            .ok_or_else(|| eyre!("{}: missing album artist", self.title))?;
        Ok(CatalogEntry {
            id: self.id.to_string(),
            name: self.title,
            artist_name: Some(artist.name),
        })
    }
}

impl TryInto<CatalogEntry> for TidalArtistResponse {
    type Error = Error;

    fn try_into(self) -> Result<CatalogEntry, Self::Error> {
        Ok(CatalogEntry {
            id: self.id.to_string(),
            name: self.name,
            artist_name: None,
        })
    }
}
