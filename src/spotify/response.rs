use color_eyre::eyre::{Error, Result, eyre};
use tracing::debug;

use super::model::{
    SpotifyArtistResponse, SpotifyPlaylistResponse, SpotifySavedAlbumResponse,
    SpotifyTrackItemResponse, SpotifyTrackResponse,
};
use crate::music_api::{Album, Artist, PlaylistRef, Track};

/// Owner id of the playlists Spotify generates for the user
const CURATOR_ID: &str = "spotify";

/// Convert every item, dropping the ones that cannot be represented
pub fn collect_valid<S, D>(items: Vec<S>) -> Vec<D>
where
    S: TryInto<D, Error = Error>,
{
    let mut res = vec![];
    for item in items {
        match item.try_into() {
            Ok(d) => res.push(d),
            Err(e) => debug!("skipping item in spotify response: {}", e),
        }
    }
    res
}

/// Playlists from `/me/playlists` that the user owns or follows, minus the
/// service-curated ones
pub fn own_playlists(items: Vec<SpotifyPlaylistResponse>) -> Vec<PlaylistRef> {
    let items: Vec<SpotifyPlaylistResponse> = items
        .into_iter()
        .filter(|p| !p.owner.as_ref().is_some_and(|o| o.id == CURATOR_ID))
        .collect();
    collect_valid(items)
}

impl TryInto<PlaylistRef> for SpotifyPlaylistResponse {
    type Error = Error;

    fn try_into(self) -> Result<PlaylistRef, Self::Error> {
        Ok(PlaylistRef {
            id: self.id,
            name: self.name,
        })
    }
}

impl TryInto<Track> for SpotifyTrackResponse {
    type Error = Error;

    fn try_into(self) -> Result<Track, Self::Error> {
        let Some(artist) = self.artists.into_iter().next() else {
            return Err(eyre!("{}: track has no artist", self.name));
        };
        Ok(Track {
            name: self.name,
            artist_name: artist.name,
        })
    }
}

impl TryInto<Track> for SpotifyTrackItemResponse {
    type Error = Error;

    fn try_into(self) -> Result<Track, Self::Error> {
        self.track
            .ok_or_else(|| eyre!("unavailable track"))?
            .try_into()
    }
}

impl TryInto<Album> for SpotifySavedAlbumResponse {
    type Error = Error;

    fn try_into(self) -> Result<Album, Self::Error> {
        let Some(artist) = self.album.artists.into_iter().next() else {
            return Err(eyre!("{}: album has no artist", self.album.name));
        };
        Ok(Album {
            name: self.album.name,
            artist_name: artist.name,
        })
    }
}

impl TryInto<Artist> for SpotifyArtistResponse {
    type Error = Error;

    fn try_into(self) -> Result<Artist, Self::Error> {
        Ok(Artist { name: self.name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::model::{SpotifyFollowedArtistsResponse, SpotifyPageResponse};

    #[test]
    fn test_playlist_tracks_skip_unavailable() {
        let json = r#"{
            "items": [
                {"track": {"name": "Song A", "artists": [{"name": "Artist X"}, {"name": "Feat"}]}},
                {"track": null},
                {"track": {"name": "Local file", "artists": []}},
                {"track": {"name": "Song B", "artists": [{"name": "Artist Y"}]}}
            ],
            "next": null
        }"#;
        let page: SpotifyPageResponse<SpotifyTrackItemResponse> =
            serde_json::from_str(json).unwrap();
        let tracks: Vec<Track> = collect_valid(page.items);

        assert_eq!(
            tracks,
            vec![
                Track::new("Song A", "Artist X"),
                Track::new("Song B", "Artist Y"),
            ]
        );
    }

    #[test]
    fn test_own_playlists_exclude_curated() {
        let json = r#"{
            "items": [
                {"id": "1", "name": "Road Trip", "owner": {"id": "some_user"}},
                {"id": "2", "name": "Discover Weekly", "owner": {"id": "spotify"}},
                {"id": "3", "name": "Shared", "owner": {"id": "friend"}}
            ],
            "next": null
        }"#;
        let page: SpotifyPageResponse<SpotifyPlaylistResponse> =
            serde_json::from_str(json).unwrap();
        let names: Vec<String> = own_playlists(page.items)
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["Road Trip", "Shared"]);
    }

    #[test]
    fn test_saved_albums_use_first_artist() {
        let json = r#"{
            "items": [
                {"added_at": "2020-01-01T00:00:00Z", "album": {"name": "Abbey Road", "artists": [{"name": "The Beatles"}]}}
            ],
            "next": null
        }"#;
        let page: SpotifyPageResponse<SpotifySavedAlbumResponse> =
            serde_json::from_str(json).unwrap();
        let albums: Vec<Album> = collect_valid(page.items);

        assert_eq!(albums[0].name, "Abbey Road");
        assert_eq!(albums[0].artist_name, "The Beatles");
    }

    #[test]
    fn test_followed_artists_page_is_nested() {
        let json = r#"{
            "artists": {
                "items": [{"name": "Radiohead"}],
                "next": "https://api.spotify.com/v1/me/following?type=artist&after=abc",
                "cursors": {"after": "abc"}
            }
        }"#;
        let res: SpotifyFollowedArtistsResponse = serde_json::from_str(json).unwrap();

        assert!(res.artists.next.is_some());
        let artists: Vec<Artist> = collect_valid(res.artists.items);
        assert_eq!(artists[0].name, "Radiohead");
    }
}
