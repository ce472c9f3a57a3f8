use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpotifyToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SpotifyUserResponse {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SpotifyPageResponse<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

impl<T> SpotifyPageResponse<T> {
    pub fn merge(&mut self, other: Self) {
        self.items.extend(other.items);
        self.next = other.next;
    }
}

#[derive(Deserialize, Debug)]
pub struct SpotifyFollowedArtistsResponse {
    pub artists: SpotifyPageResponse<SpotifyArtistResponse>,
}

#[derive(Deserialize, Debug)]
pub struct SpotifyPlaylistResponse {
    pub id: String,
    pub name: String,
    pub owner: Option<SpotifyOwnerResponse>,
}

#[derive(Deserialize, Debug)]
pub struct SpotifyOwnerResponse {
    pub id: String,
}

#[derive(Deserialize, Debug)]
pub struct SpotifySavedAlbumResponse {
    pub album: SpotifyAlbumResponse,
}

#[derive(Deserialize, Debug)]
pub struct SpotifyAlbumResponse {
    pub name: String,
    pub artists: Vec<SpotifyArtistResponse>,
}

/// Entry of a playlist or of the saved tracks, `track` is null for
/// tracks that are no longer available
#[derive(Deserialize, Debug)]
pub struct SpotifyTrackItemResponse {
    pub track: Option<SpotifyTrackResponse>,
}

#[derive(Deserialize, Debug)]
pub struct SpotifyTrackResponse {
    pub name: String,
    pub artists: Vec<SpotifyArtistResponse>,
}

#[derive(Deserialize, Debug)]
pub struct SpotifyArtistResponse {
    pub name: String,
}
