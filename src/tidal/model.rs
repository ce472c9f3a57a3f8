use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TidalDeviceRes {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri_complete: String,
    pub expires_in: u64,
    pub interval: u64,
}

#[derive(Serialize, Debug)]
pub struct TidalReqToken<'a> {
    pub client_id: &'a str,
    pub device_code: &'a str,
    pub grant_type: &'a str,
    pub scope: &'a str,
}

#[derive(Serialize, Debug)]
pub struct TidalRefreshReq<'a> {
    pub client_id: &'a str,
    /// Only confidential clients have one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<&'a str>,
    pub grant_type: &'a str,
    pub refresh_token: &'a str,
    pub scope: &'a str,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TidalOAuthToken {
    pub scope: String,
    pub token_type: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

#[derive(Deserialize, Debug)]
pub struct TidalOAuthRefresh {
    pub access_token: String,
    pub expires_in: u64,
    pub scope: String,
}

#[derive(Deserialize, Debug)]
pub struct TidalOAuthError {
    pub error: String,
}

/// Returned by the username/password login and by `GET /sessions`
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TidalSessionResponse {
    pub session_id: Option<String>,
    pub user_id: u64,
    pub country_code: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TidalPageResponse<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total_number_of_items: Option<usize>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TidalPlaylistResponse {
    pub uuid: String,
    pub title: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct TidalSearchResponse {
    #[serde(default)]
    pub tracks: Option<TidalPageResponse<TidalTrackResponse>>,
    #[serde(default)]
    pub albums: Option<TidalPageResponse<TidalAlbumResponse>>,
    #[serde(default)]
    pub artists: Option<TidalPageResponse<TidalArtistResponse>>,
}

#[derive(Deserialize, Debug)]
pub struct TidalTrackResponse {
    pub id: u64,
    pub title: String,
    /// Main artist, older payloads only carry `artists`
    pub artist: Option<TidalArtistResponse>,
    #[serde(default)]
    pub artists: Vec<TidalArtistResponse>,
}

#[derive(Deserialize, Debug)]
pub struct TidalAlbumResponse {
    pub id: u64,
    pub title: String,
    pub artist: Option<TidalArtistResponse>,
    #[serde(default)]
    pub artists: Vec<TidalArtistResponse>,
}

#[derive(Deserialize, Debug)]
pub struct TidalArtistResponse {
    pub id: u64,
    pub name: String,
}
