mod model;
mod response;

use std::future::Future;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use color_eyre::eyre::{Result, eyre};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use self::model::{
    SpotifyFollowedArtistsResponse, SpotifyPageResponse, SpotifyPlaylistResponse,
    SpotifySavedAlbumResponse, SpotifyToken, SpotifyTrackItemResponse, SpotifyUserResponse,
};
use self::response::{collect_valid, own_playlists};
use crate::ConfigArgs;
use crate::error::SyncError;
use crate::music_api::{Album, Artist, PlaylistRef, SourceLibrary, Track};
use crate::utils::parse_playlist_id;

/// Credentials of the registered Spotify application
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Id or share link of the user's "Discover Weekly" playlist
    pub discover_weekly_id: Option<String>,
}

impl SpotifyConfig {
    pub fn discover_weekly_id(&self) -> Result<String, SyncError> {
        let raw = self.discover_weekly_id.as_deref().ok_or_else(|| {
            SyncError::Configuration("no discover weekly playlist id set".to_string())
        })?;
        parse_playlist_id(raw).ok_or_else(|| {
            SyncError::Configuration(format!("invalid discover weekly playlist id: {}", raw))
        })
    }
}

pub struct SpotifyApi {
    client: reqwest::Client,
    settings: SpotifyConfig,
    config: ConfigArgs,
    oauth_token_path: PathBuf,
    token: RwLock<SpotifyToken>,
}

impl SpotifyApi {
    const API_URL: &'static str = "https://api.spotify.com/v1";
    const AUTH_URL: &'static str = "https://accounts.spotify.com/authorize";
    const TOKEN_URL: &'static str = "https://accounts.spotify.com/api/token";
    const SCOPES: &'static [&'static str] = &[
        "user-library-read",
        "playlist-read-private",
        "user-follow-read",
        "playlist-modify-private",
        "playlist-modify-public",
    ];
    const PAGE_LIMIT: &'static str = "50";

    pub async fn new(
        settings: SpotifyConfig,
        oauth_token_path: PathBuf,
        clear_cache: bool,
        config: ConfigArgs,
    ) -> Result<Self> {
        let mut client = reqwest::Client::builder();
        if let Some(proxy) = &config.proxy {
            client = client
                .proxy(reqwest::Proxy::all(proxy)?)
                .danger_accept_invalid_certs(true)
        }
        let client = client.build()?;

        let token = if !oauth_token_path.exists() || clear_cache {
            info!("requesting new spotify token");
            Self::request_token(&client, &settings).await?
        } else {
            info!("refreshing spotify token");
            Self::refresh_cached_token(&client, &settings, &oauth_token_path).await?
        };
        save_token(&oauth_token_path, &token)?;

        let api = Self {
            client,
            settings,
            config,
            oauth_token_path,
            token: RwLock::new(token),
        };

        let me: SpotifyUserResponse = api
            .get_json(&api.build_endpoint("/me"), &[])
            .await
            .map_err(|e| SyncError::auth("spotify", e.to_string()))?;
        info!(
            "logged in to spotify as {}",
            me.display_name.as_deref().unwrap_or(&me.id)
        );

        Ok(api)
    }

    async fn request_token(client: &reqwest::Client, settings: &SpotifyConfig) -> Result<SpotifyToken> {
        let auth_url = Self::build_authorization_url(settings)?;
        let auth_code = Self::listen_for_code(&auth_url, &settings.redirect_uri).await?;

        let params = [
            ("grant_type", "authorization_code"),
            ("code", auth_code.as_str()),
            ("redirect_uri", settings.redirect_uri.as_str()),
        ];
        let res = client
            .post(Self::TOKEN_URL)
            .basic_auth(&settings.client_id, Some(&settings.client_secret))
            .form(&params)
            .send()
            .await?;
        let res = res
            .error_for_status()
            .map_err(|e| SyncError::auth("spotify", e.to_string()))?;
        let token: SpotifyToken = res.json().await?;
        Ok(token)
    }

    async fn refresh_cached_token(
        client: &reqwest::Client,
        settings: &SpotifyConfig,
        oauth_token_path: &Path,
    ) -> Result<SpotifyToken> {
        let Some(refresh_token) = cached_refresh_token(oauth_token_path) else {
            return Self::request_token(client, settings).await;
        };
        match Self::refresh_token(client, settings, &refresh_token).await {
            Ok(token) => Ok(token),
            Err(e) => {
                warn!("failed to refresh cached spotify token, requesting a new one: {}", e);
                Self::request_token(client, settings).await
            }
        }
    }

    async fn refresh_token(
        client: &reqwest::Client,
        settings: &SpotifyConfig,
        refresh_token: &str,
    ) -> Result<SpotifyToken> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        let res = client
            .post(Self::TOKEN_URL)
            .basic_auth(&settings.client_id, Some(&settings.client_secret))
            .form(&params)
            .send()
            .await?;
        let res = res
            .error_for_status()
            .map_err(|e| SyncError::auth("spotify", e.to_string()))?;
        let mut token: SpotifyToken = res.json().await?;
        // spotify may not rotate the refresh token
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        Ok(token)
    }

    /// Get a fresh token after the current one expired
    async fn reauthenticate(&self) -> Result<()> {
        let refresh_token = self.token.read().await.refresh_token.clone();
        let token = match refresh_token {
            Some(r) => Self::refresh_token(&self.client, &self.settings, &r).await?,
            None => Self::request_token(&self.client, &self.settings).await?,
        };
        save_token(&self.oauth_token_path, &token)?;
        *self.token.write().await = token;
        Ok(())
    }

    fn build_authorization_url(settings: &SpotifyConfig) -> Result<String> {
        let scopes = Self::SCOPES.join(" ");
        let params = [
            ("response_type", "code"),
            ("scope", scopes.as_str()),
            ("client_id", settings.client_id.as_str()),
            ("redirect_uri", settings.redirect_uri.as_str()),
        ];
        Ok(Url::parse_with_params(Self::AUTH_URL, params)?.to_string())
    }

    async fn listen_for_code(auth_url: &str, redirect_uri: &str) -> Result<String> {
        let redirect = Url::parse(redirect_uri)?;
        let host = redirect
            .host_str()
            .ok_or_else(|| eyre!("redirect uri has no host: {}", redirect_uri))?;
        let port = redirect
            .port_or_known_default()
            .ok_or_else(|| eyre!("redirect uri has no port: {}", redirect_uri))?;
        let listener = TcpListener::bind((host, port)).await?;

        info!("please authorize the app in your browser");
        if let Err(e) = webbrowser::open(auth_url) {
            warn!("failed to open the browser ({}), open this url manually: {}", e, auth_url);
        }

        let (mut socket, _) = listener.accept().await?;
        let mut buffer = [0; 4096];
        let n = socket.read(&mut buffer).await?;
        let request = String::from_utf8_lossy(&buffer[..n]);
        let code = parse_callback(&request, &redirect);

        let body = match &code {
            Ok(_) => "Authorization complete, you can close this window.",
            Err(_) => "Authorization failed, check the terminal.",
        };
        let reply = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(reply.as_bytes()).await?;
        socket.shutdown().await?;

        code
    }

    fn build_endpoint(&self, path: &str) -> String {
        format!("{}{}", Self::API_URL, path)
    }

    async fn send_get(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        let access_token = self.token.read().await.access_token.clone();
        let res = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await?;
        Ok(res)
    }

    /// GET a JSON document, re-authenticating once if the token expired
    async fn get_json<T>(&self, url: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let res = send_with_reauth(
            || self.send_get(url, query),
            || self.reauthenticate(),
            |res: &Response| res.status() == StatusCode::UNAUTHORIZED,
        )
        .await?;
        let res = res.error_for_status()?;

        let obj = if self.config.debug {
            let text = res.text().await?;
            std::fs::create_dir_all("debug")?;
            std::fs::write("debug/spotify_last_res.json", &text)?;
            serde_json::from_str(&text)?
        } else {
            res.json().await?
        };
        Ok(obj)
    }

    async fn paginated_request<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.build_endpoint(path);
        let first: SpotifyPageResponse<T> = self.get_json(&url, query).await?;
        follow_pages(first, |next| async move {
            let page: SpotifyPageResponse<T> = self.get_json(&next, &[]).await?;
            Ok::<_, color_eyre::Report>(page)
        })
        .await
    }
}

/// Follow `next` links from `first` until the last page and return all items
/// in server order.
async fn follow_pages<T, F, Fut>(first: SpotifyPageResponse<T>, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<SpotifyPageResponse<T>>>,
{
    let mut response = first;
    while let Some(next) = response.next.take() {
        let page = fetch(next).await?;
        response.merge(page);
    }
    Ok(response.items)
}

/// Send a request, and if the token was rejected re-authenticate and send it
/// exactly once more.
async fn send_with_reauth<R, S, SFut, A, AFut>(
    mut send: S,
    reauth: A,
    unauthorized: impl Fn(&R) -> bool,
) -> Result<R>
where
    S: FnMut() -> SFut,
    SFut: Future<Output = Result<R>>,
    A: FnOnce() -> AFut,
    AFut: Future<Output = Result<()>>,
{
    let res = send().await?;
    if !unauthorized(&res) {
        return Ok(res);
    }
    debug!("spotify token expired, re-authenticating");
    reauth().await?;
    let res = send().await?;
    if unauthorized(&res) {
        return Err(SyncError::auth("spotify", "token still rejected after re-authentication").into());
    }
    Ok(res)
}

/// Refresh token of the cached token file, `None` if the cache is unreadable
fn cached_refresh_token(oauth_token_path: &Path) -> Option<String> {
    let cached = std::fs::read_to_string(oauth_token_path)
        .map_err(color_eyre::Report::from)
        .and_then(|text| Ok(serde_json::from_str::<SpotifyToken>(&text)?));
    match cached {
        Ok(token) => token.refresh_token,
        Err(e) => {
            warn!("ignoring unreadable spotify token cache: {}", e);
            None
        }
    }
}

/// Extract the authorization code from the raw callback request
fn parse_callback(request: &str, redirect: &Url) -> Result<String> {
    let path = request
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| eyre!("invalid spotify server callback"))?;
    let url = redirect.join(path)?;
    let mut pairs = url.query_pairs();
    if let Some((_, error)) = pairs.clone().find(|(k, _)| k == "error") {
        return Err(SyncError::auth("spotify", format!("authorization denied: {}", error)).into());
    }
    let code = pairs
        .find(|(k, _)| k == "code")
        .ok_or_else(|| eyre!("spotify server returned no authorization code"))?
        .1
        .to_string();
    Ok(code)
}

fn save_token(path: &Path, token: &SpotifyToken) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    serde_json::to_writer(&mut file, token)?;
    Ok(())
}

#[async_trait]
impl SourceLibrary for SpotifyApi {
    async fn list_own_playlists(&self) -> Result<Vec<PlaylistRef>> {
        let items: Vec<SpotifyPlaylistResponse> = self
            .paginated_request("/me/playlists", &[("limit", Self::PAGE_LIMIT)])
            .await?;
        Ok(own_playlists(items))
    }

    async fn list_saved_albums(&self) -> Result<Vec<Album>> {
        let items: Vec<SpotifySavedAlbumResponse> = self
            .paginated_request("/me/albums", &[("limit", Self::PAGE_LIMIT)])
            .await?;
        Ok(collect_valid(items))
    }

    async fn list_saved_artists(&self) -> Result<Vec<Artist>> {
        let url = self.build_endpoint("/me/following");
        let query = [("type", "artist"), ("limit", Self::PAGE_LIMIT)];
        let first: SpotifyFollowedArtistsResponse = self.get_json(&url, &query).await?;
        let items = follow_pages(first.artists, |next| async move {
            let res: SpotifyFollowedArtistsResponse = self.get_json(&next, &[]).await?;
            Ok::<_, color_eyre::Report>(res.artists)
        })
        .await?;
        Ok(collect_valid(items))
    }

    async fn list_saved_tracks(&self) -> Result<Vec<Track>> {
        let items: Vec<SpotifyTrackItemResponse> = self
            .paginated_request("/me/tracks", &[("limit", Self::PAGE_LIMIT)])
            .await?;
        Ok(collect_valid(items))
    }

    async fn get_weekly_discovery_playlist(&self) -> Result<PlaylistRef> {
        let id = self.settings.discover_weekly_id()?;
        let url = self.build_endpoint(&format!("/playlists/{}", id));
        let res: SpotifyPlaylistResponse = self.get_json(&url, &[("fields", "id,name")]).await?;
        res.try_into()
    }

    async fn list_tracks(&self, playlist: &PlaylistRef) -> Result<Vec<Track>> {
        let path = format!("/playlists/{}/tracks", playlist.id);
        let items: Vec<SpotifyTrackItemResponse> = self
            .paginated_request(&path, &[("limit", "100")])
            .await?;
        let tracks: Vec<Track> = collect_valid(items);
        debug!("\"{}\" has {} tracks", playlist.name, tracks.len());
        Ok(tracks)
    }
}
