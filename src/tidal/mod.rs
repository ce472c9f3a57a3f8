mod model;
mod response;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use color_eyre::Result;
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, warn};

use self::model::{
    TidalDeviceRes, TidalOAuthError, TidalOAuthRefresh, TidalOAuthToken, TidalPageResponse,
    TidalPlaylistResponse, TidalRefreshReq, TidalReqToken, TidalSearchResponse,
    TidalSessionResponse,
};
use crate::ConfigArgs;
use crate::error::SyncError;
use crate::music_api::{CatalogEntry, DestinationCatalog, ItemKind, PlaylistRef};

/// How to open a Tidal session
#[derive(Debug, Clone)]
pub enum TidalLogin {
    /// Direct login, `token` is the API token of the client application
    Password {
        username: String,
        password: String,
        token: String,
    },
    /// Device authorization confirmed by the user in the browser
    Device {
        client_id: String,
        client_secret: Option<String>,
    },
}

pub struct TidalApi {
    client: reqwest::Client,
    config: ConfigArgs,
    user_id: u64,
    country_code: String,
}

#[derive(Debug)]
enum HttpMethod<'a> {
    Get(&'a serde_json::Value),
    Post(&'a serde_json::Value),
    Delete,
}

impl TidalApi {
    const API_URL: &'static str = "https://api.tidal.com/v1";

    const AUTH_URL: &'static str = "https://auth.tidal.com/v1/oauth2/device_authorization";
    const TOKEN_URL: &'static str = "https://auth.tidal.com/v1/oauth2/token";
    const SCOPE: &'static str = "r_usr w_usr w_sub";
    const DEVICE_GRANT: &'static str = "urn:ietf:params:oauth:grant-type:device_code";

    const PAGE_LIMIT: usize = 50;
    const SEARCH_LIMIT: usize = 50;

    pub async fn new(
        login: TidalLogin,
        oauth_token_path: PathBuf,
        clear_cache: bool,
        config: ConfigArgs,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let session = match &login {
            TidalLogin::Password {
                username,
                password,
                token,
            } => {
                info!("logging in to tidal as {}", username);
                let session = Self::login_password(username, password, token).await?;
                let session_id = session
                    .session_id
                    .clone()
                    .ok_or_else(|| SyncError::auth("tidal", "login returned no session id"))?;
                headers.insert("x-tidal-sessionid", session_id.parse()?);
                session
            }
            TidalLogin::Device {
                client_id,
                client_secret,
            } => {
                let client_secret = client_secret.as_deref();
                let token = if !oauth_token_path.exists() || clear_cache {
                    info!("requesting new tidal token");
                    Self::request_token(client_id, client_secret).await?
                } else {
                    info!("refreshing tidal token");
                    match Self::refresh_token(client_id, client_secret, &oauth_token_path).await {
                        Ok(token) => token,
                        Err(e) => {
                            warn!("failed to refresh cached tidal token, requesting a new one: {}", e);
                            Self::request_token(client_id, client_secret).await?
                        }
                    }
                };
                let mut file = std::fs::File::create(&oauth_token_path)?;
                serde_json::to_writer(&mut file, &token)?;

                headers.insert(
                    "authorization",
                    format!("Bearer {}", token.access_token).parse()?,
                );
                Self::current_session(&headers).await?
            }
        };

        let mut client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers);
        if let Some(proxy) = &config.proxy {
            client = client
                .proxy(reqwest::Proxy::all(proxy)?)
                .danger_accept_invalid_certs(true)
        }
        let client = client.build()?;

        info!(
            "logged in to tidal, user {} ({})",
            session.user_id, session.country_code
        );
        Ok(Self {
            client,
            config,
            user_id: session.user_id,
            country_code: session.country_code,
        })
    }

    async fn login_password(
        username: &str,
        password: &str,
        token: &str,
    ) -> Result<TidalSessionResponse> {
        let client = reqwest::Client::new();
        let params = json!({
            "username": username,
            "password": password,
        });
        let res = client
            .post(format!("{}/login/username", Self::API_URL))
            .header("X-Tidal-Token", token)
            .form(&params)
            .send()
            .await?;
        let res = check_login(res).await?;
        Ok(res.json().await?)
    }

    async fn current_session(headers: &HeaderMap) -> Result<TidalSessionResponse> {
        let client = reqwest::Client::new();
        let res = client
            .get(format!("{}/sessions", Self::API_URL))
            .headers(headers.clone())
            .send()
            .await?;
        let res = check_login(res).await?;
        Ok(res.json().await?)
    }

    async fn request_token(client_id: &str, client_secret: Option<&str>) -> Result<TidalOAuthToken> {
        let client = reqwest::Client::new();
        let params = json!({
            "client_id": client_id,
            "scope": Self::SCOPE,
        });
        let res = client.post(Self::AUTH_URL).form(&params).send().await?;
        let res = check_login(res).await?;
        let device_res: TidalDeviceRes = res.json().await?;

        let url = if device_res.verification_uri_complete.starts_with("https://") {
            device_res.verification_uri_complete.clone()
        } else {
            format!("https://{}", device_res.verification_uri_complete)
        };
        info!(
            "please authorize the app in your browser: {} (code {})",
            url, device_res.user_code
        );
        if let Err(e) = webbrowser::open(&url) {
            warn!("failed to open the browser: {}", e);
        }

        let auth_token = TidalReqToken {
            client_id,
            device_code: &device_res.device_code,
            grant_type: Self::DEVICE_GRANT,
            scope: Self::SCOPE,
        };
        let interval = device_res.interval.max(1);
        poll_device_token(
            || Self::poll_token(&client, &auth_token, client_secret),
            Duration::from_secs(interval),
            device_res.expires_in / interval,
        )
        .await
    }

    /// One token request, `None` while the user has not confirmed yet
    async fn poll_token(
        client: &reqwest::Client,
        auth_token: &TidalReqToken<'_>,
        client_secret: Option<&str>,
    ) -> Result<Option<TidalOAuthToken>> {
        let mut req = client.post(Self::TOKEN_URL).form(auth_token);
        if let Some(secret) = client_secret {
            req = req.basic_auth(auth_token.client_id, Some(secret));
        }
        let res = req.send().await?;
        if res.status() == StatusCode::BAD_REQUEST {
            let err: TidalOAuthError = res.json().await?;
            check_pending(err)?;
            return Ok(None);
        }
        let res = check_login(res).await?;
        let token: TidalOAuthToken = res.json().await?;
        Ok(Some(token))
    }

    async fn refresh_token(
        client_id: &str,
        client_secret: Option<&str>,
        oauth_token_path: &Path,
    ) -> Result<TidalOAuthToken> {
        let client = reqwest::Client::new();
        let reader = std::fs::File::open(oauth_token_path)?;
        let mut oauth_token: TidalOAuthToken = serde_json::from_reader(reader)?;

        let params = TidalRefreshReq {
            client_id,
            client_secret,
            grant_type: "refresh_token",
            refresh_token: &oauth_token.refresh_token,
            scope: Self::SCOPE,
        };
        let res = client.post(Self::TOKEN_URL).form(&params).send().await?;
        let res = check_login(res).await?;
        let refresh_token: TidalOAuthRefresh = res.json().await?;
        oauth_token.access_token = refresh_token.access_token;
        oauth_token.expires_in = refresh_token.expires_in;
        oauth_token.scope = refresh_token.scope;
        Ok(oauth_token)
    }

    async fn paginated_request<T>(&self, url: &str, params: &serde_json::Value) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        follow_offsets(Self::PAGE_LIMIT, |offset| async move {
            let mut params = params.clone();
            params["limit"] = json!(Self::PAGE_LIMIT);
            params["offset"] = json!(offset);
            let page: TidalPageResponse<T> =
                self.make_request_json(url, &HttpMethod::Get(&params)).await?;
            Ok::<_, color_eyre::Report>(page)
        })
        .await
    }

    async fn make_request(&self, url: &str, method: &HttpMethod<'_>) -> Result<Response> {
        let request = match method {
            HttpMethod::Get(p) => self.client.get(url).query(p),
            HttpMethod::Post(b) => self.client.post(url).form(b),
            HttpMethod::Delete => self.client.delete(url),
        };
        let request = request.query(&[("countryCode", &self.country_code)]);
        debug!("tidal request: {:?} {}", method, url);
        let res = request.send().await?;
        let res = res.error_for_status()?;
        Ok(res)
    }

    async fn make_request_json<T>(&self, url: &str, method: &HttpMethod<'_>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let res = self.make_request(url, method).await?;
        let obj = if self.config.debug {
            let text = res.text().await?;
            std::fs::create_dir_all("debug")?;
            std::fs::write("debug/tidal_last_res.json", &text)?;
            serde_json::from_str(&text)?
        } else {
            res.json().await?
        };
        Ok(obj)
    }
}

/// Map a failed login response to an authentication error
async fn check_login(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(login_error(status, &body).into())
}

fn login_error(status: StatusCode, body: &str) -> SyncError {
    SyncError::auth("tidal", format!("{}: {}", status, body))
}

/// `Ok` while the device authorization is still waiting for the user
fn check_pending(err: TidalOAuthError) -> Result<(), SyncError> {
    match err.error.as_str() {
        "authorization_pending" | "slow_down" => Ok(()),
        _ => Err(SyncError::auth("tidal", err.error)),
    }
}

/// Poll until the user confirmed the device authorization
async fn poll_device_token<F, Fut>(
    mut poll: F,
    interval: Duration,
    max_attempts: u64,
) -> Result<TidalOAuthToken>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<TidalOAuthToken>>>,
{
    for _ in 0..max_attempts.max(1) {
        if let Some(token) = poll().await? {
            return Ok(token);
        }
        tokio::time::sleep(interval).await;
    }
    Err(SyncError::auth("tidal", "device authorization expired").into())
}

/// Fetch pages of `limit` items by offset until the reported total (or a
/// short page) is reached.
async fn follow_offsets<T, F, Fut>(limit: usize, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<TidalPageResponse<T>>>,
{
    let mut items = vec![];
    loop {
        let page = fetch(items.len()).await?;
        let count = page.items.len();
        items.extend(page.items);
        let done = match page.total_number_of_items {
            Some(total) => items.len() >= total,
            None => count < limit,
        };
        if done || count == 0 {
            break;
        }
    }
    Ok(items)
}

#[async_trait]
impl DestinationCatalog for TidalApi {
    async fn search(&self, kind: ItemKind, query: &str) -> Result<Vec<CatalogEntry>> {
        let url = format!("{}/search", Self::API_URL);
        let types = match kind {
            ItemKind::Track => "TRACKS",
            ItemKind::Album => "ALBUMS",
            ItemKind::Artist => "ARTISTS",
        };
        let params = json!({
            "query": query,
            "types": types,
            "limit": Self::SEARCH_LIMIT,
        });
        let res: TidalSearchResponse = self
            .make_request_json(&url, &HttpMethod::Get(&params))
            .await?;
        Ok(res.into_entries(kind))
    }

    async fn own_playlists(&self) -> Result<Vec<PlaylistRef>> {
        let url = format!("{}/users/{}/playlists", Self::API_URL, self.user_id);
        let items: Vec<TidalPlaylistResponse> = self.paginated_request(&url, &json!({})).await?;
        items
            .into_iter()
            .map(TryInto::<PlaylistRef>::try_into)
            .collect()
    }

    async fn create_playlist(&self, name: &str) -> Result<String> {
        let url = format!("{}/users/{}/playlists", Self::API_URL, self.user_id);
        let params = json!({
            "title": name,
            "description": "",
        });
        let res: TidalPlaylistResponse = self
            .make_request_json(&url, &HttpMethod::Post(&params))
            .await?;
        Ok(res.uuid)
    }

    async fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        let url = format!("{}/playlists/{}", Self::API_URL, playlist_id);
        self.make_request(&url, &HttpMethod::Delete).await?;
        Ok(())
    }

    async fn insert_track(&self, playlist_id: &str, track_id: &str, index: usize) -> Result<()> {
        let url = format!("{}/playlists/{}/items", Self::API_URL, playlist_id);
        let params = json!({
            "trackIds": track_id,
            "toIndex": index,
        });
        // the wildcard precondition makes tidal reject concurrent duplicate inserts
        let res = self
            .client
            .post(url)
            .header("If-None-Match", "*")
            .query(&[("countryCode", &self.country_code)])
            .form(&params)
            .send()
            .await?;
        res.error_for_status()?;
        Ok(())
    }

    async fn add_favorite(&self, kind: ItemKind, id: &str) -> Result<()> {
        let (collection, field) = match kind {
            ItemKind::Track => ("tracks", "trackIds"),
            ItemKind::Album => ("albums", "albumIds"),
            ItemKind::Artist => ("artists", "artistIds"),
        };
        let url = format!(
            "{}/users/{}/favorites/{}",
            Self::API_URL,
            self.user_id,
            collection
        );
        let mut params = json!({});
        params[field] = json!(id);
        self.make_request(&url, &HttpMethod::Post(&params)).await?;
        Ok(())
    }
}
