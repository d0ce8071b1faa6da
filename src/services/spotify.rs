//! Spotify Web API client
//!
//! Authenticates with a long-lived refresh token. Access tokens are cached
//! in memory and on disk so restarts don't always hit the accounts service.

use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{MusicService, PlayOutcome};
use crate::config::Config;
use crate::{Error, Result};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

/// Tokens this close to expiry are refreshed early
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Cached access token
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - ChronoDuration::seconds(EXPIRY_MARGIN_SECS) > now
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<Page<Track>>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Track {
    name: String,
    uri: String,
    #[serde(default)]
    artists: Vec<Artist>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    devices: Vec<Device>,
}

#[derive(Debug, Deserialize)]
struct Device {
    id: Option<String>,
    #[serde(default)]
    is_active: bool,
}

/// Spotify playback client
pub struct SpotifyClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cache_path: PathBuf,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    /// Build a client when all Spotify credentials are configured
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let keys = &config.api_keys;
        let (Some(client_id), Some(client_secret), Some(refresh_token)) = (
            &keys.spotify_client_id,
            &keys.spotify_client_secret,
            &keys.spotify_refresh_token,
        ) else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Some(Self {
            client,
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
            refresh_token: refresh_token.clone(),
            cache_path: config.cache_dir.join("spotify_token.json"),
            token: Mutex::new(None),
        }))
    }

    /// Get a valid access token, refreshing when needed
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        let now = Utc::now();

        if guard.is_none() {
            *guard = self.read_cached_token();
        }
        if let Some(token) = guard.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.access_token.clone());
        }

        let token = self.refresh().await?;
        self.write_cached_token(&token);
        let access = token.access_token.clone();
        *guard = Some(token);
        Ok(access)
    }

    async fn refresh(&self) -> Result<CachedToken> {
        tracing::debug!("refreshing Spotify access token");

        let credentials = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .client
            .post(TOKEN_URL)
            .header("Authorization", format!("Basic {credentials}"))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Music(format!(
                "token refresh failed: {status} - {body}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in),
        })
    }

    fn read_cached_token(&self) -> Option<CachedToken> {
        let content = std::fs::read_to_string(&self.cache_path).ok()?;
        match serde_json::from_str(&content) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable Spotify token cache");
                None
            }
        }
    }

    fn write_cached_token(&self, token: &CachedToken) {
        let result = serde_json::to_string(token)
            .map_err(Error::from)
            .and_then(|json| std::fs::write(&self.cache_path, json).map_err(Error::from));
        if let Err(e) = result {
            tracing::warn!(
                path = %self.cache_path.display(),
                error = %e,
                "failed to cache Spotify token"
            );
        }
    }

    /// Send a player command; any 2xx is success
    async fn player(&self, method: reqwest::Method, path: &str) -> Result<()> {
        let token = self.access_token().await?;
        let response = self
            .client
            .request(method, format!("{API_BASE}/me/player/{path}"))
            .bearer_auth(token)
            .header("Content-Length", "0")
            .send()
            .await?;

        check(response, path).await
    }

    async fn search_track(&self, token: &str, query: &str) -> Result<Option<Track>> {
        let response = self
            .client
            .get(format!("{API_BASE}/search"))
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track"), ("limit", "5")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Music(format!("search failed: {status} - {body}")));
        }

        let results: SearchResponse = response.json().await?;
        Ok(results.tracks.and_then(|page| page.items.into_iter().next()))
    }

    async fn pick_device(&self, token: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{API_BASE}/me/player/devices"))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Music(format!("device lookup failed: {status}")));
        }

        let devices: DevicesResponse = response.json().await?;
        Ok(choose_device(devices.devices))
    }
}

/// Prefer the active device, else the first one listed
fn choose_device(devices: Vec<Device>) -> Option<String> {
    let active = devices.iter().position(|d| d.is_active).unwrap_or(0);
    devices.into_iter().nth(active).and_then(|d| d.id)
}

async fn check(response: reqwest::Response, what: &str) -> Result<()> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Music(format!("{what} failed: {status} - {body}")))
}

#[async_trait]
impl MusicService for SpotifyClient {
    async fn play_by_query(&self, query: &str) -> Result<PlayOutcome> {
        let token = self.access_token().await?;

        let Some(track) = self.search_track(&token, query).await? else {
            tracing::info!(query, "no Spotify match");
            return Ok(PlayOutcome::NotFound);
        };

        let Some(device_id) = self.pick_device(&token).await? else {
            return Ok(PlayOutcome::NoDevice);
        };

        let response = self
            .client
            .put(format!("{API_BASE}/me/player/play"))
            .bearer_auth(&token)
            .query(&[("device_id", device_id.as_str())])
            .json(&serde_json::json!({ "uris": [track.uri] }))
            .send()
            .await?;
        check(response, "play").await?;

        let artist = track
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default();
        tracing::info!(track = %track.name, artist = %artist, "started playback");

        Ok(PlayOutcome::Playing {
            track: track.name,
            artist,
        })
    }

    async fn pause(&self) -> Result<()> {
        self.player(reqwest::Method::PUT, "pause").await
    }

    async fn resume(&self) -> Result<()> {
        self.player(reqwest::Method::PUT, "play").await
    }

    async fn next(&self) -> Result<()> {
        self.player(reqwest::Method::POST, "next").await
    }

    async fn previous(&self) -> Result<()> {
        self.player(reqwest::Method::POST, "previous").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, is_active: bool) -> Device {
        Device {
            id: Some(id.to_string()),
            is_active,
        }
    }

    #[test]
    fn test_choose_device() {
        assert_eq!(
            choose_device(vec![device("a", false), device("b", true)]).as_deref(),
            Some("b")
        );
        assert_eq!(
            choose_device(vec![device("a", false), device("b", false)]).as_deref(),
            Some("a")
        );
        assert_eq!(choose_device(Vec::new()), None);
    }

    #[test]
    fn test_token_freshness() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "t".to_string(),
            expires_at: now + ChronoDuration::seconds(3600),
        };
        assert!(token.is_fresh(now));

        let stale = CachedToken {
            expires_at: now + ChronoDuration::seconds(30),
            ..token
        };
        assert!(!stale.is_fresh(now));
    }

    #[test]
    fn test_search_response_shape() {
        let json = r#"{"tracks":{"items":[{"name":"Bohemian Rhapsody","uri":"spotify:track:1","artists":[{"name":"Queen"}]}]}}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let track = parsed.tracks.unwrap().items.into_iter().next().unwrap();
        assert_eq!(track.name, "Bohemian Rhapsody");
        assert_eq!(track.artists[0].name, "Queen");
    }
}
