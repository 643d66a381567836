use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, Serialize)]
pub struct NowPlaying {
    pub song_id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub cover: Option<String>,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub position_updated_at_ms: Option<u64>,
    pub is_playing: bool,
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    song_id: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    album: Option<String>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    position: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    position_updated_at: Option<u64>,
}

fn secs_to_ms(secs: Option<f64>) -> u64 {
    secs.filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| (s * 1000.0) as u64)
        .unwrap_or(0)
}

fn id_string(id: Option<serde_json::Value>) -> String {
    match id {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Read the current playback snapshot from the player API. `Ok(None)` means
/// the player is up but nothing is playing; `Err` means it is unreachable.
pub async fn now_playing(
    client: &reqwest::Client,
    base: &str,
) -> Result<Option<NowPlaying>, String> {
    let resp = client
        .get(format!("{base}/api"))
        .query(&[("action", "status")])
        .send()
        .await
        .map_err(|e| format!("player not reachable: {e}"))?;

    if !resp.status().is_success() {
        return Err(format!("player returned HTTP {}", resp.status()));
    }

    let data: StatusResponse = resp
        .json()
        .await
        .map_err(|e| format!("bad status response: {e}"))?;

    let song_id = id_string(data.song_id);
    if song_id.is_empty() {
        return Ok(None);
    }

    Ok(Some(NowPlaying {
        song_id,
        title: data.title.unwrap_or_else(|| "unknown".into()),
        artist: data.artist.unwrap_or_else(|| "unknown".into()),
        album: data.album.unwrap_or_default(),
        cover: data.cover,
        position_ms: secs_to_ms(data.position),
        duration_ms: secs_to_ms(data.duration),
        position_updated_at_ms: data.position_updated_at,
        is_playing: data.state.as_deref() == Some("playing"),
    }))
}

/// Drift-adjusted position for the progress display, clamped to the track
/// length. The user lyric offset does not apply here.
pub fn estimated_position_ms(np: &NowPlaying, now_ms: u64) -> u64 {
    let instant = crate::sync::current_instant_ms(np, 0, now_ms).max(0) as u64;
    if np.duration_ms > 0 {
        instant.min(np.duration_ms)
    } else {
        instant
    }
}

pub fn fmt_time(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
