use serde::Deserialize;

/// Raw lyric payload for one song as served by the player API. Either part
/// may be absent; `tlyric` carries the translated lines when the song has
/// any.
#[derive(Clone, Debug, Deserialize)]
pub struct LyricPayload {
    #[serde(default)]
    pub lrc: Option<String>,
    #[serde(default)]
    pub tlyric: Option<String>,
}

pub async fn fetch(
    client: &reqwest::Client,
    base: &str,
    song_id: &str,
) -> Result<LyricPayload, String> {
    let resp = client
        .get(format!("{base}/api"))
        .query(&[("action", "lyric"), ("id", song_id)])
        .send()
        .await
        .map_err(|e| format!("lyric request failed: {e}"))?;

    if !resp.status().is_success() {
        return Err(format!("lyric request returned HTTP {}", resp.status()));
    }

    resp.json().await.map_err(|e| format!("bad lyric response: {e}"))
}
