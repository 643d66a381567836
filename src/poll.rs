use crate::lyrics::{self, LyricPayload};
use crate::player::{self, NowPlaying};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// A finished lyric fetch, tagged with the song it was started for so
/// consumers can drop results that a later song change made stale.
pub struct FetchOutcome {
    pub song_id: String,
    pub result: Result<LyricPayload, String>,
}

#[derive(Default)]
pub struct State {
    pub now_playing: Option<NowPlaying>,
    pub player_err: Option<String>,
    pub fetch: Option<FetchOutcome>,
}

pub type Shared = Arc<RwLock<State>>;

pub fn shared() -> Shared {
    Arc::new(RwLock::new(State::default()))
}

/// Poll the player on a fixed cadence and keep the shared snapshot fresh.
/// A song-id change launches a lyric fetch as its own task; the snapshot is
/// published before the fetch starts, so an outcome is never visible ahead
/// of the song change that caused it.
pub async fn run(base: String, poll_secs: u64, state: Shared) {
    let client = reqwest::Client::new();
    let mut current_song = String::new();

    loop {
        let (np, err) = match player::now_playing(&client, &base).await {
            Ok(np) => (np, None),
            Err(e) => (None, Some(e)),
        };
        let song_id = np.as_ref().map(|n| n.song_id.clone()).unwrap_or_default();

        {
            let mut s = state.write().unwrap();
            s.now_playing = np;
            s.player_err = err;
        }

        if song_id != current_song {
            current_song = song_id.clone();
            if !song_id.is_empty() {
                let client = client.clone();
                let base = base.clone();
                let state = state.clone();
                tokio::spawn(async move {
                    let result = lyrics::fetch(&client, &base, &song_id).await;
                    let mut s = state.write().unwrap();
                    s.fetch = Some(FetchOutcome { song_id, result });
                });
            }
        }

        tokio::time::sleep(Duration::from_secs(poll_secs)).await;
    }
}
