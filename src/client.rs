use crate::lyrics::{self, LyricPayload};
use crate::player::{self, NowPlaying};
use crate::sync::{LyricSync, LyricsState};

fn run_async<T>(f: impl std::future::Future<Output = T>) -> T {
    tokio::runtime::Runtime::new().unwrap().block_on(f)
}

// one round trip to the player: who is playing, and their lyrics
fn snapshot(base: &str) -> (Option<NowPlaying>, Option<Result<LyricPayload, String>>) {
    run_async(async {
        let client = reqwest::Client::new();
        match player::now_playing(&client, base).await {
            Ok(Some(np)) => {
                let fetched = lyrics::fetch(&client, base, &np.song_id).await;
                (Some(np), Some(fetched))
            }
            Ok(None) => (None, None),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    })
}

fn build_sync(
    np: &NowPlaying,
    fetched: Option<Result<LyricPayload, String>>,
    offset_ms: i64,
    show_translation: bool,
) -> LyricSync {
    let mut sync = LyricSync::new(offset_ms, show_translation);
    sync.song_changed(&np.song_id);
    if let Some(result) = fetched {
        sync.apply_fetch(&np.song_id, result);
    }
    sync.tick(Some(np), player::now_ms());
    sync
}

pub fn plain(
    base: &str,
    offset_ms: i64,
    show_translation: bool,
    from_current: bool,
    reverse: bool,
) {
    let (np, fetched) = snapshot(base);
    let Some(np) = np else {
        println!("nothing playing right now");
        return;
    };

    let sync = build_sync(&np, fetched, offset_ms, show_translation);
    match sync.lyrics() {
        LyricsState::Failed => {
            println!("failed to load lyrics");
            return;
        }
        LyricsState::Ready(_) => {}
        _ => {
            println!("no lyrics found");
            return;
        }
    }

    let lines = sync.display_lines();
    let start = if from_current {
        sync.index().unwrap_or(0)
    } else {
        0
    };

    let emit = |line: &crate::sync::DisplayLine| {
        println!("{}", line.text);
        if let Some(t) = line.translation {
            println!("  {t}");
        }
    };

    let rest = &lines[start..];
    if reverse {
        for line in rest.iter().rev() {
            emit(line);
        }
    } else {
        for line in rest {
            emit(line);
        }
    }
}

pub fn json(base: &str, offset_ms: i64, show_translation: bool) {
    let (np, fetched) = snapshot(base);
    let Some(np) = np else {
        println!("null");
        return;
    };

    let sync = build_sync(&np, fetched, offset_ms, show_translation);
    let lines = sync.display_lines();
    let current = lines.iter().find(|l| l.is_current);

    let mut out = serde_json::to_value(&np).unwrap();
    out["offset_ms"] = serde_json::json!(sync.offset_ms());
    out["lyric"] = serde_json::json!(current.map(|l| l.text));
    out["translation"] = serde_json::json!(current.and_then(|l| l.translation));
    out["lyrics_status"] = serde_json::json!(match sync.lyrics() {
        LyricsState::Ready(_) => "ok",
        LyricsState::Failed => "failed",
        _ => "none",
    });
    out["lines"] = serde_json::to_value(&lines).unwrap();
    println!("{}", serde_json::to_string(&out).unwrap());
}
