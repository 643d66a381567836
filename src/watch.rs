use crate::player;
use crate::poll::Shared;
use crate::sync::LyricSync;
use std::time::Duration;

pub fn run(state: Shared, json: bool, offset_ms: i64, show_translation: bool) {
    let mut sync = LyricSync::new(offset_ms, show_translation);
    let mut was_playing = true;

    loop {
        let np = state.read().unwrap().now_playing.clone();

        let Some(np) = np else {
            if was_playing {
                was_playing = false;
                println!();
            }
            sync.song_changed("");
            std::thread::sleep(Duration::from_secs(1));
            continue;
        };

        if !np.is_playing {
            if was_playing {
                was_playing = false;
                println!();
            }
            std::thread::sleep(Duration::from_millis(500));
            continue;
        }

        was_playing = true;

        if sync.song_changed(&np.song_id) {
            if json {
                println!(
                    "{}",
                    serde_json::json!({"event": "track", "artist": np.artist, "track": np.title})
                );
            } else {
                println!("{} - {}", np.artist, np.title);
            }
        }

        if let Some(outcome) = state.write().unwrap().fetch.take() {
            sync.apply_fetch(&outcome.song_id, outcome.result);
        }

        if sync.tick(Some(&np), player::now_ms()) {
            if let Some(cur) = sync.display_lines().into_iter().find(|l| l.is_current) {
                if json {
                    println!(
                        "{}",
                        serde_json::json!({"event": "line", "text": cur.text, "translation": cur.translation})
                    );
                } else {
                    println!("{}", cur.text);
                    if let Some(t) = cur.translation {
                        println!("{t}");
                    }
                }
            }
        }

        std::thread::sleep(Duration::from_millis(100));
    }
}
