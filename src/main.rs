mod client;
mod config;
mod lyrics;
mod player;
mod poll;
mod sync;
mod timeline;
mod tui;
mod watch;

use std::env;

fn has(args: &[String], short: char, long: &str) -> bool {
    args.iter().any(|a| {
        a == long
            || (a.starts_with('-')
                && !a.starts_with("--")
                && a[1..].contains(short))
    })
}

fn parse_offset(args: &[String]) -> Option<i64> {
    args.iter()
        .position(|a| a == "--offset" || a == "-o")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_url(args: &[String]) -> Option<String> {
    args.iter()
        .position(|a| a == "--url")
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn main() {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("--help" | "-h") => {
            print!(
                "\
nlyric - netease cloud music lyrics in your terminal

usage: nlyric [options]
       nlyric <command>

options:
  (default)             interactive TUI with synced lyrics
  -j, --json            full JSON (track, progress, current lyric, all lyrics)
  -p, --plain           print all lyrics to stdout
  -c, --current         with -p: from current line to end
  -r, --reverse         with -p: reverse output order
  -w, --watch           stream lyrics line by line as they play
  -o, --offset <ms>     shift lyrics timing (positive = earlier)
  --no-translation      hide translated lyrics
  --url <base>          player API base url (default from config)
  -h, --help            show this help

  flags combine: -pcr = --plain --current --reverse

tui keys:
  left/right            nudge lyrics timing by 100ms (saved to config)
  0                     reset lyrics timing
  q, esc                quit

commands:
  config                create/show config (~/.config/nlyric/config.toml)
"
            );
        }
        Some("config") => config::init(),
        _ => {
            let cfg = config::load_or_default();

            let base = parse_url(&args).unwrap_or_else(|| cfg.player_url.clone());
            if base.is_empty() {
                eprintln!(
                    "no player url configured; set player_url in {} or pass --url",
                    config::path().display()
                );
                std::process::exit(1);
            }
            let base = base.trim_end_matches('/').to_string();

            let offset = parse_offset(&args).unwrap_or(cfg.lyrics_offset_ms);
            let translation =
                cfg.show_translation && !args.iter().any(|a| a == "--no-translation");

            let json = has(&args, 'j', "--json");
            let watch = has(&args, 'w', "--watch");
            let plain = has(&args, 'p', "--plain");
            let current = has(&args, 'c', "--current");
            let reverse = has(&args, 'r', "--reverse");

            if watch {
                let rt = tokio::runtime::Runtime::new().unwrap();
                let state = poll::shared();
                rt.spawn(poll::run(base, cfg.poll_interval_secs.max(1), state.clone()));
                watch::run(state, json, offset, translation);
            } else if plain {
                client::plain(&base, offset, translation, current, reverse);
            } else if json {
                client::json(&base, offset, translation);
            } else {
                let rt = tokio::runtime::Runtime::new().unwrap();
                let state = poll::shared();
                rt.spawn(poll::run(base, cfg.poll_interval_secs.max(1), state.clone()));
                tui::run(state, offset, translation, cfg.show_cover);
            }
        }
    }
}
