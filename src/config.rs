use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize, Deserialize)]
pub struct Config {
    pub player_url: String,
    pub poll_interval_secs: u64,
    pub lyrics_offset_ms: i64,
    pub show_translation: bool,
    pub show_cover: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_url: "http://127.0.0.1:27232".into(),
            poll_interval_secs: 2,
            lyrics_offset_ms: 0,
            show_translation: true,
            show_cover: true,
        }
    }
}

pub fn path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("nlyric/config.toml")
}

pub fn load() -> Option<Config> {
    let contents = std::fs::read_to_string(path()).ok()?;
    toml::from_str(&contents).ok()
}

pub fn load_or_default() -> Config {
    load().unwrap_or_default()
}

/// Persist the lyric offset. Best effort: a failure here must never disturb
/// the display loop.
pub fn save_offset(offset_ms: i64) {
    let mut cfg = load_or_default();
    cfg.lyrics_offset_ms = offset_ms;
    let Ok(contents) = toml::to_string_pretty(&cfg) else {
        return;
    };
    let p = path();
    if let Some(parent) = p.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    std::fs::write(&p, contents).ok();
}

pub fn init() {
    let p = path();
    if p.exists() {
        println!("{}", std::fs::read_to_string(&p).unwrap());
        eprintln!("# {}", p.display());
        return;
    }

    let cfg = Config::default();
    let contents = toml::to_string_pretty(&cfg).unwrap();
    if let Some(parent) = p.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    std::fs::write(&p, &contents).unwrap();
    println!("{contents}");
    eprintln!("# created {}", p.display());
}
