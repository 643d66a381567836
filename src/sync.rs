use crate::lyrics::LyricPayload;
use crate::player::NowPlaying;
use crate::timeline::{self, LyricLine};
use serde::Serialize;
use std::collections::HashMap;

/// How long after a line's timestamp the highlight moves onto it, so the
/// first line is not lit the instant playback starts.
pub const HIGHLIGHT_DELAY_MS: i64 = 300;

/// A translation line binds to a primary line when their timestamps differ
/// by less than this.
pub const TRANSLATION_MATCH_MS: u64 = 100;

/// Position changes smaller than this are ignored between ticks.
pub const POSITION_EPSILON_MS: i64 = 50;

/// Offset change per keypress in the TUI.
pub const OFFSET_STEP_MS: i64 = 100;

/// Parsed lyrics for one song: the timed lines plus translations keyed by
/// the exact timestamp of the primary line they belong to.
#[derive(Clone, Debug)]
pub struct Lyrics {
    pub lines: Vec<LyricLine>,
    pub translations: HashMap<u64, String>,
}

#[derive(Clone, Debug, Default)]
pub enum LyricsState {
    Loading,
    Ready(Lyrics),
    #[default]
    Missing,
    Failed,
}

/// One row of the rendered lyric list.
#[derive(Clone, Debug, Serialize)]
pub struct DisplayLine<'a> {
    pub text: &'a str,
    pub translation: Option<&'a str>,
    pub is_current: bool,
    pub is_near: bool,
}

/// Align a translation timeline onto the primary one. Each translation line
/// binds to the first primary line within tolerance; the first translation
/// to claim a primary line keeps it.
pub fn build_overlay(primary: &[LyricLine], translation_raw: &str) -> HashMap<u64, String> {
    let mut map = HashMap::new();
    for tline in timeline::parse(translation_raw) {
        let matched = primary
            .iter()
            .find(|l| l.time_ms.abs_diff(tline.time_ms) < TRANSLATION_MATCH_MS);
        if let Some(line) = matched {
            map.entry(line.time_ms).or_insert(tline.text);
        }
    }
    map
}

/// Index of the line that should be highlighted at `instant_ms`, or `None`
/// before the first line becomes active. Once the last line is reached it
/// stays active for any later instant.
pub fn active_index(lines: &[LyricLine], instant_ms: i64) -> Option<usize> {
    let first = lines.first()?;
    let effective = instant_ms - HIGHLIGHT_DELAY_MS;

    if effective < first.time_ms as i64 {
        return None;
    }
    let last = lines.len() - 1;
    if effective >= lines[last].time_ms as i64 {
        return Some(last);
    }
    // floor search: the latest line whose timestamp has passed
    let next = lines.partition_point(|l| (l.time_ms as i64) <= effective);
    Some(next - 1)
}

/// Playback instant the lyrics should be resolved against: the reported
/// position, advanced by wall-clock time since it was captured while the
/// player is playing, shifted by the user offset.
pub fn current_instant_ms(np: &NowPlaying, offset_ms: i64, now_ms: u64) -> i64 {
    let mut instant = np.position_ms as i64;
    if np.is_playing {
        if let Some(at) = np.position_updated_at_ms {
            instant += now_ms.saturating_sub(at) as i64;
        }
    }
    instant + offset_ms
}

/// Tracks the lyrics of the active song and resolves the current line from
/// playback snapshots. Song changes, fetch results, ticks and offset edits
/// are the only transitions.
pub struct LyricSync {
    song_id: String,
    lyrics: LyricsState,
    index: Option<usize>,
    offset_ms: i64,
    last_instant_ms: Option<i64>,
    show_translation: bool,
}

impl LyricSync {
    pub fn new(offset_ms: i64, show_translation: bool) -> Self {
        Self {
            song_id: String::new(),
            lyrics: LyricsState::default(),
            index: None,
            offset_ms,
            last_instant_ms: None,
            show_translation,
        }
    }

    /// Switch to a new song: drop the old timeline and start loading.
    /// Returns false when the id is the one already active.
    pub fn song_changed(&mut self, song_id: &str) -> bool {
        if song_id == self.song_id {
            return false;
        }
        self.song_id = song_id.to_string();
        self.lyrics = if song_id.is_empty() {
            LyricsState::Missing
        } else {
            LyricsState::Loading
        };
        self.index = None;
        self.last_instant_ms = None;
        true
    }

    /// Apply a completed lyric fetch. A result tagged with a song id other
    /// than the active one was superseded by a later song change and is
    /// dropped.
    pub fn apply_fetch(&mut self, song_id: &str, result: Result<LyricPayload, String>) {
        if song_id != self.song_id {
            return;
        }
        self.lyrics = match result {
            Ok(payload) => {
                let lines = timeline::parse(payload.lrc.as_deref().unwrap_or(""));
                if lines.is_empty() {
                    LyricsState::Missing
                } else {
                    let translations = match payload.tlyric.as_deref() {
                        Some(t) if self.show_translation => build_overlay(&lines, t),
                        _ => HashMap::new(),
                    };
                    LyricsState::Ready(Lyrics { lines, translations })
                }
            }
            Err(_) => LyricsState::Failed,
        };
        self.index = None;
        self.last_instant_ms = None;
    }

    /// Resolve the active line for the given playback snapshot. Returns
    /// whether the index changed, so callers know to redraw.
    pub fn tick(&mut self, playback: Option<&NowPlaying>, now_ms: u64) -> bool {
        let index = match (&self.lyrics, playback) {
            (LyricsState::Ready(ly), Some(np)) => {
                let instant = current_instant_ms(np, self.offset_ms, now_ms);
                if let Some(last) = self.last_instant_ms {
                    if (instant - last).abs() < POSITION_EPSILON_MS {
                        return false;
                    }
                }
                self.last_instant_ms = Some(instant);
                active_index(&ly.lines, instant)
            }
            _ => {
                self.last_instant_ms = None;
                None
            }
        };
        if index != self.index {
            self.index = index;
            true
        } else {
            false
        }
    }

    pub fn display_lines(&self) -> Vec<DisplayLine<'_>> {
        let LyricsState::Ready(ly) = &self.lyrics else {
            return Vec::new();
        };
        ly.lines
            .iter()
            .enumerate()
            .map(|(i, l)| DisplayLine {
                text: &l.text,
                translation: ly.translations.get(&l.time_ms).map(String::as_str),
                is_current: self.index == Some(i),
                is_near: self.index.is_some_and(|s| i.abs_diff(s) <= 2),
            })
            .collect()
    }

    pub fn adjust_offset(&mut self, delta_ms: i64) -> i64 {
        self.offset_ms += delta_ms;
        self.offset_ms
    }

    pub fn reset_offset(&mut self) -> i64 {
        self.offset_ms = 0;
        self.offset_ms
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn lyrics(&self) -> &LyricsState {
        &self.lyrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(time_ms: u64, text: &str) -> LyricLine {
        LyricLine { time_ms, text: text.into() }
    }

    fn paused_at(position_ms: u64) -> NowPlaying {
        NowPlaying {
            song_id: "1".into(),
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            cover: None,
            position_ms,
            duration_ms: 300_000,
            position_updated_at_ms: None,
            is_playing: false,
        }
    }

    fn payload(lrc: &str, tlyric: Option<&str>) -> LyricPayload {
        LyricPayload {
            lrc: Some(lrc.to_string()),
            tlyric: tlyric.map(|t| t.to_string()),
        }
    }

    #[test]
    fn test_active_index_empty() {
        assert_eq!(active_index(&[], 0), None);
        assert_eq!(active_index(&[], 1_000_000), None);
    }

    #[test]
    fn test_active_index_single_line() {
        let lines = vec![line(5_000, "a")];
        assert_eq!(active_index(&lines, 5_299), None);
        assert_eq!(active_index(&lines, 5_300), Some(0));
        assert_eq!(active_index(&lines, 10_000_000), Some(0));
    }

    #[test]
    fn test_active_index_floor_search() {
        let lines = vec![line(0, "a"), line(2_000, "b"), line(4_000, "c")];
        assert_eq!(active_index(&lines, 290), None);
        assert_eq!(active_index(&lines, 310), Some(0));
        assert_eq!(active_index(&lines, 2_350), Some(1));
        assert_eq!(active_index(&lines, 4_299), Some(1));
        assert_eq!(active_index(&lines, 4_300), Some(2));
        assert_eq!(active_index(&lines, 100_000), Some(2));
    }

    #[test]
    fn test_active_index_negative_instant() {
        let lines = vec![line(0, "a")];
        assert_eq!(active_index(&lines, -500), None);
    }

    #[test]
    fn test_overlay_tolerance() {
        let primary = vec![line(10_000, "a")];
        let map = build_overlay(&primary, "[00:10.05]close");
        assert_eq!(map.get(&10_000).map(String::as_str), Some("close"));

        let map = build_overlay(&primary, "[00:10.20]far");
        assert!(map.is_empty());
    }

    #[test]
    fn test_overlay_first_translation_wins() {
        let primary = vec![line(10_000, "a")];
        let map = build_overlay(&primary, "[00:09.95]first\n[00:10.05]second");
        assert_eq!(map.get(&10_000).map(String::as_str), Some("first"));
    }

    #[test]
    fn test_overlay_first_primary_wins() {
        // 10040 is nearer to 10050, but 10000 is scanned first
        let primary = vec![line(10_000, "a"), line(10_050, "b")];
        let map = build_overlay(&primary, "[00:10.04]t");
        assert_eq!(map.get(&10_000).map(String::as_str), Some("t"));
        assert!(!map.contains_key(&10_050));
    }

    #[test]
    fn test_current_instant_paused() {
        let np = paused_at(1_000);
        assert_eq!(current_instant_ms(&np, 0, 999_999), 1_000);
        assert_eq!(current_instant_ms(&np, 250, 999_999), 1_250);
    }

    #[test]
    fn test_current_instant_drift() {
        let mut np = paused_at(1_000);
        np.is_playing = true;
        // no capture timestamp, no drift added
        assert_eq!(current_instant_ms(&np, 0, 7_000), 1_000);

        np.position_updated_at_ms = Some(5_000);
        assert_eq!(current_instant_ms(&np, 0, 7_000), 3_000);
        assert_eq!(current_instant_ms(&np, -500, 7_000), 2_500);
        // capture timestamp ahead of the clock adds nothing
        assert_eq!(current_instant_ms(&np, 0, 4_000), 1_000);
    }

    #[test]
    fn test_offset_round_trip() {
        let mut sync = LyricSync::new(120, true);
        sync.adjust_offset(1_000);
        sync.adjust_offset(-1_000);
        assert_eq!(sync.offset_ms(), 120);
        assert_eq!(sync.reset_offset(), 0);
    }

    #[test]
    fn test_tick_resolves_and_suppresses() {
        let mut sync = LyricSync::new(0, false);
        sync.song_changed("1");
        sync.apply_fetch("1", Ok(payload("[00:01.00]a\n[00:05.00]b", None)));

        assert!(sync.tick(Some(&paused_at(2_000)), 0));
        assert_eq!(sync.index(), Some(0));

        // same instant again: suppressed, no change reported
        assert!(!sync.tick(Some(&paused_at(2_000)), 0));
        // within the epsilon: still suppressed even though nothing moved
        assert!(!sync.tick(Some(&paused_at(2_040)), 0));

        assert!(sync.tick(Some(&paused_at(6_000)), 0));
        assert_eq!(sync.index(), Some(1));
    }

    #[test]
    fn test_tick_offset_shifts_resolution() {
        let mut sync = LyricSync::new(0, false);
        sync.song_changed("1");
        sync.apply_fetch("1", Ok(payload("[00:01.00]a", None)));

        assert!(!sync.tick(Some(&paused_at(800)), 0));
        assert_eq!(sync.index(), None);

        sync.adjust_offset(1_000);
        assert!(sync.tick(Some(&paused_at(800)), 0));
        assert_eq!(sync.index(), Some(0));
    }

    #[test]
    fn test_tick_without_playback_clears() {
        let mut sync = LyricSync::new(0, false);
        sync.song_changed("1");
        sync.apply_fetch("1", Ok(payload("[00:01.00]a", None)));
        assert!(sync.tick(Some(&paused_at(5_000)), 0));

        assert!(sync.tick(None, 0));
        assert_eq!(sync.index(), None);
    }

    #[test]
    fn test_song_change_resets() {
        let mut sync = LyricSync::new(0, false);
        sync.song_changed("1");
        sync.apply_fetch("1", Ok(payload("[00:01.00]a", None)));
        assert!(sync.tick(Some(&paused_at(5_000)), 0));
        assert_eq!(sync.index(), Some(0));

        assert!(sync.song_changed("2"));
        assert_eq!(sync.index(), None);
        assert!(sync.display_lines().is_empty());
        assert!(matches!(sync.lyrics(), LyricsState::Loading));

        // the failed fetch for the new song still leaves the old song gone
        sync.apply_fetch("2", Err("HTTP 502".into()));
        assert!(matches!(sync.lyrics(), LyricsState::Failed));
        assert_eq!(sync.index(), None);
    }

    #[test]
    fn test_stale_fetch_ignored() {
        let mut sync = LyricSync::new(0, false);
        sync.song_changed("1");
        sync.song_changed("2");

        sync.apply_fetch("1", Ok(payload("[00:01.00]old", None)));
        assert!(matches!(sync.lyrics(), LyricsState::Loading));

        sync.apply_fetch("2", Ok(payload("[00:01.00]new", None)));
        assert!(matches!(sync.lyrics(), LyricsState::Ready(_)));
        assert_eq!(sync.display_lines()[0].text, "new");
    }

    #[test]
    fn test_empty_parse_is_missing_not_failed() {
        let mut sync = LyricSync::new(0, false);
        sync.song_changed("1");
        sync.apply_fetch("1", Ok(payload("plain text, no timestamps", None)));
        assert!(matches!(sync.lyrics(), LyricsState::Missing));

        sync.song_changed("2");
        sync.apply_fetch("2", Ok(LyricPayload { lrc: None, tlyric: None }));
        assert!(matches!(sync.lyrics(), LyricsState::Missing));
    }

    #[test]
    fn test_display_lines_projection() {
        let mut sync = LyricSync::new(0, true);
        sync.song_changed("1");
        let lrc = "[00:01.00]a\n[00:02.00]b\n[00:03.00]c\n[00:04.00]d\n[00:05.00]e";
        sync.apply_fetch("1", Ok(payload(lrc, Some("[00:01.02]A"))));

        assert!(sync.tick(Some(&paused_at(1_500)), 0));
        let lines = sync.display_lines();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].is_current);
        assert_eq!(lines[0].translation, Some("A"));
        assert_eq!(lines[1].translation, None);
        assert!(lines[1].is_near && lines[2].is_near);
        assert!(!lines[3].is_near);

        // before anything is active no line counts as near
        sync.song_changed("2");
        sync.apply_fetch("2", Ok(payload(lrc, None)));
        sync.tick(Some(&paused_at(0)), 0);
        assert_eq!(sync.index(), None);
        assert!(sync.display_lines().iter().all(|l| !l.is_near));
    }
}
