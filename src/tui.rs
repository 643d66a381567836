use crate::config;
use crate::player::{self, NowPlaying};
use crate::poll::Shared;
use crate::sync::{LyricSync, LyricsState, OFFSET_STEP_MS};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, Padding, Paragraph},
    Frame, Terminal,
};
use ratatui_image::{picker::Picker, protocol::StatefulProtocol, StatefulImage};
use std::io;
use std::time::Duration;

const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;

struct App {
    state: Shared,
    sync: LyricSync,
    list_state: ListState,
    now_playing: Option<NowPlaying>,
    player_err: Option<String>,
    show_cover: bool,
    picker: Option<Picker>,
    art: Option<StatefulProtocol>,
    art_url: String,
}

impl App {
    fn new(state: Shared, offset_ms: i64, show_translation: bool, show_cover: bool) -> Self {
        let picker = Picker::from_query_stdio().ok();
        Self {
            state,
            sync: LyricSync::new(offset_ms, show_translation),
            list_state: ListState::default(),
            now_playing: None,
            player_err: None,
            show_cover,
            picker,
            art: None,
            art_url: String::new(),
        }
    }

    fn update(&mut self) {
        let (np, err, outcome) = {
            let mut s = self.state.write().unwrap();
            (s.now_playing.clone(), s.player_err.clone(), s.fetch.take())
        };

        let song_id = np.as_ref().map(|n| n.song_id.as_str()).unwrap_or("");
        if self.sync.song_changed(song_id) {
            self.list_state = ListState::default();
            self.update_art(np.as_ref());
        }
        if let Some(outcome) = outcome {
            self.sync.apply_fetch(&outcome.song_id, outcome.result);
        }

        self.sync.tick(np.as_ref(), player::now_ms());
        self.list_state.select(self.sync.index());

        self.now_playing = np;
        self.player_err = err;
    }

    fn update_art(&mut self, np: Option<&NowPlaying>) {
        if !self.show_cover {
            return;
        }
        let url = np.and_then(|n| n.cover.as_deref()).unwrap_or("");

        if url == self.art_url {
            return;
        }
        self.art_url = url.to_string();
        self.art = None;

        let Some(picker) = &mut self.picker else { return };
        if url.is_empty() {
            return;
        }

        if let Ok(bytes) = reqwest::blocking::get(url).and_then(|r| r.bytes()) {
            if let Ok(img) = image::load_from_memory(&bytes) {
                self.art = Some(picker.new_resize_protocol(img));
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let outer = f.area();

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Length(1),
        Constraint::Min(1),
    ])
    .split(outer);

    render_header(f, chunks[1], app);

    // --- separator ---
    let sep_area = chunks[2];
    let sep = Paragraph::new(Line::from(Span::styled(
        "\u{2500}".repeat(sep_area.width as usize),
        Style::default().fg(DIM),
    )));
    f.render_widget(sep, sep_area);

    // --- lyrics ---
    let lyrics_area = chunks[3];
    let lyrics_block = Block::default().padding(Padding::horizontal(2));

    match app.sync.lyrics() {
        LyricsState::Ready(_) => {
            let lines = app.sync.display_lines();
            let items: Vec<ListItem> = lines
                .iter()
                .map(|l| {
                    let style = if l.is_current {
                        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
                    } else if l.is_near {
                        Style::default().fg(Color::Gray)
                    } else {
                        Style::default().fg(DIM)
                    };
                    let mut rows =
                        vec![Line::from(Span::styled(l.text, style)).alignment(Alignment::Center)];
                    if let Some(t) = l.translation {
                        let tstyle = if l.is_current {
                            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC)
                        } else {
                            Style::default().fg(DIM).add_modifier(Modifier::ITALIC)
                        };
                        rows.push(Line::from(Span::styled(t, tstyle)).alignment(Alignment::Center));
                    }
                    ListItem::new(rows)
                })
                .collect();

            if let Some(sel) = app.sync.index() {
                let inner_h = lyrics_area.height.saturating_sub(2) as usize;
                *app.list_state.offset_mut() = sel.saturating_sub(inner_h / 2);
            }

            let list = List::new(items).block(lyrics_block);
            f.render_stateful_widget(list, lyrics_area, &mut app.list_state);
        }
        state => {
            let msg = match state {
                LyricsState::Loading => "loading lyrics...",
                LyricsState::Failed => "failed to load lyrics",
                _ => "no lyrics found",
            };
            let msg = Paragraph::new(Span::styled(msg, Style::default().fg(DIM)))
                .block(lyrics_block)
                .alignment(Alignment::Center);
            f.render_widget(msg, lyrics_area);
        }
    }

    // --- album art (bottom-left, floating over lyrics) ---
    if let Some(proto) = &mut app.art {
        let art_h = 5u16;
        let art_w = 10u16;
        let art_area = Rect {
            x: 1,
            y: outer.height.saturating_sub(art_h + 1),
            width: art_w,
            height: art_h,
        };
        f.render_stateful_widget(StatefulImage::new(None), art_area, proto);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let text_area = Rect {
        x: area.x + 1,
        y: area.y,
        width: area.width.saturating_sub(2),
        height: area.height,
    };

    if let Some(err) = &app.player_err {
        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "player not reachable",
                Style::default().fg(Color::Red),
            )),
            Line::from(Span::styled(err.as_str(), Style::default().fg(DIM))),
        ])
        .alignment(Alignment::Center);
        f.render_widget(header, text_area);
        return;
    }

    if let Some(n) = &app.now_playing {
        let icon = if n.is_playing { " \u{25b6}" } else { " \u{23f8}" };

        // line 1: track name
        let title = Line::from(vec![
            Span::styled(
                n.title.as_str(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(icon, Style::default().fg(ACCENT)),
        ]);

        // line 2: artist - album, plus the lyric offset when set
        let mut sub_spans = vec![Span::styled(n.artist.as_str(), Style::default().fg(Color::Gray))];
        if !n.album.is_empty() {
            sub_spans.push(Span::styled(" \u{2014} ", Style::default().fg(DIM)));
            sub_spans.push(Span::styled(n.album.as_str(), Style::default().fg(DIM)));
        }
        let offset = app.sync.offset_ms();
        if offset != 0 {
            sub_spans.push(Span::styled(
                format!("  {offset:+}ms"),
                Style::default().fg(ACCENT),
            ));
        }
        let sub = Line::from(sub_spans);

        // line 3: elapsed ━━━━━━━━────────── total
        let position = player::estimated_position_ms(n, player::now_ms());
        let ratio = if n.duration_ms > 0 {
            (position as f64 / n.duration_ms as f64).min(1.0)
        } else {
            0.0
        };

        let time_l = format!("{} ", player::fmt_time(position));
        let time_r = format!(" {}", player::fmt_time(n.duration_ms));
        let bar_w = text_area
            .width
            .saturating_sub(time_l.len() as u16 + time_r.len() as u16)
            as usize;
        let filled = (bar_w as f64 * ratio).round() as usize;
        let empty = bar_w.saturating_sub(filled);

        let progress_line = Line::from(vec![
            Span::styled(&time_l, Style::default().fg(ACCENT)),
            Span::styled("\u{2501}".repeat(filled), Style::default().fg(ACCENT)),
            Span::styled("\u{2500}".repeat(empty), Style::default().fg(DIM)),
            Span::styled(&time_r, Style::default().fg(DIM)),
        ]);

        let header = Paragraph::new(vec![title, sub, Line::raw(""), progress_line])
            .alignment(Alignment::Center);
        f.render_widget(header, text_area);
    } else {
        let header = Paragraph::new(Span::styled("nothing playing", Style::default().fg(DIM)))
            .alignment(Alignment::Center);
        f.render_widget(header, text_area);
    }
}

pub fn run(state: Shared, offset_ms: i64, show_translation: bool, show_cover: bool) {
    enable_raw_mode().unwrap();
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).unwrap();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).unwrap();

    let mut app = App::new(state, offset_ms, show_translation, show_cover);
    app.update();

    loop {
        terminal.draw(|f| ui(f, &mut app)).unwrap();

        if event::poll(Duration::from_millis(100)).unwrap() {
            if let Event::Key(key) = event::read().unwrap() {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Left | KeyCode::Char('-') => {
                        config::save_offset(app.sync.adjust_offset(-OFFSET_STEP_MS));
                    }
                    KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
                        config::save_offset(app.sync.adjust_offset(OFFSET_STEP_MS));
                    }
                    KeyCode::Char('0') => {
                        config::save_offset(app.sync.reset_offset());
                    }
                    _ => {}
                }
            }
        }

        app.update();
    }

    disable_raw_mode().unwrap();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).unwrap();
}
