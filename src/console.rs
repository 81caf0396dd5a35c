// src/console.rs

use std::fmt::Write as FmtWrite;
use std::io::{stdout, Write};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate},
};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::advisory::{
    pair_key, AdviceOutcome, Advisor, AdvisorySlot, CompletionBackend, HttpCompletionBackend, PersonaStyle,
    RequestTag, TransitionAdvice,
};
use crate::engine::{AnalysisTap, ChannelId};
use crate::error::{LoadError, PlayOutcome};
use crate::library::{Track, TrackLibrary};
use crate::runtime::{AudioRuntime, ChannelSnapshot};

pub const CROSSFADER_STEP: f32 = 0.1;
pub const SPEED_STEP: f32 = 0.01;
/// The pitch control only covers ±8%.
pub const SPEED_RANGE: (f32, f32) = (0.92, 1.08);

const SPECTRUM_BANDS: usize = 16;
const BAR_WIDTH: usize = 20;

/// Raw terminal mode for as long as the guard lives; dropping it restores
/// cooked mode.
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn enter() -> std::io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { active: true })
    }

    /// Leave raw mode now and report the result.
    pub fn release(mut self) -> std::io::Result<()> {
        self.active = false;
        disable_raw_mode()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = disable_raw_mode();
        }
    }
}

/// Search and selection state over the library.
#[derive(Debug, Default)]
struct Browser {
    query: String,
    selected: usize,
    typing: bool,
}

enum AdvisoryReply {
    Transition(RequestTag, AdviceOutcome<TransitionAdvice>),
    Persona(RequestTag, AdviceOutcome<String>),
}

/// Two-deck terminal controller. Owns the runtime for the session.
pub struct MixConsole<B: CompletionBackend + 'static = HttpCompletionBackend> {
    runtime: AudioRuntime,
    advisor: Arc<Advisor<B>>,
    handle: Handle,

    library: TrackLibrary,
    browser: Browser,
    pending_load: Option<(ChannelId, Track)>,
    decks: [Option<Track>; 2],
    taps: [AnalysisTap; 2],

    advice: AdvisorySlot<AdviceOutcome<TransitionAdvice>>,
    host: AdvisorySlot<AdviceOutcome<String>>,
    persona_style: usize,
    replies_tx: UnboundedSender<AdvisoryReply>,
    replies_rx: UnboundedReceiver<AdvisoryReply>,

    status: String,
    draw_buffer: String,
}

impl<B: CompletionBackend + 'static> MixConsole<B> {
    /// Decks start empty; use `set_deck_track` for tracks loaded beforehand.
    pub fn new(runtime: AudioRuntime, library: TrackLibrary, advisor: Arc<Advisor<B>>, handle: Handle) -> Self {
        let (replies_tx, replies_rx) = unbounded_channel();
        Self {
            runtime,
            advisor,
            handle,
            library,
            browser: Browser::default(),
            pending_load: None,
            decks: [None, None],
            taps: [AnalysisTap::inert(), AnalysisTap::inert()],
            advice: AdvisorySlot::new(),
            host: AdvisorySlot::new(),
            persona_style: 0,
            replies_tx,
            replies_rx,
            status: String::from("Ready"),
            draw_buffer: String::with_capacity(4096),
        }
    }

    pub fn runtime(&self) -> &AudioRuntime {
        &self.runtime
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn advice(&self) -> Option<&AdviceOutcome<TransitionAdvice>> {
        self.advice.value()
    }

    pub fn host_line(&self) -> Option<&AdviceOutcome<String>> {
        self.host.value()
    }

    pub fn deck(&self, channel: ChannelId) -> Option<&Track> {
        self.decks[channel.index()].as_ref()
    }

    pub fn library(&self) -> &TrackLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut TrackLibrary {
        &mut self.library
    }

    /// Record which library track a deck now holds. A new pair asks for
    /// transition advice and any loaded deck gets a hype line from the host.
    pub fn set_deck_track(&mut self, channel: ChannelId, track: Option<Track>) {
        let changed = self.decks[channel.index()].as_ref().map(|t| &t.id) != track.as_ref().map(|t| &t.id);
        self.decks[channel.index()] = track;
        let key = self.current_pair_key();
        let paired = key.is_some();
        self.advice.select(key);
        if !changed {
            return;
        }

        if paired {
            self.request_transition_advice();
        }
        let lead = self.decks[0].clone().or_else(|| self.decks[1].clone());
        if lead.is_some() {
            self.request_persona(lead, PersonaStyle::Hype);
        }
    }

    fn current_pair_key(&self) -> Option<String> {
        match &self.decks {
            [Some(a), Some(b)] => Some(pair_key(a, b)),
            _ => None,
        }
    }

    /// `q` types into the search box while it has focus; Ctrl+C always quits.
    pub fn should_quit(&self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        !self.browser.typing && matches!(key, KeyCode::Char('q') | KeyCode::Char('Q'))
    }

    // -------------------------------------------------------------
    // Keys
    // -------------------------------------------------------------
    pub fn handle_key(&mut self, key: KeyCode) {
        if self.browser.typing {
            self.handle_search_key(key);
            return;
        }
        match key {
            KeyCode::Char('a') | KeyCode::Char('A') => self.toggle_play(ChannelId::A),
            KeyCode::Char('b') | KeyCode::Char('B') => self.toggle_play(ChannelId::B),
            KeyCode::Left => self.nudge_crossfader(-CROSSFADER_STEP),
            KeyCode::Right => self.nudge_crossfader(CROSSFADER_STEP),
            KeyCode::Char('z') => self.nudge_speed(ChannelId::A, -SPEED_STEP),
            KeyCode::Char('x') => self.nudge_speed(ChannelId::A, SPEED_STEP),
            KeyCode::Char('n') => self.nudge_speed(ChannelId::B, -SPEED_STEP),
            KeyCode::Char('m') => self.nudge_speed(ChannelId::B, SPEED_STEP),
            KeyCode::Char('1') => self.toggle_loop(ChannelId::A),
            KeyCode::Char('2') => self.toggle_loop(ChannelId::B),
            KeyCode::Char('t') | KeyCode::Char('T') => self.request_transition_advice(),
            KeyCode::Char('p') | KeyCode::Char('P') => self.request_persona_message(),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char('/') => {
                self.browser.typing = true;
                self.status = String::from("🔎 Type to search, Enter to keep, Esc to clear");
            }
            KeyCode::Char('[') => self.queue_load(ChannelId::A),
            KeyCode::Char(']') => self.queue_load(ChannelId::B),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => self.browser.typing = false,
            KeyCode::Esc => {
                self.browser.typing = false;
                self.browser.query.clear();
            }
            KeyCode::Backspace => {
                self.browser.query.pop();
            }
            KeyCode::Char(c) => self.browser.query.push(c),
            _ => return,
        }
        self.browser.selected = 0;
        let hits = self.library.search(&self.browser.query).len();
        self.status = format!("🔎 {hits} match(es) for \"{}\"", self.browser.query);
    }

    // -------------------------------------------------------------
    // Library
    // -------------------------------------------------------------
    /// The highlighted entry of the current search.
    pub fn selected_track(&self) -> Option<&Track> {
        let hits = self.library.search(&self.browser.query);
        let index = self.browser.selected.min(hits.len().saturating_sub(1));
        hits.get(index).copied()
    }

    fn move_selection(&mut self, delta: isize) {
        let hits = self.library.search(&self.browser.query).len();
        if hits == 0 {
            return;
        }
        let current = self.browser.selected.min(hits - 1) as isize;
        self.browser.selected = (current + delta).clamp(0, hits as isize - 1) as usize;
    }

    fn queue_load(&mut self, channel: ChannelId) {
        let Some(track) = self.selected_track().cloned() else {
            self.status = String::from("No track selected");
            return;
        };
        self.status = format!("💿 Loading {} onto Deck {channel}...", track.title);
        self.pending_load = Some((channel, track));
    }

    pub fn has_pending_load(&self) -> bool {
        self.pending_load.is_some()
    }

    /// Run a load queued by `[` or `]`.
    pub async fn process_pending(&mut self) {
        if let Some((channel, track)) = self.pending_load.take() {
            self.load_track_onto(channel, track).await;
        }
    }

    /// Load `track` onto `channel`. A failure leaves the deck empty and
    /// says so in the status line.
    pub async fn load_track_onto(&mut self, channel: ChannelId, track: Track) {
        match self.runtime.load_track(channel, &track.url).await {
            Ok(_) => {
                self.status = format!("💿 Deck {channel}: {} - {}", track.title, track.artist);
                self.set_deck_track(channel, Some(track));
            }
            Err(LoadError::Superseded { .. }) => {}
            Err(e) => {
                log::warn!("Deck {channel}: {e}");
                self.set_deck_track(channel, None);
                self.status = format!("❌ Deck {channel}: track failed to load");
            }
        }
    }

    fn toggle_play(&mut self, channel: ChannelId) {
        let state = self.runtime.channel_state(channel);
        let outcome = if state.playing {
            self.runtime.pause(channel)
        } else {
            self.runtime.play(channel)
        };
        self.status = match outcome {
            PlayOutcome::Applied if state.playing => format!("⏸️  Deck {channel} paused"),
            PlayOutcome::Applied => format!("▶️  Deck {channel} playing"),
            PlayOutcome::NoSource => format!("Deck {channel} is empty"),
            PlayOutcome::Blocked(reason) => format!("🔇 Playback blocked: {reason}"),
        };
    }

    fn nudge_crossfader(&mut self, delta: f32) {
        let pos = (self.runtime.crossfader() + delta).clamp(-1.0, 1.0);
        // keep on the 0.1 grid
        let pos = (pos * 10.0).round() / 10.0;
        self.runtime.set_crossfader(pos);
    }

    fn nudge_speed(&mut self, channel: ChannelId, delta: f32) {
        let Some(rate) = self.runtime.channel_state(channel).playback_rate else {
            return;
        };
        let (lo, hi) = SPEED_RANGE;
        let next = ((rate + delta) * 100.0).round() / 100.0;
        self.runtime.set_speed(channel, next.clamp(lo, hi));
    }

    fn toggle_loop(&mut self, channel: ChannelId) {
        let state = self.runtime.channel_state(channel);
        if state.source_id.is_some() {
            self.runtime.set_loop(channel, !state.looping);
        }
    }

    // -------------------------------------------------------------
    // Advisory
    // -------------------------------------------------------------
    fn request_transition_advice(&mut self) {
        let [Some(current), Some(next)] = self.decks.clone() else {
            self.status = String::from("Load both decks to get transition advice");
            return;
        };

        let tag = self.advice.begin(pair_key(&current, &next));
        let advisor = self.advisor.clone();
        let tx = self.replies_tx.clone();
        self.handle.spawn(async move {
            let outcome = advisor.transition_advice_outcome(&current, &next).await;
            let _ = tx.send(AdvisoryReply::Transition(tag, outcome));
        });
        self.status = String::from("🤖 Mixora AI is thinking...");
    }

    fn request_persona_message(&mut self) {
        // Host talks about whichever deck is louder on the fader.
        let channel = if self.runtime.crossfader() <= 0.0 { ChannelId::A } else { ChannelId::B };
        let track = self.decks[channel.index()].clone();
        let style = PersonaStyle::ALL[self.persona_style % PersonaStyle::ALL.len()];
        self.persona_style += 1;
        self.request_persona(track, style);
    }

    fn request_persona(&mut self, track: Option<Track>, style: PersonaStyle) {
        let key = track.as_ref().map_or_else(|| String::from("-"), |t| t.id.clone());
        let tag = self.host.begin(key);
        let advisor = self.advisor.clone();
        let tx = self.replies_tx.clone();
        self.handle.spawn(async move {
            let outcome = advisor.persona_message_outcome(track.as_ref(), style).await;
            let _ = tx.send(AdvisoryReply::Persona(tag, outcome));
        });
    }

    /// Apply advisory replies that have arrived since the last call.
    pub fn poll_replies(&mut self) {
        while let Ok(reply) = self.replies_rx.try_recv() {
            match reply {
                AdvisoryReply::Transition(tag, outcome) => {
                    let degraded = outcome.is_fallback();
                    if self.advice.offer(&tag, outcome) {
                        self.status = if degraded {
                            String::from("🤖 Advice unavailable, showing fallback")
                        } else {
                            String::from("🤖 Advice ready")
                        };
                    }
                }
                AdvisoryReply::Persona(tag, outcome) => {
                    self.host.offer(&tag, outcome);
                }
            }
        }
    }

    // -------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------
    fn refresh_taps(&mut self) {
        for channel in ChannelId::ALL {
            let tap = &self.taps[channel.index()];
            if !tap.is_connected() && self.runtime.channel_state(channel).source_id.is_some() {
                self.taps[channel.index()] = self.runtime.analysis_tap(channel);
            }
        }
    }

    pub fn run_tick(&mut self) -> Result<(), anyhow::Error> {
        self.poll_replies();
        self.refresh_taps();

        self.draw_buffer.clear();
        let _ = write!(self.draw_buffer, "{}", MoveTo(0, 0));

        for channel in ChannelId::ALL {
            let snapshot = self.runtime.channel_state(channel);
            self.draw_deck(&snapshot);
        }
        self.draw_crossfader();
        self.draw_library();
        self.draw_advice();

        let _ = write!(self.draw_buffer, "{}{}\n", Clear(ClearType::UntilNewLine), self.status);
        let _ = write!(
            self.draw_buffer,
            "[A/B] Play | [←/→] Fader | [Z/X N/M] Pitch | [1/2] Loop | [↑/↓ /] Browse | [[/]] Load A/B | [T] Advice | [P] Host | [Q] Quit\x1b[K"
        );

        let mut stdout = stdout();
        execute!(stdout, BeginSynchronizedUpdate)?;
        stdout.write_all(self.draw_buffer.as_bytes())?;
        execute!(stdout, EndSynchronizedUpdate)?;
        stdout.flush()?;
        Ok(())
    }

    fn draw_deck(&mut self, s: &ChannelSnapshot) {
        let i = s.channel.index();
        let title = match (&self.decks[i], &s.url) {
            (Some(track), _) => format!("{} - {}", track.title, track.artist),
            (None, Some(url)) => url.clone(),
            (None, None) => String::from("(empty)"),
        };
        let state = if s.playing { "▶" } else { "■" };
        let _ = write!(
            self.draw_buffer,
            "Deck {} {} {}\x1b[K\n  {} / {} | pitch {:+.0}% | loop {} | gain {:.2}\x1b[K\n",
            s.channel,
            state,
            title,
            mmss(s.position),
            mmss(s.duration),
            (s.playback_rate.unwrap_or(1.0) - 1.0) * 100.0,
            if s.looping { "on" } else { "off" },
            s.trim * s.fader_gain,
        );

        let meters = self.runtime.meters(s.channel);
        let level = meters.peak[0].max(meters.peak[1]);
        let spectrum = spectrum_line(&self.taps[i].frequency_data());
        let _ = write!(self.draw_buffer, "  {} {}\x1b[K\n", level_bar(level), spectrum);
    }

    fn draw_crossfader(&mut self) {
        let pos = self.runtime.crossfader();
        let slot = (((pos + 1.0) / 2.0) * (BAR_WIDTH - 1) as f32).round() as usize;
        let track: String = (0..BAR_WIDTH).map(|c| if c == slot { '█' } else { '─' }).collect();
        let _ = write!(self.draw_buffer, "\n  A {track} B  ({pos:+.1})\x1b[K\n");
    }

    fn draw_library(&mut self) {
        let hits = self.library.search(&self.browser.query);
        let index = self.browser.selected.min(hits.len().saturating_sub(1));
        let cursor = if self.browser.typing { "_" } else { "" };
        let _ = write!(
            self.draw_buffer,
            "📚 /{}{} ({} of {})\x1b[K\n",
            self.browser.query,
            cursor,
            hits.len(),
            self.library.len(),
        );
        match hits.get(index) {
            Some(t) => {
                let _ = write!(
                    self.draw_buffer,
                    "  ▸ {}/{} {} - {} | {:.0} BPM | {} | {} | energy {}\x1b[K\n",
                    index + 1,
                    hits.len(),
                    t.title,
                    t.artist,
                    t.bpm,
                    t.key,
                    t.genre,
                    t.energy,
                );
            }
            None => {
                let _ = write!(self.draw_buffer, "  (no matches)\x1b[K\n");
            }
        }
    }

    fn draw_advice(&mut self) {
        match self.advice.value() {
            Some(outcome) => {
                let a = outcome.value();
                let _ = write!(
                    self.draw_buffer,
                    "🤖 {}% | {:?} | {:?} | {}{}\x1b[K\n",
                    a.transition_suitability,
                    a.key_compatibility,
                    a.energy_change,
                    a.suggested_transition,
                    if outcome.is_fallback() { " (offline)" } else { "" },
                );
            }
            None => {
                let _ = write!(self.draw_buffer, "\x1b[K\n");
            }
        }
        match self.host.value() {
            Some(msg) => {
                let _ = write!(self.draw_buffer, "🎙️ {}\x1b[K\n", msg.value());
            }
            None => {
                let _ = write!(self.draw_buffer, "\x1b[K\n");
            }
        }
    }
}

fn mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn level_bar(level: f32) -> String {
    let filled = ((level.clamp(0.0, 1.0)) * BAR_WIDTH as f32).round() as usize;
    format!("{}{}", "▮".repeat(filled), "·".repeat(BAR_WIDTH - filled))
}

/// Average the dB bins into a few bands, -100..0 dB onto eight glyph heights.
fn spectrum_line(bins: &[f32]) -> String {
    const GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    if bins.is_empty() {
        return String::new();
    }
    let per_band = (bins.len() / SPECTRUM_BANDS).max(1);
    bins.chunks(per_band)
        .take(SPECTRUM_BANDS)
        .map(|band| {
            let db = band.iter().sum::<f32>() / band.len() as f32;
            let norm = ((db + 100.0) / 100.0).clamp(0.0, 1.0);
            GLYPHS[((norm * (GLYPHS.len() - 1) as f32).round()) as usize]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::{AdvisoryError, CompletionRequest, PERSONA_UNAVAILABLE};
    use crate::config::EngineConfig;

    struct Offline;

    impl CompletionBackend for Offline {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, AdvisoryError> {
            Err(AdvisoryError::MissingKey)
        }
    }

    fn console() -> MixConsole<Offline> {
        let runtime = AudioRuntime::headless(48_000, EngineConfig::default());
        MixConsole::new(runtime, TrackLibrary::with_demo_tracks(), Arc::new(Advisor::new(Offline)), Handle::current())
    }

    async fn settle(c: &mut MixConsole<Offline>) {
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            c.poll_replies();
            if c.advice().is_some() && c.host_line().is_some() {
                return;
            }
        }
    }

    fn demo(c: &MixConsole<Offline>, id: &str) -> Track {
        c.library().get(id).cloned().unwrap()
    }

    #[tokio::test]
    async fn arrows_step_the_crossfader_and_stop_at_the_edges() {
        let mut c = console();
        c.handle_key(KeyCode::Right);
        c.handle_key(KeyCode::Right);
        assert!((c.runtime().crossfader() - 0.2).abs() < 1e-6);
        for _ in 0..30 {
            c.handle_key(KeyCode::Left);
        }
        assert_eq!(c.runtime().crossfader(), -1.0);
    }

    #[tokio::test]
    async fn play_on_empty_deck_reports_it() {
        let mut c = console();
        c.handle_key(KeyCode::Char('a'));
        assert_eq!(c.status(), "Deck A is empty");
    }

    #[tokio::test]
    async fn advice_needs_both_decks() {
        let mut c = console();
        c.handle_key(KeyCode::Char('t'));
        assert!(c.advice().is_none());
        assert!(c.status().starts_with("Load both decks"));
    }

    #[tokio::test]
    async fn loading_both_decks_fills_the_assistant_panel() {
        let mut c = console();
        let (a, b) = (demo(&c, "2"), demo(&c, "3"));
        c.set_deck_track(ChannelId::A, Some(a));
        c.set_deck_track(ChannelId::B, Some(b));
        settle(&mut c).await;

        let advice = c.advice().expect("advice after both decks load");
        assert!(advice.is_fallback());
        assert_eq!(advice.value(), &TransitionAdvice::fallback());
        assert_eq!(c.host_line().map(|h| h.value().as_str()), Some(PERSONA_UNAVAILABLE));
    }

    #[tokio::test]
    async fn one_deck_gets_a_host_line_but_no_advice() {
        let mut c = console();
        let a = demo(&c, "1");
        c.set_deck_track(ChannelId::A, Some(a));
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            c.poll_replies();
        }
        assert!(c.host_line().is_some());
        assert!(c.advice().is_none());
    }

    #[tokio::test]
    async fn search_narrows_the_selection() {
        let mut c = console();
        assert_eq!(c.selected_track().map(|t| t.id.as_str()), Some("1"));
        c.handle_key(KeyCode::Down);
        assert_eq!(c.selected_track().map(|t| t.id.as_str()), Some("2"));

        c.handle_key(KeyCode::Char('/'));
        // typed, not a quit
        assert!(!c.should_quit(KeyCode::Char('q'), KeyModifiers::NONE));
        for ch in "deep".chars() {
            c.handle_key(KeyCode::Char(ch));
        }
        c.handle_key(KeyCode::Enter);
        assert_eq!(c.selected_track().map(|t| t.id.as_str()), Some("3"));
        c.handle_key(KeyCode::Down);
        assert_eq!(c.selected_track().map(|t| t.id.as_str()), Some("3"));

        c.handle_key(KeyCode::Char('/'));
        c.handle_key(KeyCode::Esc);
        c.handle_key(KeyCode::Up);
        assert_eq!(c.selected_track().map(|t| t.id.as_str()), Some("1"));
        assert!(c.should_quit(KeyCode::Char('q'), KeyModifiers::NONE));
    }

    #[tokio::test]
    async fn load_with_no_matches_queues_nothing() {
        let mut c = console();
        c.handle_key(KeyCode::Char('/'));
        for ch in "zzz".chars() {
            c.handle_key(KeyCode::Char(ch));
        }
        c.handle_key(KeyCode::Enter);
        c.handle_key(KeyCode::Char('['));
        assert!(!c.has_pending_load());
        assert_eq!(c.status(), "No track selected");
    }

    #[test]
    fn released_guard_does_not_restore_twice() {
        let guard = RawModeGuard { active: false };
        assert!(!guard.is_active());
        drop(guard);
    }

    #[test]
    fn quit_keys() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        let c = console();
        assert!(c.should_quit(KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(c.should_quit(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!c.should_quit(KeyCode::Char('c'), KeyModifiers::NONE));
    }

    #[test]
    fn spectrum_of_silence_is_flat() {
        let line = spectrum_line(&[-100.0; 128]);
        assert_eq!(line.chars().count(), SPECTRUM_BANDS);
        assert!(line.chars().all(|c| c == '▁'));
    }
}
