/// Ratatui-based TUI for filechat.
///
/// Architecture:
///   main thread:  event loop — crossterm keyboard events + mpsc UiEvent drain
///   http tasks:   tokio::spawn — one per request, reports back via UnboundedSender
///
/// Every store and session mutation happens on the event loop; spawned tasks
/// only carry a result back.
///
/// Layout:
///   ┌──────────┬─────────────────────────────────────┐
///   │  files   │  conversation history (Min(0))      │
///   │  (Ctrl+B)├─────────────────────────────────────┤
///   │          │  status bar (1 line)                │
///   │          ├─────────────────────────────────────┤
///   │          │  chips row (1 line)                 │
///   │          ├─────────────────────────────────────┤
///   │          │  input box (3 lines, fixed)         │
///   └──────────┴─────────────────────────────────────┘
pub mod render;
pub mod chat;
pub mod files;
pub mod overlays;
pub mod input;
pub mod selection_view;
pub mod transcript_view;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cache;
use crate::client::{CacheClearReply, CacheStatus, ChatBackend, ChatReply, Client, ClientError};
use crate::config::ResolvedConfig;
use crate::registry::Registry;
use crate::selection::SelectionStore;
use crate::session::{ChatSession, IndicatorId, SessionEvent};
use selection_view::SelectionView;
use transcript_view::TranscriptView;

/// File pane opens by default on terminals at least this wide.
const PANE_AUTO_WIDTH: u16 = 100;

// ── UiEvent — results from spawned tasks → TUI ───────────────────────────────

#[derive(Debug)]
pub enum UiEvent {
    /// A chat request finished; `indicator` names the exchange it answers
    ChatResolved {
        indicator: IndicatorId,
        result: Result<ChatReply, ClientError>,
    },
    /// A file list (re)load finished
    RegistryLoaded(Result<Registry, String>),
    CacheStatus(Result<CacheStatus, ClientError>),
    CacheCleared(Result<CacheClearReply, ClientError>),
}

// ── Mode — TUI modal state ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Palette,       // Ctrl+P commands + suggested questions
    SlashComplete, // / inline command autocomplete
}

// ── Dialogs ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    ClearCache,
}

/// Modal popup. While one is open it receives every key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    /// y/Enter runs `action`, n/Esc dismisses
    Confirm { message: String, action: ConfirmAction },
    Alert { message: String },
}

// ── AppState ──────────────────────────────────────────────────────────────────

pub struct AppState {
    pub session: ChatSession,
    pub selection: SelectionStore,
    pub registry: Registry,
    /// Recomputed after every selection or registry change
    pub selection_view: SelectionView,
    pub transcript: TranscriptView,
    pub cursor: usize, // byte offset in session input
    pub mode: Mode,
    pub dialog: Option<Dialog>,
    pub scroll: usize, // lines scrolled up in history
    pub palette_query: String,
    pub palette_selected: usize,
    /// Selected index in the slash-complete dropdown
    pub slash_complete_selected: usize,
    /// Which chip is focused (for Del/Backspace removal); None = input focused
    pub focused_chip: Option<usize>,
    /// Incremented every 120ms while something is loading
    pub spinner_tick: u32,
    pub show_timestamps: bool,

    // ── File pane ─────────────────────────────────────────────────────────────
    pub files_visible: bool,
    /// True = arrow keys move the pane highlight instead of scrolling history
    pub files_focused: bool,
    /// Highlighted registry row
    pub files_selected: usize,
    pub registry_loading: bool,
    registry_file: Option<PathBuf>,

    // ── Backend ───────────────────────────────────────────────────────────────
    pub profile: String,
    pub endpoint: String,
    pub suggestions: Vec<String>,
    /// Chat requests go through the trait seam
    backend: Arc<dyn ChatBackend>,
    /// Directory and cache calls
    client: Arc<Client>,
}

impl AppState {
    pub fn new(resolved: &ResolvedConfig, client: Arc<Client>) -> Self {
        let backend: Arc<dyn ChatBackend> = client.clone();
        Self::with_backend(resolved, client, backend)
    }

    fn with_backend(
        resolved: &ResolvedConfig,
        client: Arc<Client>,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        let selection = SelectionStore::new();
        let registry = Registry::default();
        let selection_view = SelectionView::reconcile(&selection, &registry);
        Self {
            session: ChatSession::new(),
            selection,
            registry,
            selection_view,
            transcript: TranscriptView::new(),
            cursor: 0,
            mode: Mode::Normal,
            dialog: None,
            scroll: 0,
            palette_query: String::new(),
            palette_selected: 0,
            slash_complete_selected: 0,
            focused_chip: None,
            spinner_tick: 0,
            show_timestamps: resolved.show_timestamps,
            files_visible: false, // set after terminal size check in event_loop
            files_focused: false,
            files_selected: 0,
            registry_loading: false,
            registry_file: resolved.registry_file.clone(),
            profile: resolved.profile_name.clone(),
            endpoint: resolved.endpoint.clone(),
            suggestions: resolved.suggestions.clone(),
            backend,
            client,
        }
    }

    /// True while the spinner should animate.
    pub fn is_loading(&self) -> bool {
        self.session.is_busy() || self.registry_loading
    }

    fn notice(&mut self, text: impl Into<String>) {
        self.transcript.notice(text);
        self.scroll = 0; // auto-scroll to bottom on new content
    }

    /// Move pending session events into the transcript view.
    fn sync_session(&mut self) {
        let events = self.session.drain_events();
        if events.iter().any(|e| matches!(e, SessionEvent::Appended(_) | SessionEvent::TypingShown(_))) {
            self.scroll = 0;
        }
        self.transcript.apply_all(events);
    }

    /// Recompute the selection view and clamp anything indexing into it.
    fn reconcile(&mut self) {
        self.selection_view = SelectionView::reconcile(&self.selection, &self.registry);
        let chips = self.selection_view.chips.len();
        self.focused_chip = match self.focused_chip {
            _ if chips == 0 => None,
            Some(i) => Some(i.min(chips - 1)),
            None => None,
        };
        self.files_selected = self.files_selected.min(self.registry.len().saturating_sub(1));
    }

    /// Single entry point for row activation: resolves the row's identity and
    /// attributes from the registry and toggles it in the store.
    pub fn dispatch_row(&mut self, index: usize) {
        if let Some(row) = self.registry.get(index) {
            self.selection.toggle(&row.file);
        }
        self.reconcile();
    }

    /// Remove the chip at `index` from the selection.
    pub fn detach_chip(&mut self, index: usize) {
        if let Some(chip) = self.selection_view.chips.get(index) {
            let id = chip.id.clone();
            self.selection.remove(&id);
        }
        self.reconcile();
    }

    fn set_input(&mut self, text: impl Into<String>) {
        self.session.set_input(text);
        self.cursor = self.session.input().len();
    }

    fn apply_event(&mut self, ev: UiEvent) {
        match ev {
            UiEvent::ChatResolved { indicator, result } => {
                self.session.resolve(indicator, result);
                self.sync_session();
            }
            UiEvent::RegistryLoaded(Ok(registry)) => {
                info!(rows = registry.len(), "file list loaded");
                self.registry_loading = false;
                self.registry = registry;
                self.reconcile();
                let n = self.registry.len();
                self.notice(format!("↻ {n} item{} listed", if n == 1 { "" } else { "s" }));
            }
            UiEvent::RegistryLoaded(Err(e)) => {
                warn!(error = %e, "file list unavailable");
                self.registry_loading = false;
                self.notice(format!("✗ file list unavailable: {e}"));
            }
            UiEvent::CacheStatus(Ok(status)) => match cache::status_report(&status) {
                Ok(message) => self.dialog = Some(Dialog::Alert { message }),
                Err(reason) => {
                    warn!(error = %reason, "cache status error");
                    self.notice(format!("cache status unavailable: {reason}"));
                }
            },
            UiEvent::CacheStatus(Err(e)) => {
                warn!(error = %e, "error getting cache status");
                self.notice("cache status unavailable");
            }
            UiEvent::CacheCleared(result) => {
                if let Err(e) = &result {
                    warn!(error = %e, "cache clear failed");
                }
                self.dialog = Some(Dialog::Alert { message: cache::clear_report(&result) });
            }
        }
    }
}

// ── Palette commands ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteCommand {
    pub key: &'static str,
    pub label: &'static str,
}

fn palette_commands() -> Vec<PaletteCommand> {
    vec![
        PaletteCommand { key: "/all",         label: "Select every listed file" },
        PaletteCommand { key: "/none",        label: "Clear the selection" },
        PaletteCommand { key: "/files",       label: "Show/hide the file pane  (or Ctrl+B)" },
        PaletteCommand { key: "/refresh",     label: "Reload the file list" },
        PaletteCommand { key: "/selection",   label: "List the selected files" },
        PaletteCommand { key: "/cache",       label: "Show server cache status" },
        PaletteCommand { key: "/clear-cache", label: "Clear the server file cache" },
        PaletteCommand { key: "/ts",          label: "Toggle timestamps" },
        PaletteCommand { key: "/help",        label: "Show help" },
        PaletteCommand { key: "/quit",        label: "Quit" },
    ]
}

/// Palette commands whose key starts with the typed `/...` prefix.
fn slash_filtered(input: &str) -> Vec<PaletteCommand> {
    let q = input.trim().to_lowercase();
    palette_commands()
        .into_iter()
        .filter(|c| c.key.starts_with(q.as_str()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteItem {
    Command(PaletteCommand),
    /// A canned question; picking it submits it
    Suggestion(String),
}

/// Commands then suggestions, filtered by `query`.
pub fn palette_items(query: &str, suggestions: &[String]) -> Vec<PaletteItem> {
    let q = query.trim().to_lowercase();
    let commands = palette_commands().into_iter().filter(|c| {
        q.is_empty() || c.key.contains(q.as_str()) || c.label.to_lowercase().contains(q.as_str())
    });
    let questions = suggestions
        .iter()
        .filter(|s| q.is_empty() || s.to_lowercase().contains(q.as_str()));
    commands
        .map(PaletteItem::Command)
        .chain(questions.cloned().map(PaletteItem::Suggestion))
        .collect()
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) {
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
}

// ── Main TUI run loop ─────────────────────────────────────────────────────────

pub async fn run(resolved: ResolvedConfig, client: Arc<Client>) -> Result<()> {
    let mut terminal = setup_terminal()?;

    // Panic hook — restore terminal before printing panic
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        orig_hook(info);
    }));

    let result = event_loop(&mut terminal, resolved, client).await;

    restore_terminal(&mut terminal);
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    resolved: ResolvedConfig,
    client: Arc<Client>,
) -> Result<()> {
    let mut state = AppState::new(&resolved, client);

    if let Ok((w, _)) = crossterm::terminal::size() {
        state.files_visible = w >= PANE_AUTO_WIDTH;
    }

    // Channel: http tasks → TUI
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel::<UiEvent>();

    info!(profile = %state.profile, endpoint = %state.endpoint, "tui started");
    refresh_registry(&mut state, &ui_tx);

    let mut crossterm_events = EventStream::new();
    let mut ticker = tokio::time::interval(tokio::time::Duration::from_millis(120));

    terminal.draw(|f| render::draw(f, &state))?;

    loop {
        tokio::select! {
            // ── Animation tick ────────────────────────────────────────────────
            _ = ticker.tick() => {
                if state.is_loading() {
                    state.spinner_tick = state.spinner_tick.wrapping_add(1);
                    terminal.draw(|f| render::draw(f, &state))?;
                }
            }

            // ── Drain results from spawned requests ───────────────────────────
            Some(ev) = ui_rx.recv() => {
                state.apply_event(ev);
                terminal.draw(|f| render::draw(f, &state))?;
            }

            // ── Keyboard/resize events ────────────────────────────────────────
            Some(Ok(ev)) = crossterm_events.next() => {
                if let Event::Key(key) = ev {
                    let keep = handle_key(key, &mut state, &ui_tx)?;
                    if !keep { break; }
                }
                terminal.draw(|f| render::draw(f, &state))?;
            }
        }
    }

    info!("tui exited");
    Ok(())
}

// ── Key handler ───────────────────────────────────────────────────────────────

fn handle_key(
    key: KeyEvent,
    state: &mut AppState,
    ui_tx: &mpsc::UnboundedSender<UiEvent>,
) -> Result<bool> {
    // Ctrl+C always quits, even with a dialog open or a request in flight
    if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
        return Ok(false);
    }

    // ── Dialog ────────────────────────────────────────────────────────────────
    if let Some(dialog) = state.dialog.clone() {
        match dialog {
            Dialog::Confirm { action, .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    state.dialog = None;
                    run_confirmed(action, state, ui_tx);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    info!(?action, "confirmation declined");
                    state.dialog = None;
                }
                _ => {}
            },
            Dialog::Alert { .. } => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                    state.dialog = None;
                }
            }
        }
        return Ok(true);
    }

    // ── File pane focused navigation ──────────────────────────────────────────
    if state.files_focused && state.files_visible && key.modifiers == KeyModifiers::NONE {
        let rows = state.registry.len();
        match key.code {
            KeyCode::Up => {
                state.files_selected = state.files_selected.saturating_sub(1);
                return Ok(true);
            }
            KeyCode::Down => {
                if state.files_selected + 1 < rows {
                    state.files_selected += 1;
                }
                return Ok(true);
            }
            KeyCode::PageUp => {
                state.files_selected = state.files_selected.saturating_sub(10);
                return Ok(true);
            }
            KeyCode::PageDown => {
                state.files_selected = (state.files_selected + 10).min(rows.saturating_sub(1));
                return Ok(true);
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                state.dispatch_row(state.files_selected);
                return Ok(true);
            }
            KeyCode::Char('a') => {
                execute_command("/all", state, ui_tx)?;
                return Ok(true);
            }
            KeyCode::Char('c') => {
                execute_command("/none", state, ui_tx)?;
                return Ok(true);
            }
            KeyCode::Char('r') => {
                execute_command("/refresh", state, ui_tx)?;
                return Ok(true);
            }
            KeyCode::Esc | KeyCode::Tab => {
                state.files_focused = false;
                return Ok(true);
            }
            // Any other char: unfocus and pass through to the input
            KeyCode::Char(_) => {
                state.files_focused = false;
            }
            _ => {
                return Ok(true);
            }
        }
    }

    // ── SlashComplete mode ────────────────────────────────────────────────────
    if state.mode == Mode::SlashComplete {
        match key.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
            }
            KeyCode::Up => {
                let count = slash_filtered(state.session.input()).len();
                if count > 0 {
                    state.slash_complete_selected =
                        (state.slash_complete_selected + count - 1) % count;
                }
            }
            KeyCode::Down => {
                let count = slash_filtered(state.session.input()).len();
                if count > 0 {
                    state.slash_complete_selected =
                        (state.slash_complete_selected + 1) % count;
                }
            }
            KeyCode::Tab => {
                let matches = slash_filtered(state.session.input());
                if let Some(cmd) = matches.get(state.slash_complete_selected) {
                    state.set_input(cmd.key);
                }
                state.mode = Mode::Normal;
            }
            KeyCode::Enter => {
                let matches = slash_filtered(state.session.input());
                let cmd = match matches.get(state.slash_complete_selected) {
                    Some(cmd) => cmd.key.to_string(),
                    None => state.session.input().trim().to_string(),
                };
                state.mode = Mode::Normal;
                state.set_input("");
                return execute_command(&cmd, state, ui_tx);
            }
            KeyCode::Backspace => {
                let cursor = &mut state.cursor;
                state.session.edit_input(|s| input::backspace(s, cursor));
                state.slash_complete_selected = 0;
                if !state.session.input().starts_with('/') {
                    state.mode = Mode::Normal;
                }
            }
            KeyCode::Char(c) => {
                let cursor = &mut state.cursor;
                state.session.edit_input(|s| input::insert_char(s, cursor, c));
                state.slash_complete_selected = 0;
            }
            _ => {}
        }
        return Ok(true);
    }

    // ── Palette mode ──────────────────────────────────────────────────────────
    if state.mode == Mode::Palette {
        match key.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                state.palette_query.clear();
            }
            KeyCode::Up => {
                state.palette_selected = state.palette_selected.saturating_sub(1);
            }
            KeyCode::Down => {
                let count = palette_items(&state.palette_query, &state.suggestions).len();
                if state.palette_selected + 1 < count {
                    state.palette_selected += 1;
                }
            }
            KeyCode::Enter => {
                let items = palette_items(&state.palette_query, &state.suggestions);
                let chosen = items.get(state.palette_selected).cloned();
                state.mode = Mode::Normal;
                state.palette_query.clear();
                state.palette_selected = 0;
                match chosen {
                    Some(PaletteItem::Command(cmd)) => {
                        return execute_command(cmd.key, state, ui_tx);
                    }
                    // The draft stays put while a question is outstanding
                    Some(PaletteItem::Suggestion(_)) if state.session.is_busy() => {
                        state.notice("a question is already outstanding");
                    }
                    Some(PaletteItem::Suggestion(question)) => {
                        state.set_input(question);
                        launch_send(state, ui_tx);
                    }
                    None => {}
                }
            }
            KeyCode::Backspace => {
                state.palette_query.pop();
                state.palette_selected = 0;
            }
            KeyCode::Char(c) => {
                state.palette_query.push(c);
                state.palette_selected = 0;
            }
            _ => {}
        }
        return Ok(true);
    }

    // ── Normal mode ───────────────────────────────────────────────────────────
    match (key.modifiers, key.code) {
        // Ctrl+D — quit
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => {
            return Ok(false);
        }
        // Ctrl+P — open palette
        (KeyModifiers::CONTROL, KeyCode::Char('p')) => {
            state.palette_selected = 0;
            state.mode = Mode::Palette;
        }
        // Ctrl+B — toggle file pane (does not change focus)
        (KeyModifiers::CONTROL, KeyCode::Char('b')) => {
            state.files_visible = !state.files_visible;
            if !state.files_visible {
                state.files_focused = false;
            }
        }
        // Ctrl+O — cycle focus through selection chips
        (KeyModifiers::CONTROL, KeyCode::Char('o')) => {
            let count = state.selection_view.chips.len();
            if count > 0 {
                state.focused_chip = match state.focused_chip {
                    Some(i) if i + 1 >= count => None,
                    Some(i) => Some(i + 1),
                    None => Some(0),
                };
            }
        }
        // Tab — focus the file pane
        (KeyModifiers::NONE, KeyCode::Tab) => {
            if state.files_visible {
                state.focused_chip = None;
                state.files_focused = true;
            }
        }
        // Esc — drop chip focus
        (KeyModifiers::NONE, KeyCode::Esc) => {
            state.focused_chip = None;
        }
        // Enter — submit input
        (KeyModifiers::NONE, KeyCode::Enter) => {
            let line = state.session.input().trim().to_string();
            if line.starts_with('/') {
                state.set_input("");
                return execute_command(&line, state, ui_tx);
            }
            launch_send(state, ui_tx);
        }
        // Backspace — remove char before cursor, or detach focused chip
        (KeyModifiers::NONE, KeyCode::Backspace) | (KeyModifiers::NONE, KeyCode::Delete)
            if state.focused_chip.is_some() =>
        {
            if let Some(idx) = state.focused_chip {
                state.detach_chip(idx);
            }
        }
        (KeyModifiers::NONE, KeyCode::Backspace) => {
            let cursor = &mut state.cursor;
            state.session.edit_input(|s| input::backspace(s, cursor));
        }
        // Delete — remove char at cursor
        (KeyModifiers::NONE, KeyCode::Delete) => {
            let cursor = &mut state.cursor;
            state.session.edit_input(|s| input::delete_forward(s, cursor));
        }
        // Ctrl+Backspace / Ctrl+W — delete word before cursor
        (KeyModifiers::CONTROL, KeyCode::Backspace) | (KeyModifiers::CONTROL, KeyCode::Char('w')) => {
            let cursor = &mut state.cursor;
            state.session.edit_input(|s| input::delete_word(s, cursor));
        }
        (KeyModifiers::NONE, KeyCode::Left) => {
            state.cursor = input::prev_boundary(state.session.input(), state.cursor);
        }
        (KeyModifiers::NONE, KeyCode::Right) => {
            state.cursor = input::next_boundary(state.session.input(), state.cursor);
        }
        (KeyModifiers::CONTROL, KeyCode::Left) => {
            state.cursor = input::word_left(state.session.input(), state.cursor);
        }
        (KeyModifiers::CONTROL, KeyCode::Right) => {
            state.cursor = input::word_right(state.session.input(), state.cursor);
        }
        // Home / Ctrl+A — go to start of input
        (KeyModifiers::NONE, KeyCode::Home) | (KeyModifiers::CONTROL, KeyCode::Char('a')) => {
            state.cursor = 0;
        }
        // End / Ctrl+E — go to end of input
        (KeyModifiers::NONE, KeyCode::End) | (KeyModifiers::CONTROL, KeyCode::Char('e')) => {
            state.cursor = state.session.input().len();
        }
        // Ctrl+U — clear line before cursor
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
            let end = state.cursor;
            state.session.edit_input(|s| s.replace_range(..end, ""));
            state.cursor = 0;
        }
        // Ctrl+K — clear from cursor to end
        (KeyModifiers::CONTROL, KeyCode::Char('k')) => {
            let start = state.cursor;
            state.session.edit_input(|s| s.truncate(start));
        }
        (KeyModifiers::NONE, KeyCode::Up) | (KeyModifiers::NONE, KeyCode::PageUp) => {
            state.scroll = state.scroll.saturating_add(3);
        }
        (KeyModifiers::NONE, KeyCode::Down) | (KeyModifiers::NONE, KeyCode::PageDown) => {
            state.scroll = state.scroll.saturating_sub(3);
        }
        // Regular char input — insert at cursor
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
            state.focused_chip = None; // typing unfocuses any chip
            let cursor = &mut state.cursor;
            state.session.edit_input(|s| input::insert_char(s, cursor, c));

            // `/` at start of input triggers slash autocomplete
            if c == '/' && state.cursor == 1 {
                state.slash_complete_selected = 0;
                state.mode = Mode::SlashComplete;
            }
        }
        _ => {}
    }

    Ok(true)
}

// ── Slash command handler ─────────────────────────────────────────────────────

fn execute_command(
    input: &str,
    state: &mut AppState,
    ui_tx: &mpsc::UnboundedSender<UiEvent>,
) -> Result<bool> {
    let cmd = input.split_whitespace().next().unwrap_or("");
    match cmd {
        "/quit" | "/exit" | "/q" => {
            return Ok(false);
        }
        "/help" | "/h" => {
            state.notice(
                "Commands: /all  /none  /files  /refresh  /selection  /cache  /clear-cache  /ts  /quit\n\
                 Ctrl+P  palette & suggested questions  ·  Ctrl+B  file pane  ·  Ctrl+O  focus chips (Del removes)\n\
                 In the file pane: ↑↓ move  Space/Enter toggle  a all  c clear  r refresh  Esc back",
            );
        }
        "/all" => {
            if state.registry.is_empty() {
                state.notice("file list is empty — /refresh to load it");
            }
            state.selection.select_all(state.registry.descriptors());
            state.reconcile();
        }
        "/none" => {
            state.selection.clear();
            state.reconcile();
        }
        "/files" => {
            state.files_visible = !state.files_visible;
            state.files_focused = state.files_visible;
        }
        "/refresh" => {
            refresh_registry(state, ui_tx);
        }
        "/selection" => {
            let names: Vec<&str> = state.selection.entries().iter().map(|e| e.name.as_str()).collect();
            let body = if names.is_empty() { "No files selected".to_string() } else { names.join("\n") };
            state.dialog = Some(Dialog::Alert {
                message: format!("Selected {} files:\n{body}", names.len()),
            });
        }
        "/cache" => {
            let client = state.client.clone();
            let tx = ui_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(UiEvent::CacheStatus(client.cache_status().await));
            });
        }
        "/clear-cache" => {
            state.dialog = Some(Dialog::Confirm {
                message: cache::CLEAR_CONFIRM_PROMPT.to_string(),
                action: ConfirmAction::ClearCache,
            });
        }
        "/ts" => {
            state.show_timestamps = !state.show_timestamps;
            let status = if state.show_timestamps { "on" } else { "off" };
            state.notice(format!("timestamps {status}"));
        }
        "" => {}
        other => {
            state.notice(format!("unknown command: {other}  (/help for the list)"));
        }
    }
    Ok(true)
}

fn run_confirmed(action: ConfirmAction, state: &mut AppState, ui_tx: &mpsc::UnboundedSender<UiEvent>) {
    match action {
        ConfirmAction::ClearCache => {
            info!("clearing server file cache");
            let client = state.client.clone();
            let tx = ui_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(UiEvent::CacheCleared(client.clear_cache().await));
            });
        }
    }
}

// ── Chat launcher ─────────────────────────────────────────────────────────────

/// Submit the current input and spawn the request. No-op when submit is
/// disabled (blank input or a request already outstanding).
fn launch_send(state: &mut AppState, ui_tx: &mpsc::UnboundedSender<UiEvent>) {
    let Some(request) = state.session.submit(&state.selection) else {
        return;
    };
    state.cursor = 0;
    state.focused_chip = None;
    let Some(indicator) = state.session.dispatched() else {
        state.sync_session();
        return;
    };
    state.sync_session();

    let backend = state.backend.clone();
    let tx = ui_tx.clone();
    tokio::spawn(async move {
        let result = backend.ask(&request).await;
        let _ = tx.send(UiEvent::ChatResolved { indicator, result });
    });
}

// ── File list loading ─────────────────────────────────────────────────────────

/// Reload the registry from the configured file, or from the server.
/// The selection is left untouched.
fn refresh_registry(state: &mut AppState, ui_tx: &mpsc::UnboundedSender<UiEvent>) {
    if let Some(path) = state.registry_file.clone() {
        let result = Registry::load_file(&path).map_err(|e| format!("{e:#}"));
        state.apply_event(UiEvent::RegistryLoaded(result));
        return;
    }
    if state.registry_loading {
        return;
    }
    state.registry_loading = true;
    let client = state.client.clone();
    let tx = ui_tx.clone();
    tokio::spawn(async move {
        let result = match client.directory().await {
            Ok(reply) => Registry::from_reply(reply).map_err(|e| format!("{e:#}")),
            Err(e) => Err(e.to_string()),
        };
        let _ = tx.send(UiEvent::RegistryLoaded(result));
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────
