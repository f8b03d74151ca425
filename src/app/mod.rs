use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::poi::PoiDocument;
use crate::ui;

mod actions;
pub mod advanced;
pub mod basic;
pub mod field;
pub mod state;

pub use actions::ActionDispatcher;
pub use advanced::{AdvancedFocus, AdvancedTagEditor, CursorMove, TagRow, UpdateSource};
pub use basic::{BasicField, BasicInfoEditor};
pub use field::TextField;
pub use state::{AppState, EditorTab};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    Save,
    Reload,
    SwitchTab,
    FocusNext,
    FocusPrev,
    FocusUp,
    FocusDown,
    Activate,
    DeleteRow,
    AcceptSuggestion(usize),
    Cursor(CursorMove),
    Backspace,
    DeleteChar,
    Insert(char),
}

pub struct App {
    pub config: Arc<AppConfig>,
    path: PathBuf,
    state: AppState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, path: PathBuf, document: PoiDocument) -> Self {
        let state = AppState::new(document, &config);
        let tick_rate = config.tick_rate;
        Self {
            config,
            path,
            state,
            should_quit: false,
            tick_rate,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let palette = self.config.palette();
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| ui::draw_app(frame, &self.state, &palette))
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // next draw picks up the new size
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        if self.state.sync_visible() {
            tracing::debug!("visible screen refreshed from shared tags");
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if let Some(action) = map_key(key) {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        let tab = self.state.tab();
        match action {
            Action::Quit => {
                if self.state.request_quit() {
                    self.should_quit = true;
                }
            }
            Action::Save => self.handle_save(),
            Action::Reload => self.handle_reload(),
            Action::SwitchTab => self.state.toggle_tab(),
            Action::FocusNext => match tab {
                EditorTab::Basic => self.state.with_basic(|screen, _| screen.move_selection(1)),
                EditorTab::Advanced => self.state.with_advanced(|screen, _| screen.focus_next()),
            },
            Action::FocusPrev => match tab {
                EditorTab::Basic => self.state.with_basic(|screen, _| screen.move_selection(-1)),
                EditorTab::Advanced => self.state.with_advanced(|screen, _| screen.focus_prev()),
            },
            Action::FocusUp => match tab {
                EditorTab::Basic => self.state.with_basic(|screen, _| screen.move_selection(-1)),
                EditorTab::Advanced => {
                    self.state.with_advanced(|screen, _| screen.focus_vertical(-1))
                }
            },
            Action::FocusDown => match tab {
                EditorTab::Basic => self.state.with_basic(|screen, _| screen.move_selection(1)),
                EditorTab::Advanced => {
                    self.state.with_advanced(|screen, _| screen.focus_vertical(1))
                }
            },
            Action::Activate => match tab {
                EditorTab::Basic => self.state.with_basic(|screen, _| screen.move_selection(1)),
                EditorTab::Advanced => {
                    self.state.with_advanced(|screen, data| screen.activate(data))
                }
            },
            Action::DeleteRow => {
                if tab == EditorTab::Advanced {
                    self.state.set_status_message(None::<String>);
                    self.state
                        .with_advanced(|screen, data| screen.delete_focused(data));
                }
            }
            Action::AcceptSuggestion(index) => {
                if tab == EditorTab::Advanced {
                    self.state
                        .with_advanced(|screen, _| screen.accept_suggestion(index));
                }
            }
            Action::Cursor(motion) => {
                match tab {
                    EditorTab::Basic => self.state.with_basic(|screen, _| screen.move_cursor(motion)),
                    EditorTab::Advanced => self
                        .state
                        .with_advanced(|screen, _| screen.move_cursor(motion)),
                };
            }
            Action::Backspace => {
                match tab {
                    EditorTab::Basic => self.state.with_basic(|screen, data| screen.backspace(data)),
                    EditorTab::Advanced => self
                        .state
                        .with_advanced(|screen, data| screen.backspace(data)),
                };
            }
            Action::DeleteChar => {
                match tab {
                    EditorTab::Basic => self
                        .state
                        .with_basic(|screen, data| screen.delete_forward(data)),
                    EditorTab::Advanced => self
                        .state
                        .with_advanced(|screen, data| screen.delete_forward(data)),
                };
            }
            Action::Insert(ch) => {
                match tab {
                    EditorTab::Basic => self
                        .state
                        .with_basic(|screen, data| screen.insert_char(data, ch)),
                    EditorTab::Advanced => self
                        .state
                        .with_advanced(|screen, data| screen.insert_char(data, ch)),
                };
            }
        }
    }

    fn handle_save(&mut self) {
        let dispatcher = ActionDispatcher::new(&self.path);
        match dispatcher.save(&mut self.state) {
            Ok(()) => {
                let count = self.state.data().tags().len();
                self.state
                    .set_status_message(Some(format!("Saved {count} tag(s) to {}", self.path.display())));
            }
            Err(err) => {
                tracing::error!(?err, "failed to save POI document");
                self.state
                    .set_status_message(Some(format!("Save failed: {err:#}")));
            }
        }
    }

    fn handle_reload(&mut self) {
        let dispatcher = ActionDispatcher::new(&self.path);
        match dispatcher.reload(&mut self.state) {
            Ok(()) => {
                self.state.sync_visible();
                self.state.set_status_message(Some("Reloaded from disk"));
            }
            Err(err) => {
                tracing::error!(?err, "failed to reload POI document");
                self.state
                    .set_status_message(Some(format!("Reload failed: {err:#}")));
            }
        }
    }
}

fn map_key(key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Char('c') if ctrl => Action::Quit,
        KeyCode::Char('s') if ctrl => Action::Save,
        KeyCode::Char('r') if ctrl => Action::Reload,
        KeyCode::Char('t') if ctrl => Action::SwitchTab,
        KeyCode::Char('d') if ctrl => Action::DeleteRow,
        KeyCode::Char('a') if ctrl => Action::Cursor(CursorMove::Home),
        KeyCode::Char('e') if ctrl => Action::Cursor(CursorMove::End),
        KeyCode::Char(digit @ '1'..='9') if alt => {
            Action::AcceptSuggestion(digit as usize - '1' as usize)
        }
        KeyCode::Char(ch) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) => {
            Action::Insert(ch)
        }
        KeyCode::Esc => Action::Quit,
        KeyCode::Tab => Action::FocusNext,
        KeyCode::BackTab => Action::FocusPrev,
        KeyCode::Up => Action::FocusUp,
        KeyCode::Down => Action::FocusDown,
        KeyCode::Enter => Action::Activate,
        KeyCode::Left => Action::Cursor(CursorMove::Left),
        KeyCode::Right => Action::Cursor(CursorMove::Right),
        KeyCode::Home => Action::Cursor(CursorMove::Home),
        KeyCode::End => Action::Cursor(CursorMove::End),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::DeleteChar,
        _ => return None,
    };
    Some(action)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("creating terminal")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leaving alternate screen")?;
    terminal.show_cursor().context("restoring cursor")?;
    Ok(())
}
