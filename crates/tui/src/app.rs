use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dbnav_core::explorer::{Explorer, ExplorerAction, ExplorerEffect, Notice};
use dbnav_core::loader::{LoadCompletion, LoadRequest};
use dbnav_core::registry::RegistryEntry;
use dbnav_core::search::SearchInput;

use crate::keymap::{Command, Keymap};

/// Ticks a notice stays in the status line.
pub(crate) const NOTICE_TICKS: u8 = 25;
/// Rows below the tree panel.
pub(crate) const STATUS_LINES: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Msg {
    Quit,
    ToggleHelp,
    Explorer(ExplorerAction),
    Search(SearchInput),
    Loaded(LoadCompletion),
    Resize(u16, u16),
    Tick,
}

#[derive(Debug)]
pub(crate) struct TuiApp {
    pub(crate) explorer: Explorer,
    pub(crate) keymap: Keymap,
    pub(crate) show_help: bool,
    pub(crate) should_quit: bool,
    pub(crate) last_selected: Option<String>,
    notice: Option<Notice>,
    notice_ticks: u8,
}

impl TuiApp {
    pub(crate) fn new(entries: &[RegistryEntry], keymap: Keymap, width: u16, height: u16) -> Self {
        Self {
            explorer: Explorer::new(entries, width, height.saturating_sub(STATUS_LINES)),
            keymap,
            show_help: false,
            should_quit: false,
            last_selected: None,
            notice: None,
            notice_ticks: 0,
        }
    }

    pub(crate) fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// While a query is being typed every printable key goes to the search
    /// box; only the quit binding still works.
    pub(crate) fn map_key(&self, key: KeyEvent) -> Option<Msg> {
        if self.explorer.search().is_editing() {
            return match key.code {
                KeyCode::Esc => Some(Msg::Search(SearchInput::Escape)),
                KeyCode::Enter => Some(Msg::Search(SearchInput::Enter)),
                KeyCode::Backspace => Some(Msg::Search(SearchInput::Backspace)),
                KeyCode::Char(ch)
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    Some(Msg::Search(SearchInput::Char(ch)))
                }
                _ => match self.keymap.lookup(key) {
                    Some(Command::Quit) => Some(Msg::Quit),
                    _ => None,
                },
            };
        }

        if self.show_help && key.code == KeyCode::Esc {
            return Some(Msg::ToggleHelp);
        }

        match self.keymap.lookup(key)? {
            Command::Explorer(action) => Some(Msg::Explorer(action)),
            Command::ToggleHelp => Some(Msg::ToggleHelp),
            Command::Quit => Some(Msg::Quit),
        }
    }

    /// Applies one message. A returned request has to be dispatched to the
    /// loader by the caller.
    pub(crate) fn handle(&mut self, msg: Msg) -> Option<LoadRequest> {
        match msg {
            Msg::Quit => self.should_quit = true,
            Msg::ToggleHelp => self.show_help = !self.show_help,
            Msg::Explorer(action) => match self.explorer.apply(action) {
                ExplorerEffect::None => {}
                ExplorerEffect::Load(request) => return Some(request),
                ExplorerEffect::Selected(name) => {
                    self.set_notice(Notice::info(format!("Selected {name}")));
                    self.last_selected = Some(name);
                }
            },
            Msg::Search(input) => self.explorer.search_input(input),
            Msg::Loaded(completion) => {
                if let Some(notice) = self.explorer.apply_completion(completion) {
                    self.set_notice(notice);
                }
            }
            Msg::Resize(width, height) => {
                self.explorer
                    .resize(width, height.saturating_sub(STATUS_LINES));
            }
            Msg::Tick => self.on_tick(),
        }
        None
    }

    fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.notice_ticks = NOTICE_TICKS;
    }

    fn on_tick(&mut self) {
        if self.notice.is_none() {
            return;
        }
        self.notice_ticks = self.notice_ticks.saturating_sub(1);
        if self.notice_ticks == 0 {
            self.notice = None;
        }
    }
}
