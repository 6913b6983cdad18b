use dbnav_core::settings::ThemeName;
use ratatui::style::{Color, Modifier, Style};

/// Styles handed to the renderer. Built once at startup from settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub border: Style,
    pub title: Style,
    pub text: Style,
    pub detail: Style,
    pub offline: Style,
    pub loading: Style,
    pub selected: Style,
    pub search_match: Style,
    pub search_current: Style,
    pub prompt: Style,
    pub status: Style,
    pub info: Style,
    pub error: Style,
}

impl Theme {
    #[must_use]
    pub fn dark() -> Self {
        Self {
            border: Style::default().fg(Color::DarkGray),
            title: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            text: Style::default().fg(Color::Gray),
            detail: Style::default().fg(Color::DarkGray),
            offline: Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            loading: Style::default().fg(Color::Cyan),
            selected: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            search_match: Style::default().fg(Color::Yellow),
            search_current: Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            prompt: Style::default().fg(Color::Cyan),
            status: Style::default().fg(Color::Gray),
            info: Style::default().fg(Color::Green),
            error: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        }
    }

    #[must_use]
    pub fn light() -> Self {
        Self {
            border: Style::default().fg(Color::Gray),
            title: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            text: Style::default().fg(Color::Black),
            detail: Style::default().fg(Color::Gray),
            offline: Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            loading: Style::default().fg(Color::Magenta),
            selected: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            search_match: Style::default().fg(Color::Magenta),
            search_current: Style::default()
                .fg(Color::White)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            prompt: Style::default().fg(Color::Blue),
            status: Style::default().fg(Color::DarkGray),
            info: Style::default().fg(Color::Green),
            error: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        }
    }

    #[must_use]
    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
