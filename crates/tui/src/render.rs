use dbnav_core::explorer::{ExplorerRow, NoticeLevel};
use dbnav_core::node::ChildState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::app::{TuiApp, STATUS_LINES};
use crate::keymap::Command;
use crate::theme::Theme;

pub(crate) fn render(frame: &mut Frame<'_>, app: &TuiApp, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(STATUS_LINES)])
        .split(frame.area());

    render_tree(frame, app, theme, chunks[0]);
    render_status(frame, app, theme, chunks[1]);

    if app.show_help {
        render_help_popup(frame, app, theme);
    }
}

fn render_tree(frame: &mut Frame<'_>, app: &TuiApp, theme: &Theme, area: Rect) {
    let explorer = &app.explorer;
    let rows = explorer.rows();
    let mut lines = vec![prompt_line(app, theme)];
    lines.extend(rows.iter().map(|row| row_line(row, theme)));

    let title = format!(" Databases ({}) ", explorer.tree().database_count());
    let tree = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border)
            .title(Span::styled(title, theme.title)),
    );
    frame.render_widget(tree, area);
}

fn prompt_line(app: &TuiApp, theme: &Theme) -> Line<'static> {
    let explorer = &app.explorer;
    let search = explorer.search();

    if search.is_editing() {
        return Line::from(vec![
            Span::styled("/", theme.prompt),
            Span::styled(format!("{}_", search.query()), theme.text),
        ]);
    }

    if !search.query().is_empty() {
        let position = match search.current_index() {
            Some(index) => format!("  [{}/{}]", index + 1, search.matches().len()),
            None => "  [no matches]".to_string(),
        };
        return Line::from(vec![
            Span::styled(format!("/{}", search.query()), theme.prompt),
            Span::styled(position, theme.detail),
        ]);
    }

    if explorer.tree().database_count() == 0 {
        return Line::from(Span::styled(
            "No connections configured",
            theme.detail,
        ));
    }
    Line::from(Span::styled(explorer.selection_label(), theme.detail))
}

fn row_line<'a>(row: &'a ExplorerRow, theme: &Theme) -> Line<'a> {
    let marker = match row.row.state {
        Some(ChildState::Expanded) => "▾ ",
        Some(ChildState::Collapsed | ChildState::Unloaded) => "▸ ",
        None => "  ",
    };
    let name_style = if row.selected {
        theme.selected
    } else if row.highlight.is_current() {
        theme.search_current
    } else if row.highlight.is_match() {
        theme.search_match
    } else if row.row.offline {
        theme.offline
    } else {
        theme.text
    };

    let mut spans = vec![
        Span::raw("  ".repeat(row.row.path.depth())),
        Span::styled(marker, theme.detail),
        Span::styled(row.row.name.as_str(), name_style),
    ];
    if let Some(detail) = &row.row.detail {
        spans.push(Span::styled(format!("  {detail}"), theme.detail));
    }
    if row.loading {
        spans.push(Span::styled("  loading...", theme.loading));
    }
    Line::from(spans)
}

fn render_status(frame: &mut Frame<'_>, app: &TuiApp, theme: &Theme, area: Rect) {
    let line = match app.notice() {
        Some(notice) => {
            let style = match notice.level {
                NoticeLevel::Info => theme.info,
                NoticeLevel::Error => theme.error,
            };
            Line::from(Span::styled(notice.message.clone(), style))
        }
        None => {
            let tree = app.explorer.tree();
            let position = tree
                .line_of(&app.explorer.cursor().path())
                .map_or_else(String::new, |line| {
                    format!("{line}/{}  ", tree.visible_len())
                });
            let help = first_key(app, Command::ToggleHelp);
            let quit = first_key(app, Command::Quit);
            Line::from(Span::styled(
                format!("{position}{help}: help  {quit}: quit"),
                theme.status,
            ))
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn first_key(app: &TuiApp, command: Command) -> String {
    app.keymap
        .keys_for(command)
        .into_iter()
        .next()
        .unwrap_or_else(|| "-".to_string())
}

fn render_help_popup(frame: &mut Frame<'_>, app: &TuiApp, theme: &Theme) {
    let area = centered_rect(70, 80, frame.area());
    frame.render_widget(Clear, area);

    let lines = app
        .keymap
        .help_entries()
        .into_iter()
        .map(|(command, keys)| {
            Line::from(vec![
                Span::styled(format!("{:<18}", keys.join(", ")), theme.prompt),
                Span::styled(command.description(), theme.text),
            ])
        })
        .collect::<Vec<_>>();
    let help = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border)
            .title(Span::styled(" Keys ", theme.title)),
    );
    frame.render_widget(help, area);
}

fn centered_rect(width_percent: u16, height_percent: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100_u16 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100_u16 - height_percent) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100_u16 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100_u16 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}
