// File: src/tui/view.rs
use crate::controller::{EditorPhase, StatusKind};
use crate::model::display_date;
use crate::tui::state::{AppState, Focus, InputMode};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

fn focus_style(state: &AppState, focus: Focus) -> Style {
    if state.focus == focus {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

pub fn draw(f: &mut Frame, state: &mut AppState) {
    if !state.client.is_connected() {
        draw_disconnected(f, state);
        return;
    }

    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(v_chunks[1]);

    let side_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(5)])
        .split(main_chunks[1]);

    let phase = state.client.phase();

    // --- DATE FIELD ---
    let date_line = match state.client.state().selected_date {
        Some(date) if state.focus != Focus::Date => Line::from(vec![
            Span::styled(
                state.date_input.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", display_date(date)),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        _ => Line::from(state.date_input.clone()),
    };
    let date_field = Paragraph::new(date_line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Date (YYYY-MM-DD) ")
            .border_style(focus_style(state, Focus::Date)),
    );
    f.render_widget(date_field, v_chunks[0]);

    // --- EDITOR ---
    let editor_title = match phase {
        EditorPhase::Empty => " Pick a date ",
        EditorPhase::Loading => " Loading... ",
        EditorPhase::Creating => " New entry ",
        EditorPhase::Editing => " Edit entry ",
        EditorPhase::Saving => " Saving... ",
    };
    let save_hint = if state.client.can_save() {
        Span::styled(" Ctrl+S:Save ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" Ctrl+S:Save ", Style::default().fg(Color::DarkGray))
    };
    let editor_area = main_chunks[0];
    let inner_width = editor_area.width.saturating_sub(2);
    let inner_height = usize::from(editor_area.height.saturating_sub(2).max(1));
    let (rows, (cursor_row, cursor_col)) = state.wrapped_draft(inner_width);
    // Keep the cursor row on screen.
    let scroll = (cursor_row + 1).saturating_sub(inner_height);
    let editor_lines: Vec<Line> = rows.into_iter().map(Line::from).collect();
    let editor = Paragraph::new(editor_lines)
        .scroll((scroll as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(editor_title)
                .title_bottom(Line::from(save_hint).alignment(Alignment::Right))
                .border_style(focus_style(state, Focus::Editor)),
        );
    f.render_widget(editor, editor_area);

    // --- ENTRY LIST ---
    let selected_date = state.client.state().selected_date;
    let entry_items: Vec<ListItem> = state
        .entries()
        .iter()
        .map(|e| {
            let date_style = if Some(e.date) == selected_date {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            let preview = e.preview().replace('\n', " ");
            ListItem::new(vec![
                Line::from(Span::styled(display_date(e.date), date_style)),
                Line::from(Span::styled(preview, Style::default().fg(Color::Gray))),
            ])
        })
        .collect();
    let entries_title = format!(" Entries ({}) ", state.entries().len());
    let entry_list = List::new(entry_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(entries_title)
                .border_style(focus_style(state, Focus::Entries)),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::Green)
                .fg(Color::Black),
        );
    f.render_stateful_widget(entry_list, side_chunks[0], &mut state.list_state);

    // --- DETAILS ---
    let mut details = Vec::new();
    if let Some(entry) = state.get_selected_entry() {
        if let Some(created) = &entry.created_at {
            details.push(Line::from(format!("Created: {}", created)));
        }
        if let Some(updated) = &entry.updated_at {
            details.push(Line::from(format!("Updated: {}", updated)));
        }
        details.push(Line::from(format!(
            "{} characters",
            entry.content.chars().count()
        )));
    }
    let details = Paragraph::new(details)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Details "));
    f.render_widget(details, side_chunks[1]);

    // --- FOOTER ---
    let footer_area = v_chunks[2];
    f.render_widget(Clear, footer_area);
    let status = match &state.client.state().status {
        Some(s) => {
            let color = match s.kind {
                StatusKind::Success => Color::Green,
                StatusKind::Error => Color::Red,
            };
            Paragraph::new(s.text.clone()).style(Style::default().fg(color))
        }
        None => Paragraph::new(phase.to_string()).style(Style::default().fg(Color::Cyan)),
    }
    .block(
        Block::default()
            .borders(Borders::LEFT | Borders::TOP | Borders::BOTTOM)
            .title(" Status "),
    );
    let help_str = match state.focus {
        Focus::Date => "Esc:Quit Tab:Editor [/]:Prev/Next day Enter:Go ^N:Today",
        Focus::Editor => "Esc:Quit Tab:List ^S:Save ^N:New",
        Focus::Entries => "q:Quit Tab:Date Enter:Open d:Del r:Refresh [/]:Day",
    };
    let help = Paragraph::new(help_str).alignment(Alignment::Right).block(
        Block::default()
            .borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)
            .title(" Actions "),
    );
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(footer_area);
    f.render_widget(status, chunks[0]);
    f.render_widget(help, chunks[1]);

    // --- CURSOR ---
    match state.focus {
        Focus::Editor => {
            let x = editor_area.x + 1 + cursor_col as u16;
            let y = editor_area.y + 1 + (cursor_row - scroll) as u16;
            f.set_cursor_position((
                x.min(editor_area.x + editor_area.width.saturating_sub(2)),
                y.min(editor_area.y + editor_area.height.saturating_sub(2)),
            ));
        }
        Focus::Date => {
            let area = v_chunks[0];
            let x = area.x + 1 + state.date_input.len() as u16;
            f.set_cursor_position((x.min(area.x + area.width.saturating_sub(2)), area.y + 1));
        }
        Focus::Entries => {}
    }

    // --- DELETE POPUP ---
    if let InputMode::ConfirmDelete(date) = state.mode {
        let area = centered_rect(50, 25, f.area());
        let lines = vec![
            Line::from(""),
            Line::from(format!("Delete the entry for {}?", display_date(date))),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    " [Y] ",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("Delete    "),
                Span::styled(
                    " [N] ",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("Keep"),
            ]),
        ];
        let p = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Delete entry ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightRed)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(p, area);
    }

    // --- QUIT POPUP ---
    if state.mode == InputMode::ConfirmQuit {
        let area = centered_rect(50, 25, f.area());
        let lines = vec![
            Line::from(""),
            Line::from("The entry has unsaved changes."),
            Line::from("Quit anyway?"),
            Line::from(vec![
                Span::styled(" [Y] ", Style::default().fg(Color::Yellow)),
                Span::raw("Quit    "),
                Span::styled(" [N] ", Style::default().fg(Color::Yellow)),
                Span::raw("Back"),
            ]),
        ];
        let p = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Unsaved changes ")
                    .borders(Borders::ALL),
            )
            .alignment(Alignment::Center);
        f.render_widget(Clear, area);
        f.render_widget(p, area);
    }
}

fn draw_disconnected(f: &mut Frame, state: &AppState) {
    let area = centered_rect(70, 60, f.area());
    let lines = if state.client.is_probing() {
        vec![
            Line::from(""),
            Line::from(format!("Connecting to {}...", state.api_url)),
        ]
    } else {
        vec![
            Line::from(""),
            Line::from(Span::styled(
                "Cannot reach the journal server",
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(state.api_url.clone()),
            Line::from(""),
            Line::from("Make sure the server is running, then press r to retry."),
            Line::from(""),
            Line::from("r:Retry  q:Quit"),
        ]
    };
    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Diario "))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
