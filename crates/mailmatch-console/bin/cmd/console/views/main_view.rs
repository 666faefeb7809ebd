use mailmatch_console::{HttpLogSource, LogRecord, StreamSession};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Stylize,
    text::Line,
    widgets::{Paragraph, TableState},
    Frame,
};

use crate::cmd::console::state::Focus;

use super::groups::render_groups_panel;
use super::inspect::render_inspect_popup;
use super::logs::{render_logs_panel, render_logs_placeholder};

/// Renders a full-area notice when the log API cannot be used at all
pub(crate) fn render_init_error(frame: &mut Frame, area: Rect, message: &str) {
    let error_text = vec![
        Line::from(""),
        Line::from("Log streaming unavailable").red().bold().centered(),
        Line::from(""),
        Line::from(message.to_string()).red().centered(),
        Line::from(""),
        Line::from("Set log_api_url in the config file or pass --log-api-url / --backend")
            .yellow()
            .centered(),
    ];
    frame.render_widget(Paragraph::new(error_text), area);
}

/// Renders the groups table, the records panel and the inspect popup
#[allow(clippy::too_many_arguments)]
pub(crate) fn render_main_view(
    frame: &mut Frame,
    area: Rect,
    session: &StreamSession<HttpLogSource>,
    show_all: bool,
    groups_state: &mut TableState,
    logs_state: &mut TableState,
    focus: Focus,
    inspected: Option<&LogRecord>,
) {
    let state = session.state();
    let catalog = session.catalog();

    if catalog.all.is_empty() && state.selected_group.is_none() {
        let text = if session.is_discovering() {
            vec![
                Line::from(""),
                Line::from("Discovering log groups...").yellow().centered(),
            ]
        } else if let Some(error) = &state.last_error {
            vec![
                Line::from(""),
                Line::from("Error").red().bold().centered(),
                Line::from(""),
                Line::from(error.as_str()).red().centered(),
                Line::from(""),
                Line::from("Press <g> to retry discovery").yellow().centered(),
            ]
        } else {
            vec![
                Line::from(""),
                Line::from("No log groups found").yellow().centered(),
                Line::from(""),
                Line::from("Check the log group prefix, then press <g> to retry").centered(),
            ]
        };
        frame.render_widget(Paragraph::new(text), area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    render_groups_panel(
        catalog.visible(show_all),
        state.selected_group.as_ref(),
        show_all,
        chunks[0],
        frame,
        groups_state,
        focus,
    );

    let records = session.projection();
    let group_label = state
        .selected_group
        .as_ref()
        .map(|group| group.display_name.clone())
        .unwrap_or_else(|| "no group".to_string());
    let mut title = format!(
        "{} [{}/{}]",
        group_label,
        records.len(),
        state.accumulated.len()
    );
    if let Some(correlation) = &state.correlation_filter {
        title.push_str(&format!(" filter: {}", correlation));
    }

    if records.is_empty() {
        let message = if session.is_fetching() {
            "(fetching...)"
        } else if state.last_error.is_some() {
            "(cannot fetch new data)"
        } else if state.is_streaming {
            "(waiting for records)"
        } else if state.correlation_filter.is_some() && !state.accumulated.is_empty() {
            "(no records match the filter)"
        } else {
            "(press s to stream or r to refresh)"
        };
        render_logs_placeholder(&title, message, chunks[1], frame);
    } else {
        render_logs_panel(
            &records,
            &title,
            chunks[1],
            frame,
            logs_state,
            focus != Focus::Groups,
        );
    }

    if focus == Focus::Inspect {
        if let Some(record) = inspected {
            render_inspect_popup(record, area, frame);
        }
    }
}
