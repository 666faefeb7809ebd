use crate::cmd::console::state::Focus;
use crate::cmd::console::widgets::formatters::truncate_left;
use mailmatch_console::groups::is_relevant;
use mailmatch_console::LogGroup;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::Text,
    widgets::{Block, Cell, HighlightSpacing, Row, Table, TableState},
    Frame,
};

/// Renders the log groups table, marking the group being streamed
pub(crate) fn render_groups_panel(
    groups: &[LogGroup],
    active: Option<&LogGroup>,
    show_all: bool,
    area: Rect,
    frame: &mut Frame,
    table_state: &mut TableState,
    focus: Focus,
) {
    let name_width = (area.width.saturating_sub(8) as usize).max(12);

    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let header = Row::new(vec![Cell::from(" "), Cell::from("Log group")])
        .style(header_style)
        .height(1);

    let rows: Vec<Row> = groups
        .iter()
        .map(|group| {
            let is_active = active == Some(group);
            let marker = if is_active { "●" } else { " " };
            let name_style = if is_active {
                Style::default().fg(Color::Green)
            } else if show_all && !is_relevant(group) {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };

            let row = Row::new(vec![
                Cell::from(marker).style(Style::default().fg(Color::Green)),
                Cell::from(truncate_left(&group.display_name, name_width)).style(name_style),
            ]);

            if focus != Focus::Groups {
                row.style(Style::default().add_modifier(Modifier::DIM))
            } else {
                row
            }
        })
        .collect();

    let widths = [Constraint::Length(1), Constraint::Min(12)];

    let selected_row_style = Style::default()
        .add_modifier(Modifier::REVERSED)
        .bg(Color::DarkGray);

    let position = table_state.selected().map(|i| i + 1).unwrap_or(0);
    let scope = if show_all { "all" } else { "relevant" };
    let border_set = if focus == Focus::Groups {
        border::THICK
    } else {
        border::PLAIN
    };
    let table_block = Block::bordered()
        .title(format!(" {} [{}/{}] ", scope, position, groups.len()))
        .border_set(border_set);

    let table = Table::new(rows, widths)
        .header(header)
        .block(table_block)
        .column_spacing(1)
        .row_highlight_style(selected_row_style)
        .highlight_symbol(Text::from(">"))
        .highlight_spacing(HighlightSpacing::Always);

    frame.render_stateful_widget(table, area, table_state);
}
