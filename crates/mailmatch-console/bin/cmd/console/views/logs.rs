use crate::cmd::console::widgets::formatters::{class_style, truncate_message};
use mailmatch_console::LogRecord;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::Text,
    widgets::{Block, HighlightSpacing, Row, Table, TableState},
    Frame,
};

/// Renders a placeholder when no records are available
pub(crate) fn render_logs_placeholder(title: &str, message: &str, area: Rect, frame: &mut Frame) {
    let block = Block::bordered()
        .title(format!(" {} ", title))
        .border_set(border::THICK);

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let message_width = message.len() as u16;
    let x = inner_area.x + (inner_area.width.saturating_sub(message_width)) / 2;
    let y = inner_area.y + inner_area.height / 2;

    if x < inner_area.x + inner_area.width && y < inner_area.y + inner_area.height {
        frame
            .buffer_mut()
            .set_string(x, y, message, Style::default().fg(Color::DarkGray));
    }
}

/// Renders the projected records, coloured by severity
pub(crate) fn render_logs_panel(
    records: &[&LogRecord],
    title: &str,
    area: Rect,
    frame: &mut Frame,
    table_state: &mut TableState,
    is_focused: bool,
) {
    let border_set = if is_focused {
        border::THICK
    } else {
        border::PLAIN
    };

    let block = Block::bordered()
        .title(format!(" {} ", title))
        .border_set(border_set);

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let msg_width = (inner_area.width.saturating_sub(16) as usize).max(20);

    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let header = Row::new(vec!["Time", "Message"])
        .style(header_style)
        .height(1);

    let rows: Vec<Row> = records
        .iter()
        .map(|record| {
            let row = Row::new(vec![
                record.local_time(),
                truncate_message(&record.message, msg_width),
            ]);
            let style = class_style(record.class());

            if is_focused {
                row.style(style)
            } else {
                row.style(style.add_modifier(Modifier::DIM))
            }
        })
        .collect();

    let widths = [
        Constraint::Length(12), // HH:MM:SS.mmm
        Constraint::Min(20),
    ];

    let selected_row_style = Style::default()
        .add_modifier(Modifier::REVERSED)
        .bg(Color::DarkGray);

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(selected_row_style)
        .highlight_symbol(Text::from(">"))
        .highlight_spacing(HighlightSpacing::Always);

    frame.render_stateful_widget(table, inner_area, table_state);
}
