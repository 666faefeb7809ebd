use mailmatch_console::RecordClass;
use ratatui::style::{Color, Style};
use std::time::Duration;

pub(crate) fn truncate_left(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else {
        let keep = max_len.saturating_sub(3);
        let tail: String = s.chars().skip(len - keep).collect();
        format!("...{}", tail)
    }
}

pub(crate) fn truncate_message(msg: &str, max_len: usize) -> String {
    let single_line = msg.trim_end().replace(['\n', '\r', '\t'], " ");
    if single_line.chars().count() <= max_len {
        single_line
    } else {
        let truncated: String = single_line
            .chars()
            .take(max_len.saturating_sub(3))
            .collect();
        format!("{}...", truncated)
    }
}

pub(crate) fn class_style(class: RecordClass) -> Style {
    match class {
        RecordClass::Error => Style::default().fg(Color::Red),
        RecordClass::Warning => Style::default().fg(Color::Yellow),
        RecordClass::Info => Style::default().fg(Color::Cyan),
        RecordClass::Default => Style::default(),
    }
}

/// Formats the time until the next scheduled fetch, e.g. "2s".
pub(crate) fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.as_millis().div_ceil(1000);
    format!("{}s", secs)
}
